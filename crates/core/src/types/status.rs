//! Status enums for orders and customers.

use serde::{Deserialize, Serialize};

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment has not completed yet. The initial state of every order.
    #[default]
    Pending,
    /// Payment completed successfully.
    Complete,
    /// Payment failed.
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Customer membership tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    /// The default tier for new customers.
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
        }
    }
}

impl std::str::FromStr for Membership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            _ => Err(format!("invalid membership tier: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Complete,
            PaymentStatus::Failed,
        ] {
            let parsed: PaymentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_membership_roundtrip() {
        for tier in [Membership::Bronze, Membership::Silver, Membership::Gold] {
            let parsed: Membership = tier.to_string().parse().unwrap();
            assert_eq!(parsed, tier);
        }
        assert!("platinum".parse::<Membership>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(
            serde_json::to_string(&Membership::Gold).unwrap(),
            "\"gold\""
        );
    }
}
