//! Catalog domain types: collections, products, promotions.

use chrono::{DateTime, Utc};

use clove_core::{CollectionId, Money, ProductId, PromotionId};

/// A named grouping of products (domain type).
#[derive(Debug, Clone)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    /// Product highlighted for this collection, if any.
    pub featured_product_id: Option<ProductId>,
    /// Number of products currently in the collection (computed at read time).
    pub products_count: i64,
}

/// Input for creating or replacing a collection.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub title: String,
    pub featured_product_id: Option<ProductId>,
}

/// A catalog product (domain type).
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Money,
    pub inventory: i64,
    pub collection_id: CollectionId,
    /// Refreshed whenever the product row is written.
    pub last_update: DateTime<Utc>,
}

/// Input for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Money,
    pub inventory: i64,
    pub collection_id: CollectionId,
    /// Full replacement set of promotion associations.
    pub promotion_ids: Vec<PromotionId>,
}

/// A promotion attachable to many products.
#[derive(Debug, Clone)]
pub struct Promotion {
    pub id: PromotionId,
    pub description: String,
    pub discount: f64,
}

/// Input for creating or replacing a promotion.
#[derive(Debug, Clone)]
pub struct NewPromotion {
    pub description: String,
    pub discount: f64,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrdering {
    /// Stable default: by id ascending.
    #[default]
    Id,
    UnitPriceAsc,
    UnitPriceDesc,
    LastUpdateAsc,
    LastUpdateDesc,
}

impl ProductOrdering {
    /// Parse the `ordering` query value (`unit_price`, `-unit_price`,
    /// `last_update`, `-last_update`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unit_price" => Some(Self::UnitPriceAsc),
            "-unit_price" => Some(Self::UnitPriceDesc),
            "last_update" => Some(Self::LastUpdateAsc),
            "-last_update" => Some(Self::LastUpdateDesc),
            _ => None,
        }
    }
}

/// Filter criteria for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub collection_id: Option<CollectionId>,
    /// Inclusive lower bound on unit price.
    pub min_price: Option<Money>,
    /// Inclusive upper bound on unit price.
    pub max_price: Option<Money>,
    /// Case-insensitive substring match over title and description.
    pub search: Option<String>,
    pub ordering: ProductOrdering,
}

/// A page request for list endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// 1-based page number.
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub const DEFAULT_SIZE: i64 = 10;
    pub const MAX_SIZE: i64 = 100;

    /// Build a page from raw query values, clamping to sane bounds.
    #[must_use]
    pub fn new(number: Option<i64>, size: Option<i64>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            size: size
                .unwrap_or(Self::DEFAULT_SIZE)
                .clamp(1, Self::MAX_SIZE),
        }
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    /// Row limit for this page.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamping() {
        let page = Page::new(None, None);
        assert_eq!(page.number, 1);
        assert_eq!(page.size, Page::DEFAULT_SIZE);
        assert_eq!(page.offset(), 0);

        let page = Page::new(Some(0), Some(10_000));
        assert_eq!(page.number, 1);
        assert_eq!(page.size, Page::MAX_SIZE);

        let page = Page::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);
    }

    #[test]
    fn test_ordering_parse() {
        assert_eq!(
            ProductOrdering::parse("unit_price"),
            Some(ProductOrdering::UnitPriceAsc)
        );
        assert_eq!(
            ProductOrdering::parse("-last_update"),
            Some(ProductOrdering::LastUpdateDesc)
        );
        assert_eq!(ProductOrdering::parse("title"), None);
    }
}
