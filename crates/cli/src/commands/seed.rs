//! Seed the database with a small sample catalog.
//!
//! Inserts a few collections, products, promotions and a customer so a fresh
//! install has something to browse. Skips seeding when the catalog already
//! has data.

use secrecy::SecretString;
use tracing::info;

use clove_api::db::{
    self, CollectionRepository, CustomerRepository, ProductRepository, PromotionRepository,
};
use clove_api::models::{Address, NewCollection, NewCustomer, NewProduct, NewPromotion};
use clove_core::{Membership, Money};

/// Seed sample data.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a write fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CLOVE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "CLOVE_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;

    let collections = CollectionRepository::new(&pool);
    if !collections.list().await?.is_empty() {
        info!("Database already seeded, nothing to do");
        return Ok(());
    }

    let teas = collections
        .create(&NewCollection {
            title: "Teas".to_owned(),
            featured_product_id: None,
        })
        .await?;
    let spices = collections
        .create(&NewCollection {
            title: "Spices".to_owned(),
            featured_product_id: None,
        })
        .await?;

    let promotions = PromotionRepository::new(&pool);
    let autumn = promotions
        .create(&NewPromotion {
            description: "Autumn sale".to_owned(),
            discount: 0.15,
        })
        .await?;

    let products = ProductRepository::new(&pool);
    for (title, slug, cents, inventory, collection_id, promos) in [
        ("Earl Grey", "earl-grey", 549_i64, 120_i64, teas.id, vec![]),
        ("Sencha", "sencha", 799, 80, teas.id, vec![autumn.id]),
        ("Whole Cloves", "whole-cloves", 425, 200, spices.id, vec![autumn.id]),
        ("Ceylon Cinnamon", "ceylon-cinnamon", 615, 60, spices.id, vec![]),
    ] {
        products
            .create(&NewProduct {
                title: title.to_owned(),
                slug: slug.to_owned(),
                description: None,
                unit_price: Money::from_cents(cents)?,
                inventory,
                collection_id,
                promotion_ids: promos,
            })
            .await?;
    }

    CustomerRepository::new(&pool)
        .create(&NewCustomer {
            first_name: "Ada".to_owned(),
            last_name: "Byron".to_owned(),
            membership: Membership::Gold,
            address: Some(Address {
                street: "12 St James Square".to_owned(),
                city: "London".to_owned(),
            }),
        })
        .await?;

    info!("Seeded sample catalog");
    Ok(())
}
