//! Store contract checks against a real PostgreSQL server
//!
//! Needs `DATABASE_URL` pointing at a scratch database; names are suffixed
//! with a random id so repeated runs do not collide.

use chrono::{Duration, Utc};
use uuid::Uuid;

use common::database::{DatabaseConfig, init_pool, run_migrations};
use grocery_api::models::{
    IdMatch, NewAccount, NewLocation, NewProduct, NewReceipt, NutriScore, NutrientValues, Page,
    ReceiptFilter, Role,
};
use grocery_api::store::{PgStore, Store, StoreError, postgres::MIGRATOR};

async fn connect() -> Result<PgStore, Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_pool(&config).await?;
    run_migrations(&pool, &MIGRATOR).await?;
    Ok(PgStore::new(pool))
}

fn suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn values() -> NutrientValues {
    serde_json::from_value(serde_json::json!({
        "energy": 497,
        "totalFat": 25.8,
        "saturatedFat": 3.1,
        "totalCarbohydrates": 56.9,
        "totalSugars": 2.3,
        "protein": 6.6,
        "salt": 0.97
    }))
    .expect("valid nutrients")
}

fn new_product(barcode: &str) -> NewProduct {
    NewProduct {
        barcode: barcode.to_string(),
        name: format!("Doritos {}", barcode),
        brand: "Doritos".to_string(),
        image: "null".to_string(),
        ingredients: vec!["maíz".to_string()],
        nutrients: values(),
        beverage: false,
        nutri_score: NutriScore::D,
    }
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL server"]
async fn test_pg_unique_constraints() -> Result<(), Box<dyn std::error::Error>> {
    let store = connect().await?;
    let tag = suffix();

    let account = NewAccount {
        username: format!("user{}", tag),
        email: "test@test.es".to_string(),
        password_hash: "hash".to_string(),
        role: Role::Regular,
    };
    store.insert_account(account.clone()).await?;
    let err = store.insert_account(account).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { field: "username", .. }));

    let shop = format!("Shop {}", tag);
    store.insert_shop(&shop, vec![]).await?;
    let err = store.insert_shop(&shop, vec![]).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { field: "name", .. }));

    let barcode = format!("84{}", tag);
    store.insert_product(new_product(&barcode)).await?;
    let err = store.insert_product(new_product(&barcode)).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { field: "barcode", .. }));

    Ok(())
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL server"]
async fn test_pg_receipts_and_cascades() -> Result<(), Box<dyn std::error::Error>> {
    let store = connect().await?;
    let tag = suffix();

    let account = store
        .insert_account(NewAccount {
            username: format!("buyer{}", tag),
            email: "test@test.es".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Regular,
        })
        .await?;
    let shop = store
        .insert_shop(
            &format!("Alcampo {}", tag),
            vec![NewLocation {
                latitude: 8.0,
                longitude: 8.0,
                address: Some("Santa Cruz".to_string()),
            }],
        )
        .await?;
    let product = store.insert_product(new_product(&format!("71{}", tag))).await?;

    let now = Utc::now();
    for (price, days_ago) in [(3.4, 2), (2.1, 1), (3.85, 0)] {
        store
            .insert_receipt(NewReceipt {
                price,
                date: now - Duration::days(days_ago),
                product: product.id,
                shop: shop.id,
                user: account.id,
            })
            .await?;
    }

    let shop_after = store.find_shop_by_id(shop.id).await?.expect("shop exists");
    assert_eq!(shop_after.products, vec![product.id]);
    let account_after = store
        .find_account_by_username(&account.username)
        .await?
        .expect("account exists");
    assert_eq!(account_after.products, vec![product.id]);

    let filter = ReceiptFilter {
        shop: Some(IdMatch::Is(shop.id)),
        min_price: Some(3.1),
        max_price: Some(4.2),
        ..Default::default()
    };
    let found = store.find_receipts(&filter, Page::default()).await?;
    let prices: Vec<f64> = found.iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![3.85, 3.4]);

    let first = store
        .find_receipts(
            &ReceiptFilter {
                shop: Some(IdMatch::Is(shop.id)),
                ..Default::default()
            },
            Page { limit: 1, skip: 1 },
        )
        .await?;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].price, 2.1);

    store.delete_product_cascade(product.id).await?;
    assert!(store.find_nutrients(product.nutrients).await?.is_none());
    let remaining = store
        .find_receipts(
            &ReceiptFilter {
                shop: Some(IdMatch::Is(shop.id)),
                ..Default::default()
            },
            Page { limit: 0, skip: 0 },
        )
        .await?;
    assert!(remaining.is_empty());
    let shop_after = store.find_shop_by_id(shop.id).await?.expect("shop exists");
    assert!(shop_after.products.is_empty());

    let deleted = store.delete_shop_cascade(shop.id).await?.expect("shop deleted");
    assert_eq!(deleted.locations.len(), 1);
    assert!(store.find_location(deleted.locations[0].id).await?.is_none());

    Ok(())
}
