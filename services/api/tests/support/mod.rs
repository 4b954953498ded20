//! Shared fixture for the API integration tests
//!
//! Builds the full router over an in-memory store seeded with two accounts,
//! two shops, three products and three receipts.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;
use uuid::Uuid;

use grocery_api::{
    AppState, create_router,
    jwt::{JwtConfig, JwtService},
    models::{
        Account, NewAccount, NewLocation, NewProduct, NutriScore, NutrientValues, Product,
        Receipt, Role, Shop,
    },
    repositories::account::hash_password,
    store::{MemoryStore, Store},
};

pub const PASSWORD: &str = "Testtest1";
pub const DORITOS_BARCODE: &str = "712345760891";
pub const OREO_BARCODE: &str = "712345767801";
pub const NACHO_BARCODE: &str = "712345760818";

/// Hashing is slow in debug builds, so every fixture shares one hash
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("hash fixture password"))
        .clone()
}

fn date(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("valid fixture date")
        .with_timezone(&Utc)
}

fn nutrients(
    energy: f64,
    total_fat: f64,
    saturated_fat: f64,
    carbohydrates: f64,
    sugars: f64,
    protein: f64,
    salt: f64,
) -> NutrientValues {
    NutrientValues {
        energy,
        total_fat,
        saturated_fat,
        total_carbohydrates: carbohydrates,
        total_sugars: sugars,
        protein,
        trans_fat: None,
        added_sugars: None,
        salt: Some(salt),
        sodium: None,
        fibre: Some(4.8),
        per_fruit_veg: None,
        cholesterol: None,
        d_vitamin: None,
        calcium: None,
        iron: None,
        potassium: None,
    }
}

fn product(barcode: &str, name: &str, brand: &str, values: NutrientValues, score: NutriScore) -> NewProduct {
    NewProduct {
        barcode: barcode.to_string(),
        name: name.to_string(),
        brand: brand.to_string(),
        image: "null".to_string(),
        ingredients: vec!["maíz".to_string(), "aceite vegetal".to_string()],
        nutrients: values,
        beverage: false,
        nutri_score: score,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub jwt: JwtService,
    pub regular: Account,
    pub admin: Account,
    pub carrefour: Shop,
    pub alcampo: Shop,
    pub doritos: Product,
    pub oreo: Product,
    pub nacho: Product,
    /// Receipts of 2023-04-12 (3.4), 2023-05-12 (2.1) and 2023-06-12 (3.85)
    pub receipts: [Receipt; 3],
    pub regular_token: String,
    pub admin_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = MemoryStore::new();

        let regular = store
            .insert_account(NewAccount {
                username: "regularuser".to_string(),
                email: "test@test.es".to_string(),
                password_hash: password_hash(),
                role: Role::Regular,
            })
            .await
            .unwrap();
        let admin = store
            .insert_account(NewAccount {
                username: "adminuser".to_string(),
                email: "test@test.es".to_string(),
                password_hash: password_hash(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        let carrefour = store
            .insert_shop(
                "Carrefour",
                vec![NewLocation {
                    latitude: 9.0,
                    longitude: 10.0,
                    address: Some("Calle Vieja La Laguna".to_string()),
                }],
            )
            .await
            .unwrap();
        let alcampo = store
            .insert_shop(
                "Alcampo",
                vec![NewLocation {
                    latitude: 8.0,
                    longitude: 8.0,
                    address: Some("Santa Cruz".to_string()),
                }],
            )
            .await
            .unwrap();

        let doritos = store
            .insert_product(product(
                DORITOS_BARCODE,
                "Doritos Original",
                "Doritos",
                nutrients(497.0, 25.8, 3.1, 56.9, 2.3, 6.6, 0.97),
                NutriScore::D,
            ))
            .await
            .unwrap();
        let oreo = store
            .insert_product(product(
                OREO_BARCODE,
                "Oreo Original",
                "Oreo",
                nutrients(476.0, 20.0, 5.4, 68.0, 38.0, 5.3, 0.73),
                NutriScore::C,
            ))
            .await
            .unwrap();
        let nacho = store
            .insert_product(product(
                NACHO_BARCODE,
                "Doritos Nacho Cheese",
                "Doritos",
                nutrients(509.0, 28.8, 5.2, 59.9, 2.6, 6.8, 1.0),
                NutriScore::B,
            ))
            .await
            .unwrap();

        store
            .seed_shop_products(carrefour.id, vec![doritos.id])
            .await;
        store
            .seed_shop_products(alcampo.id, vec![oreo.id, nacho.id])
            .await;

        let receipts = [
            (3.4, "2023-04-12T13:40:29.431Z", doritos.id, carrefour.id, regular.id),
            (2.1, "2023-05-12T13:40:29.431Z", oreo.id, alcampo.id, admin.id),
            (3.85, "2023-06-12T13:40:29.431Z", nacho.id, alcampo.id, admin.id),
        ]
        .map(|(price, when, product, shop, user)| Receipt {
            id: Uuid::new_v4(),
            price,
            date: date(when),
            product,
            shop,
            user,
        });
        for receipt in &receipts {
            store.seed_receipt(receipt.clone()).await;
        }

        let jwt = JwtService::new(JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry: 7200,
        });
        let regular_token = jwt.generate_access_token("regularuser").unwrap();
        let admin_token = jwt.generate_access_token("adminuser").unwrap();

        let state = AppState::new(Arc::new(store.clone()), jwt.clone());
        let router = create_router(state);

        // the fixture copies predate the seeded indexes
        let carrefour = store.find_shop_by_id(carrefour.id).await.unwrap().unwrap();
        let alcampo = store.find_shop_by_id(alcampo.id).await.unwrap().unwrap();

        Self {
            router,
            store,
            jwt,
            regular,
            admin,
            carrefour,
            alcampo,
            doritos,
            oreo,
            nacho,
            receipts,
            regular_token,
            admin_token,
        }
    }

    /// Send a request through the router and decode the JSON answer
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn regular(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, Some(&self.regular_token), body).await
    }

    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, Some(&self.admin_token), body).await
    }
}

/// Prices of a `{receipts: [...]}` listing in response order
pub fn prices(body: &Value) -> Vec<f64> {
    body["receipts"]
        .as_array()
        .map(|receipts| {
            receipts
                .iter()
                .filter_map(|r| r["price"].as_f64())
                .collect()
        })
        .unwrap_or_default()
}

pub fn nutrients_body() -> Value {
    json!({
        "energy": 476,
        "totalFat": 20,
        "saturatedFat": 5.4,
        "totalCarbohydrates": 68,
        "totalSugars": 38,
        "protein": 5.3,
        "salt": 0.73,
        "fibre": 2.7
    })
}
