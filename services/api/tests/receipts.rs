mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::{DORITOS_BARCODE, NACHO_BARCODE, OREO_BARCODE, TestApp, prices};
use grocery_api::store::Store;

#[tokio::test]
async fn test_list_receipts_most_recent_first() {
    let app = TestApp::new().await;

    let (status, body) = app.regular(Method::GET, "/receipts", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(prices(&body), vec![3.85, 2.1, 3.4]);

    let newest = &body["receipts"][0];
    assert_eq!(newest["shop"]["name"], "Alcampo");
    assert_eq!(newest["product"]["barcode"], NACHO_BARCODE);
    assert_eq!(newest["product"]["name"], "Doritos Nacho Cheese");
    assert!(newest.get("user").is_none());
}

#[tokio::test]
async fn test_list_receipts_by_price_range() {
    let app = TestApp::new().await;

    let (status, body) = app
        .regular(Method::GET, "/receipts?minprice=3.1&maxprice=4.2", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(prices(&body), vec![3.85, 3.4]);

    let (_, body) = app.regular(Method::GET, "/receipts?minprice=3.4", None).await;
    assert_eq!(prices(&body), vec![3.85, 3.4]);

    let (_, body) = app.regular(Method::GET, "/receipts?maxprice=2.1", None).await;
    assert_eq!(prices(&body), vec![2.1]);
}

#[tokio::test]
async fn test_list_receipts_by_shop_and_product() {
    let app = TestApp::new().await;

    let (_, body) = app.regular(Method::GET, "/receipts?shop=Alcampo", None).await;
    assert_eq!(prices(&body), vec![3.85, 2.1]);

    let (_, body) = app
        .regular(
            Method::GET,
            &format!("/receipts?shop=Alcampo&product={}", OREO_BARCODE),
            None,
        )
        .await;
    assert_eq!(prices(&body), vec![2.1]);

    let (_, body) = app
        .regular(
            Method::GET,
            &format!("/receipts?shop=Carrefour&product={}", OREO_BARCODE),
            None,
        )
        .await;
    assert_eq!(prices(&body), Vec::<f64>::new());
}

#[tokio::test]
async fn test_list_receipts_with_unknown_references_is_empty() {
    let app = TestApp::new().await;

    let (status, body) = app.regular(Method::GET, "/receipts?shop=Mercadona", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["receipts"], json!([]));

    let (status, body) = app
        .regular(Method::GET, "/receipts?product=000000000000", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["receipts"], json!([]));
}

#[tokio::test]
async fn test_list_receipts_by_date_range() {
    let app = TestApp::new().await;

    let (_, body) = app.regular(Method::GET, "/receipts?sdate=2023-05-01", None).await;
    assert_eq!(prices(&body), vec![3.85, 2.1]);

    // a bare end date means midnight at the start of that day
    let (_, body) = app.regular(Method::GET, "/receipts?edate=2023-05-12", None).await;
    assert_eq!(prices(&body), vec![3.4]);

    let (_, body) = app
        .regular(
            Method::GET,
            "/receipts?sdate=2023-04-12T13:40:29.431Z&edate=2023-05-12T13:40:29.431Z",
            None,
        )
        .await;
    assert_eq!(prices(&body), vec![2.1, 3.4]);

    let (status, body) = app.regular(Method::GET, "/receipts?sdate=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date for sdate: yesterday");
}

#[tokio::test]
async fn test_list_receipts_paginates_after_sorting() {
    let app = TestApp::new().await;

    let (_, body) = app.regular(Method::GET, "/receipts?limit=2", None).await;
    assert_eq!(prices(&body), vec![3.85, 2.1]);

    let (_, body) = app.regular(Method::GET, "/receipts?limit=1&skip=1", None).await;
    assert_eq!(prices(&body), vec![2.1]);

    let (_, body) = app.regular(Method::GET, "/receipts?skip=5", None).await;
    assert_eq!(body["receipts"], json!([]));

    let (status, _) = app.regular(Method::GET, "/receipts?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_receipt_by_id_includes_user() {
    let app = TestApp::new().await;
    let receipt = &app.receipts[0];

    let (status, body) = app
        .regular(Method::GET, &format!("/receipts/{}", receipt.id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 3.4);
    assert_eq!(body["user"], json!(app.regular.id));
    assert_eq!(body["shop"]["name"], "Carrefour");

    let (status, body) = app
        .regular(
            Method::GET,
            "/receipts/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Receipt not found");
}

#[tokio::test]
async fn test_create_receipt_updates_indexes() {
    let app = TestApp::new().await;

    let (status, body) = app
        .regular(
            Method::POST,
            "/shops/products",
            Some(json!({"shop": "Carrefour", "barcode": OREO_BARCODE, "price": "1.99"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Receipt successfully created");
    assert_eq!(body["receipt"]["price"], 1.99);
    assert_eq!(body["receipt"]["user"], json!(app.regular.id));
    assert_eq!(
        body["shop"]["products"],
        json!([app.doritos.id, app.oreo.id])
    );

    let (_, body) = app.regular(Method::GET, "/account", None).await;
    assert_eq!(body["products"], json!([app.oreo.id]));

    let (_, body) = app.regular(Method::GET, "/receipts?limit=1", None).await;
    assert_eq!(prices(&body), vec![1.99]);
}

#[tokio::test]
async fn test_create_receipt_twice_keeps_indexes_unique() {
    let app = TestApp::new().await;

    for price in [1.5, 1.6] {
        let (status, _) = app
            .regular(
                Method::POST,
                "/shops/products",
                Some(json!({"shop": "Carrefour", "barcode": DORITOS_BARCODE, "price": price})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let shop = app.store.find_shop_by_id(app.carrefour.id).await.unwrap().unwrap();
    assert_eq!(shop.products, vec![app.doritos.id]);
    assert_eq!(app.store.receipt_count().await, 5);
}

#[tokio::test]
async fn test_create_receipt_validation() {
    let app = TestApp::new().await;

    let cases = [
        (
            json!({"shop": "Carrefour", "price": 2}),
            StatusCode::BAD_REQUEST,
            "shop, barcode, and price needs to be provided",
        ),
        (
            json!({"shop": "Mercadona", "barcode": OREO_BARCODE, "price": 2}),
            StatusCode::NOT_FOUND,
            "Shop not found",
        ),
        (
            json!({"shop": "Carrefour", "barcode": "000000000000", "price": 2}),
            StatusCode::NOT_FOUND,
            "Product not found",
        ),
        (
            json!({"shop": "Carrefour", "barcode": OREO_BARCODE, "price": "cheap"}),
            StatusCode::BAD_REQUEST,
            "shop, barcode, and price needs to be provided",
        ),
        (
            json!({"shop": "Carrefour", "barcode": OREO_BARCODE, "price": 0}),
            StatusCode::BAD_REQUEST,
            "shop, barcode, and price needs to be provided",
        ),
    ];

    for (payload, expected_status, expected_error) in cases {
        let (status, body) = app
            .regular(Method::POST, "/shops/products", Some(payload))
            .await;
        assert_eq!(status, expected_status);
        assert_eq!(body["error"], expected_error);
    }

    assert_eq!(app.store.receipt_count().await, 3);
    let shop = app.store.find_shop_by_id(app.carrefour.id).await.unwrap().unwrap();
    assert_eq!(shop.products, vec![app.doritos.id]);
}

#[tokio::test]
async fn test_bulk_delete_requires_filter_keys() {
    let app = TestApp::new().await;

    for uri in ["/receipts", "/receipts?limit=1", "/receipts?shop=Alcampo&foo=bar"] {
        let (status, body) = app.admin(Method::DELETE, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "No valid queries were given.");
    }

    assert_eq!(app.store.receipt_count().await, 3);
}

#[tokio::test]
async fn test_bulk_delete_matching_receipts() {
    let app = TestApp::new().await;

    let (status, _) = app
        .regular(Method::DELETE, "/receipts?shop=Alcampo", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .admin(Method::DELETE, "/receipts?shop=Alcampo&minprice=3", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);
    assert_eq!(body["message"], "1 receipt(s) deleted");

    let (_, body) = app.regular(Method::GET, "/receipts", None).await;
    assert_eq!(prices(&body), vec![2.1, 3.4]);

    let (_, body) = app.admin(Method::DELETE, "/receipts?shop=Mercadona", None).await;
    assert_eq!(body["deleted"], 0);
    assert_eq!(app.store.receipt_count().await, 2);
}

#[tokio::test]
async fn test_delete_single_receipt() {
    let app = TestApp::new().await;
    let uri = format!("/receipts/{}", app.receipts[1].id);

    let (status, body) = app.regular(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Role not valid");

    let (status, body) = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 2.1);

    let (status, _) = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.receipt_count().await, 2);
}
