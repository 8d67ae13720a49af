//! HTTP surface of the product routes, served from the in-memory store.

mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use catalog_admin::AppConfig;
use common::{ProductFactory, TestApp};
use serde_json::{json, Value};

fn lamp() -> Value {
    json!({
        "name": "Desk lamp",
        "description": "Adjustable arm",
        "price": 100,
        "stock_quantity": 4,
        "sku": "LAMP-1",
        "image": "https://cdn.example.com/lamp.png"
    })
}

#[tokio::test]
async fn store_returns_created_resource() {
    let app = TestApp::new();
    let res = app.request("POST", "/products", Some(lamp())).await;

    assert_eq!(res.status, StatusCode::CREATED);
    let data = &res.body["data"];
    assert_eq!(data["id"], json!(1));
    assert_eq!(data["name"], json!("Desk lamp"));
    assert_eq!(data["price"], json!("100.00"));
    assert_eq!(data["stock_quantity"], json!(4));
    assert_eq!(data["sku"], json!("LAMP-1"));
    assert!(data["created_at"].is_string());
    assert!(res.body.get("message").is_none());
    assert_eq!(app.service.len(), 1);
}

#[tokio::test]
async fn store_rejects_invalid_body_with_field_messages() {
    let app = TestApp::new();
    let res = app
        .request("POST", "/products", Some(json!({"price": "abc", "image": "nope"})))
        .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["error"]["code"], json!("validation_error"));
    let fields = &res.body["error"]["details"]["fields"];
    assert_eq!(fields["name"], json!(["The product name is required."]));
    assert_eq!(fields["description"], json!(["The description is required."]));
    assert_eq!(fields["price"], json!(["The price field must be a number."]));
    assert_eq!(fields["stock_quantity"], json!(["The stock quantity is required."]));
    assert_eq!(fields["image"], json!(["The image must be a valid URL."]));
    assert!(app.service.is_empty());
}

#[tokio::test]
async fn store_rejects_duplicate_sku() {
    let app = TestApp::new();
    app.request("POST", "/products", Some(lamp())).await;
    let res = app.request("POST", "/products", Some(lamp())).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["error"]["details"]["fields"]["sku"], json!(["The SKU must be unique."]));
}

#[tokio::test]
async fn store_rejects_non_object_body() {
    let app = TestApp::new();
    let res = app.request("POST", "/products", Some(json!([1, 2]))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"]["code"], json!("bad_request"));
}

#[tokio::test]
async fn store_rejects_numbers_the_columns_cannot_hold() {
    let app = TestApp::new();
    let mut body = lamp();
    body["price"] = json!(123456789012u64);
    body["stock_quantity"] = json!(3000000000u64);
    let res = app.request("POST", "/products", Some(body)).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &res.body["error"]["details"]["fields"];
    assert_eq!(fields["price"], json!(["The price field must not be greater than 99999999.99."]));
    assert_eq!(
        fields["stock_quantity"],
        json!(["The stock quantity field must not be greater than 2147483647."])
    );
    assert!(app.service.is_empty());
}

#[tokio::test]
async fn update_rejects_price_above_column_precision() {
    let app = TestApp::new();
    let product = ProductFactory::new().create(app.service.as_ref()).await;
    let res = app
        .request("PATCH", &format!("/products/{}", product.id), Some(json!({
            "name": product.name, "description": product.description,
            "price": "100000000", "stock_quantity": 1
        })))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["error"]["details"]["fields"]["price"].is_array());
}

#[tokio::test]
async fn malformed_json_keeps_error_envelope() {
    let app = TestApp::new();
    let res = app
        .request_raw("POST", "/products", "{\"name\":", &[("Content-Type", "application/json")])
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"]["code"], json!("bad_request"));

    let res = app.request_raw("POST", "/products", lamp().to_string(), &[]).await;
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(res.body["error"]["code"], json!("unsupported_media_type"));
    assert!(app.service.is_empty());
}

#[tokio::test]
async fn show_and_missing() {
    let app = TestApp::new();
    let product = ProductFactory::new().name("Shelf").create(app.service.as_ref()).await;

    let res = app.request("GET", &format!("/products/{}", product.id), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["name"], json!("Shelf"));

    let res = app.request("GET", "/products/999", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"]["code"], json!("not_found"));

    let res = app.request("GET", "/products/abc", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_returns_ok_with_body_and_keeps_own_sku() {
    let app = TestApp::new();
    app.request("POST", "/products", Some(lamp())).await;

    let mut body = lamp();
    body["name"] = json!("Floor lamp");
    body["price"] = json!("149.5");
    let res = app.request("PUT", "/products/1", Some(body)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["name"], json!("Floor lamp"));
    assert_eq!(res.body["data"]["price"], json!("149.50"));
    assert_eq!(res.body["data"]["sku"], json!("LAMP-1"));
}

#[tokio::test]
async fn patch_is_update() {
    let app = TestApp::new();
    app.request("POST", "/products", Some(lamp())).await;
    let mut body = lamp();
    body["sku"] = Value::Null;
    let res = app.request("PATCH", "/products/1", Some(body)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["sku"], Value::Null);
}

#[tokio::test]
async fn update_to_another_products_sku_fails_validation() {
    let app = TestApp::new();
    app.request("POST", "/products", Some(lamp())).await;
    let mut other = lamp();
    other["sku"] = json!("LAMP-2");
    app.request("POST", "/products", Some(other.clone())).await;

    other["sku"] = json!("LAMP-1");
    let res = app.request("PUT", "/products/2", Some(other)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["error"]["details"]["fields"]["sku"], json!(["The SKU must be unique."]));
}

#[tokio::test]
async fn update_missing_product_is_not_found() {
    let app = TestApp::new();
    let res = app.request("PUT", "/products/42", Some(lamp())).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn destroy_then_destroy_again() {
    let app = TestApp::new();
    let product = ProductFactory::new().create(app.service.as_ref()).await;
    let path = format!("/products/{}", product.id);

    let res = app.request("DELETE", &path, None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.text.is_empty());

    let res = app.request("DELETE", &path, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_filters_searches_sorts_and_paginates() {
    let app = TestApp::new();
    let service = app.service.as_ref();
    ProductFactory::new().name("Product 1").description("First product").price(100).create(service).await;
    ProductFactory::new().name("Product 2").description("Second product").price(200).create(service).await;

    let res = app.request("GET", "/products?filters%5Bprice%5D=100", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["data"][0]["name"], json!("Product 1"));

    let res = app.request("GET", "/products?search=SECOND", None).await;
    assert_eq!(res.body["meta"]["total"], json!(1));
    assert_eq!(res.body["data"][0]["name"], json!("Product 2"));

    let res = app.request("GET", "/products?sortBy=name&sortOrder=asc", None).await;
    assert_eq!(res.body["data"][0]["name"], json!("Product 1"));
    let res = app.request("GET", "/products?sort_by=name&sort_order=desc", None).await;
    assert_eq!(res.body["data"][0]["name"], json!("Product 2"));

    ProductFactory::create_many(service, 18).await;
    let res = app.request("GET", "/products?per_page=5&page=2&sort_by=id&sort_order=asc", None).await;
    assert_eq!(res.body["data"].as_array().unwrap().len(), 5);
    assert_eq!(
        res.body["meta"],
        json!({"current_page": 2, "per_page": 5, "total": 20, "last_page": 4, "from": 6, "to": 10})
    );
}

#[tokio::test]
async fn index_defaults_to_fifteen_per_page() {
    let app = TestApp::new();
    ProductFactory::create_many(app.service.as_ref(), 16).await;
    let res = app.request("GET", "/products", None).await;
    assert_eq!(res.body["data"].as_array().unwrap().len(), 15);
    assert_eq!(res.body["meta"]["per_page"], json!(15));
}

#[tokio::test]
async fn index_rejects_disallowed_fields() {
    let app = TestApp::new();
    let res = app.request("GET", "/products?sort_by=secret", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.request("GET", "/products?filters%5Bdescription%5D=x", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.request("GET", "/products?sort_order=sideways", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn index_rejects_integer_filter_out_of_column_range() {
    let app = TestApp::new();
    let res = app
        .request("GET", "/products?filters%5Bstock_quantity%5D=3000000000", None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"]["code"], json!("bad_request"));
}

#[tokio::test]
async fn view_return_type_renders_html() {
    let app = TestApp::new();
    ProductFactory::new().name("Bench").create(app.service.as_ref()).await;
    let res = app
        .request_with("GET", "/products/1", None, &[("X-Return-Type", "view")])
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
    assert!(res.text.contains("data-view=\"products.show\""));
    assert!(res.text.contains("Bench"));
}

#[tokio::test]
async fn redirect_return_type_after_store() {
    let app = TestApp::new();
    let res = app
        .request_with("POST", "/products", Some(lamp()), &[("X-Return-Type", "redirect")])
        .await;

    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.header("location"), Some("/products"));
    let cookie = res.header("set-cookie").unwrap();
    let encoded = cookie.strip_prefix("flash=").unwrap().split(';').next().unwrap();
    let flash: Value = serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();
    assert_eq!(flash, json!({"message": "Product created."}));
    assert_eq!(app.service.len(), 1);
}

#[tokio::test]
async fn redirect_return_type_after_update_targets_show() {
    let app = TestApp::new();
    app.request("POST", "/products", Some(lamp())).await;
    let res = app
        .request_with("PUT", "/products/1", Some(lamp()), &[("X-Return-Type", "REDIRECT")])
        .await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.header("location"), Some("/products/1"));
}

#[tokio::test]
async fn inertia_return_type() {
    let app = TestApp::new();
    app.request("POST", "/products", Some(lamp())).await;

    let res = app
        .request_with(
            "GET",
            "/products/1",
            None,
            &[("X-Return-Type", "inertia"), ("X-Inertia", "true")],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header("x-inertia"), Some("true"));
    assert_eq!(res.body["component"], json!("products.show"));
    assert_eq!(res.body["url"], json!("/products/1"));
    assert_eq!(res.body["props"]["data"]["sku"], json!("LAMP-1"));

    let res = app
        .request_with("GET", "/products", None, &[("X-Return-Type", "inertia")])
        .await;
    assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
    assert!(res.text.contains("data-page=\""));
    assert!(res.text.contains("products.index"));
}

#[tokio::test]
async fn unknown_return_type_falls_back_to_json() {
    let app = TestApp::new();
    let res = app
        .request_with("POST", "/products", Some(lamp()), &[("X-Return-Type", "xml")])
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["sku"], json!("LAMP-1"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = TestApp::with_config(AppConfig {
        body_limit_bytes: 16,
        ..AppConfig::default()
    });
    let body = lamp();
    let len = body.to_string().len().to_string();
    let res = app
        .request_with("POST", "/products", Some(body), &[("Content-Length", len.as_str())])
        .await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.service.is_empty());
}

#[tokio::test]
async fn health_ready_version() {
    let app = TestApp::new();
    let res = app.request("GET", "/health", None).await;
    assert_eq!(res.body, json!({"status": "ok"}));
    let res = app.request("GET", "/ready", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["database"], json!("memory"));
    let res = app.request("GET", "/version", None).await;
    assert_eq!(res.body["name"], json!("catalog-admin"));
}
