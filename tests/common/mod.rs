//! Shared helpers for integration tests: a product factory and an in-memory test app.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_admin::{app, AppConfig, MemoryResourceService, Product, ProductInput, ResourceService};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

static SEQUENCE: AtomicU32 = AtomicU32::new(1);

/// Builds valid product inputs with unique skus; override fields before `create`.
pub struct ProductFactory {
    input: ProductInput,
}

impl ProductFactory {
    pub fn new() -> Self {
        let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        ProductFactory {
            input: ProductInput {
                name: format!("Item {}", n),
                description: format!("Generated item number {}", n),
                price: Decimal::from(10 + (n % 990)),
                stock_quantity: (1 + n % 100) as i32,
                sku: Some(format!("SKU-{:05}", n)),
                image: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.input.name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.input.description = description.to_string();
        self
    }

    pub fn price(mut self, price: i64) -> Self {
        self.input.price = Decimal::from(price);
        self
    }

    pub fn sku(mut self, sku: Option<&str>) -> Self {
        self.input.sku = sku.map(str::to_string);
        self
    }

    pub fn input(self) -> ProductInput {
        self.input
    }

    pub async fn create<S: ResourceService<Product>>(self, service: &S) -> Product {
        service.create(self.input).await.expect("factory create")
    }

    pub async fn create_many<S: ResourceService<Product>>(service: &S, count: usize) -> Vec<Product> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(ProductFactory::new().create(service).await);
        }
        out
    }
}

pub struct TestApp {
    pub router: Router,
    pub service: Arc<MemoryResourceService<Product>>,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub text: String,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let service = Arc::new(MemoryResourceService::<Product>::new());
        let router = app(Arc::clone(&service), None, &config).expect("product routes");
        TestApp { router, service }
    }

    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        self.request_with(method, path, body, &[]).await
    }

    pub async fn request_with(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut all = vec![("Content-Type", "application/json")];
        all.extend_from_slice(headers);
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        self.request_raw(method, path, body, &all).await
    }

    /// Sends `body` as is; only the given headers are set.
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: impl Into<String>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let req = req.body(Body::from(body.into())).expect("request");

        let response = self.router.clone().oneshot(req).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
