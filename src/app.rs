//! Assembles the catalog router from settings and a product service.

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::products::Product;
use crate::query::Paging;
use crate::render::Renderers;
use crate::routes::{common_routes, resource_routes};
use crate::service::ResourceService;
use crate::state::ResourceState;
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub fn app<S>(service: Arc<S>, pool: Option<PgPool>, config: &AppConfig) -> Result<Router, ConfigError>
where
    S: ResourceService<Product>,
{
    let paging = Paging {
        default_per_page: config.default_per_page,
        max_per_page: config.max_per_page,
    };
    let renderers = Renderers::default().with_inertia_version(config.inertia_version.clone());
    let products = ResourceState::new(service)
        .with_renderers(renderers)
        .with_paging(paging);
    Ok(Router::new()
        .merge(common_routes(pool))
        .merge(resource_routes::<Product, S>(products)?)
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http()))
}
