//! Catalog admin: a generic CRUD backend with per-request response negotiation,
//! bound here to the product catalog.

pub mod app;
pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod page;
pub mod products;
pub mod query;
pub mod render;
pub mod resource;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use app::app;
pub use config::{validate_resource, AppConfig, ColumnDef, ColumnType, TableDef};
pub use error::{AppError, ConfigError, ValidationErrors};
pub use extractors::{JsonBody, ResponseFormat, ReturnType};
pub use migration::apply_migrations;
pub use page::Page;
pub use products::{Product, ProductInput, ProductResource, ProductUpdate};
pub use query::{ListQuery, Paging, SortOrder};
pub use render::{HtmlViewRenderer, Renderers, Reply, ViewRenderer};
pub use resource::Resource;
pub use routes::{common_routes, resource_routes};
pub use service::{MemoryResourceService, PgResourceService, ResourceService};
pub use state::ResourceState;
pub use store::{connect, ensure_database_exists};
