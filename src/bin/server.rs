//! Catalog server: reads settings from the environment, prepares the products table and
//! serves the product CRUD routes. `DATABASE_URL=memory` runs against an in-process store.

use catalog_admin::{
    app, apply_migrations, connect, AppConfig, MemoryResourceService, PgResourceService, Product, Resource,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_admin=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let router = if config.uses_memory_store() {
        tracing::warn!("using in-memory store; data is lost on exit");
        app(Arc::new(MemoryResourceService::<Product>::new()), None, &config)?
    } else {
        let pool = connect(&config).await?;
        apply_migrations(&pool, &config.schema, &[Product::table()]).await?;
        let service = PgResourceService::<Product>::new(pool.clone(), config.schema.clone());
        app(Arc::new(service), Some(pool), &config)?
    };

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
