//! CRUD routes for one resource, mounted under its plural name.

use crate::config::validate_resource;
use crate::error::ConfigError;
use crate::handlers::resource::{destroy, index, show, store, update};
use crate::resource::Resource;
use crate::service::ResourceService;
use crate::state::ResourceState;
use axum::{routing::get, Router};

/// `GET|POST /{plural}` and `GET|PUT|PATCH|DELETE /{plural}/:id`.
/// Fails if the resource's table metadata or request schemas are inconsistent.
pub fn resource_routes<R, S>(state: ResourceState<R, S>) -> Result<Router, ConfigError>
where
    R: Resource,
    S: ResourceService<R>,
{
    validate_resource::<R>()?;
    let collection = format!("/{}", R::PLURAL);
    let member = format!("/{}/:id", R::PLURAL);
    tracing::debug!(resource = R::NAME, path = %collection, "mounting resource routes");
    Ok(Router::new()
        .route(&collection, get(index::<R, S>).post(store::<R, S>))
        .route(
            &member,
            get(show::<R, S>)
                .put(update::<R, S>)
                .patch(update::<R, S>)
                .delete(destroy::<R, S>),
        )
        .with_state(state))
}
