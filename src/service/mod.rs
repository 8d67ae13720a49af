//! The resource service contract and its PostgreSQL and in-memory gateways.

mod crud;
mod memory;
mod validation;

pub use crud::PgResourceService;
pub use memory::MemoryResourceService;
pub use validation::{FieldRules, FieldType, RequestSchema, RequestValidator};

use crate::error::AppError;
use crate::page::Page;
use crate::query::ListQuery;
use crate::resource::{view_name, Resource};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Generic CRUD over one resource. Every mutation is atomic: on failure nothing is applied
/// and the original error is returned unchanged.
#[async_trait]
pub trait ResourceService<R: Resource>: Send + Sync + 'static {
    /// Filtered, searched, sorted, offset-paginated listing. Unknown or disallowed field
    /// names are rejected.
    async fn get_all(&self, query: &ListQuery) -> Result<Page<R::Model>, AppError>;

    async fn create(&self, input: R::CreateInput) -> Result<R::Model, AppError>;

    async fn find(&self, id: i64) -> Result<R::Model, AppError>;

    /// Overwrites the provided fields. `NotFound` if the row vanished since it was fetched.
    async fn update(&self, model: &R::Model, input: R::UpdateInput) -> Result<R::Model, AppError>;

    /// `NotFound` when the row is already gone.
    async fn delete(&self, model: &R::Model) -> Result<(), AppError>;

    /// Whether a row other than `except_id` holds `value` in `column`.
    async fn is_taken(
        &self,
        column: &str,
        value: &Value,
        except_id: Option<i64>,
    ) -> Result<bool, AppError>;

    fn index_view(&self) -> String {
        view_name::<R>("index")
    }

    fn show_view(&self) -> String {
        view_name::<R>("show")
    }

    fn edit_view(&self) -> String {
        view_name::<R>("edit")
    }
}

fn not_found<R: Resource>(id: i64) -> AppError {
    AppError::NotFound(format!("{} {}", R::NAME, id))
}

/// Serialize a typed input into column -> value pairs.
fn column_map<T: serde::Serialize>(input: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(input) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("input must serialize to an object".into())),
        Err(e) => Err(AppError::BadRequest(e.to_string())),
    }
}
