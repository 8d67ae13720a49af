//! Compile-time binding of one entity into the generic CRUD machinery.

use crate::config::TableDef;
use crate::service::RequestSchema;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::postgres::PgRow;

/// An entity exposed through the CRUD endpoints.
///
/// The implementor names the stored model, the validated create and update inputs, the
/// read representation, and the request schemas that guard writes. The service and
/// controller layers are generic over this trait.
pub trait Resource: Send + Sync + 'static {
    type Model: Serialize
        + DeserializeOwned
        + Clone
        + Send
        + Sync
        + Unpin
        + for<'r> sqlx::FromRow<'r, PgRow>;
    type CreateInput: Serialize + DeserializeOwned + Send + Sync;
    type UpdateInput: Serialize + DeserializeOwned + Send + Sync;
    type Representation: Serialize + From<Self::Model> + Send;

    /// Singular name, used in logs and error messages.
    const NAME: &'static str;
    /// Plural name: URL segment and view folder.
    const PLURAL: &'static str;

    fn table() -> &'static TableDef;

    fn store_schema() -> RequestSchema;

    fn update_schema() -> RequestSchema;

    fn id(model: &Self::Model) -> i64;
}

/// View identifiers derived from the plural name.
pub fn view_name<R: Resource>(action: &str) -> String {
    format!("{}.{}", R::PLURAL, action)
}
