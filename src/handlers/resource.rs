//! Generic resource controller: index, store, show, update, destroy.

use crate::error::AppError;
use crate::extractors::{JsonBody, ResponseFormat};
use crate::render::Reply;
use crate::resource::Resource;
use crate::response::{paginated, success_one};
use crate::query::ListQuery;
use crate::service::{RequestValidator, ResourceService};
use crate::state::ResourceState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("invalid id".into()))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn from_validated<T: DeserializeOwned>(validated: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(validated)).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// `product` -> `Product`.
fn title(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn index<R, S>(
    State(state): State<ResourceState<R, S>>,
    format: ResponseFormat,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError>
where
    R: Resource,
    S: ResourceService<R>,
{
    let query = ListQuery::from_params(&params, state.paging)?;
    let page = state.service.get_all(&query).await?;
    let body = paginated(page.map(<R::Representation as From<R::Model>>::from));
    Reply::new(state.service.index_view(), body).negotiate(&format, &state.renderers)
}

pub async fn store<R, S>(
    State(state): State<ResourceState<R, S>>,
    format: ResponseFormat,
    JsonBody(body): JsonBody,
) -> Result<Response, AppError>
where
    R: Resource,
    S: ResourceService<R>,
{
    let body = body_to_map(body)?;
    let schema = R::store_schema();
    let validated = RequestValidator::validate::<R, S>(&body, &schema, state.service.as_ref(), None).await?;
    let created = state.service.create(from_validated(validated)?).await?;
    let id = R::id(&created);
    Reply::new(state.service.index_view(), success_one(<R::Representation as From<R::Model>>::from(created)))
        .status(StatusCode::CREATED)
        .id(id)
        .with("message", format!("{} created.", title(R::NAME)))
        .negotiate(&format, &state.renderers)
}

pub async fn show<R, S>(
    State(state): State<ResourceState<R, S>>,
    format: ResponseFormat,
    Path(id_str): Path<String>,
) -> Result<Response, AppError>
where
    R: Resource,
    S: ResourceService<R>,
{
    let id = parse_id(&id_str)?;
    let model = state.service.find(id).await?;
    Reply::new(state.service.show_view(), success_one(<R::Representation as From<R::Model>>::from(model)))
        .id(id)
        .negotiate(&format, &state.renderers)
}

/// PUT and PATCH. `sku`-style uniqueness ignores the record itself; answers 200 with the
/// updated resource.
pub async fn update<R, S>(
    State(state): State<ResourceState<R, S>>,
    format: ResponseFormat,
    Path(id_str): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Response, AppError>
where
    R: Resource,
    S: ResourceService<R>,
{
    let id = parse_id(&id_str)?;
    let body = body_to_map(body)?;
    let schema = R::update_schema();
    let validated = RequestValidator::validate::<R, S>(&body, &schema, state.service.as_ref(), Some(id)).await?;
    let model = state.service.find(id).await?;
    let updated = state.service.update(&model, from_validated(validated)?).await?;
    Reply::new(state.service.show_view(), success_one(<R::Representation as From<R::Model>>::from(updated)))
        .id(id)
        .with("message", format!("{} updated.", title(R::NAME)))
        .negotiate(&format, &state.renderers)
}

pub async fn destroy<R, S>(
    State(state): State<ResourceState<R, S>>,
    Path(id_str): Path<String>,
) -> Result<Response, AppError>
where
    R: Resource,
    S: ResourceService<R>,
{
    let id = parse_id(&id_str)?;
    let model = state.service.find(id).await?;
    state.service.delete(&model).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id(" 42 ").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn body_must_be_object() {
        assert!(body_to_map(serde_json::json!([1])).is_err());
        assert!(body_to_map(serde_json::json!({})).is_ok());
    }

    #[test]
    fn titles() {
        assert_eq!(title("product"), "Product");
        assert_eq!(title(""), "");
    }
}
