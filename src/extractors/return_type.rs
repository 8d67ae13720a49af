//! Extract the requested response encoding (`X-Return-Type`) and client-bridge headers.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Method},
};

pub const RETURN_TYPE_HEADER: &str = "X-Return-Type";
pub const INERTIA_HEADER: &str = "X-Inertia";
pub const INERTIA_VERSION_HEADER: &str = "X-Inertia-Version";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnType {
    #[default]
    Json,
    View,
    Redirect,
    Inertia,
}

impl ReturnType {
    /// Case-insensitive; anything unrecognised is JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("view") => ReturnType::View,
            Some("redirect") => ReturnType::Redirect,
            Some("inertia") => ReturnType::Inertia,
            _ => ReturnType::Json,
        }
    }
}

/// Everything the negotiator needs to know about the incoming request.
#[derive(Clone, Debug)]
pub struct ResponseFormat {
    pub return_type: ReturnType,
    /// Request came from the client bridge itself (`X-Inertia` present).
    pub inertia_request: bool,
    pub inertia_version: Option<String>,
    pub method: Method,
    /// Path and query of the request.
    pub url: String,
}

impl ResponseFormat {
    pub fn json() -> Self {
        ResponseFormat {
            return_type: ReturnType::Json,
            inertia_request: false,
            inertia_version: None,
            method: Method::GET,
            url: "/".into(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ResponseFormat
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Ok(ResponseFormat {
            return_type: ReturnType::parse(header(RETURN_TYPE_HEADER).as_deref()),
            inertia_request: parts.headers.contains_key(INERTIA_HEADER),
            inertia_version: header(INERTIA_VERSION_HEADER),
            method: parts.method.clone(),
            url,
        })
    }
}
