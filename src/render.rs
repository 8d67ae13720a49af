//! Response negotiation: one payload rendered as JSON, a server-side view, a redirect,
//! or a client-bridge (Inertia) page, picked by `X-Return-Type`.

use crate::error::AppError;
use crate::extractors::{ResponseFormat, ReturnType};
use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const FLASH_COOKIE: &str = "flash";
const FLASH_MAX_AGE_SECS: u32 = 60;

const INERTIA: HeaderName = HeaderName::from_static("x-inertia");
const INERTIA_LOCATION: HeaderName = HeaderName::from_static("x-inertia-location");

/// Server-side template rendering behind the `view` branch.
pub trait ViewRenderer: Send + Sync + 'static {
    fn render(&self, view: &str, data: &Value) -> Result<String, AppError>;
}

/// Built-in renderer: a self-contained HTML document with the data as nested lists
/// and as embedded JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlViewRenderer;

impl ViewRenderer for HtmlViewRenderer {
    fn render(&self, view: &str, data: &Value) -> Result<String, AppError> {
        let json = serde_json::to_string(data).map_err(|e| AppError::Render(e.to_string()))?;
        let mut body = String::new();
        render_value(&mut body, data);
        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
             <body data-view=\"{title}\">\n{body}\n\
             <script type=\"application/json\" id=\"view-data\">{json}</script>\n</body>\n</html>\n",
            title = escape_html(view),
            body = body,
            json = json.replace("</", "<\\/"),
        ))
    }
}

fn render_value(out: &mut String, v: &Value) {
    match v {
        Value::Object(m) => {
            out.push_str("<dl>");
            for (k, v) in m {
                out.push_str("<dt>");
                out.push_str(&escape_html(k));
                out.push_str("</dt><dd>");
                render_value(out, v);
                out.push_str("</dd>");
            }
            out.push_str("</dl>");
        }
        Value::Array(items) => {
            out.push_str("<ol>");
            for item in items {
                out.push_str("<li>");
                render_value(out, item);
                out.push_str("</li>");
            }
            out.push_str("</ol>");
        }
        Value::Null => {}
        Value::String(s) => out.push_str(&escape_html(s)),
        other => out.push_str(&other.to_string()),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renderers shared by every resource controller.
#[derive(Clone)]
pub struct Renderers {
    pub views: Arc<dyn ViewRenderer>,
    /// Asset version for the client bridge; a mismatching client gets a 409 reload.
    pub inertia_version: Option<String>,
}

impl Default for Renderers {
    fn default() -> Self {
        Renderers {
            views: Arc::new(HtmlViewRenderer),
            inertia_version: None,
        }
    }
}

impl Renderers {
    pub fn with_inertia_version(mut self, version: Option<String>) -> Self {
        self.inertia_version = version;
        self
    }
}

/// Extras become extra keys of an object payload; any other payload goes under `data`.
pub fn merge(payload: Value, extras: &Map<String, Value>) -> Value {
    match payload {
        Value::Object(mut m) => {
            for (k, v) in extras {
                m.insert(k.clone(), v.clone());
            }
            Value::Object(m)
        }
        other => {
            let mut m = Map::new();
            m.insert("data".into(), other);
            for (k, v) in extras {
                m.insert(k.clone(), v.clone());
            }
            Value::Object(m)
        }
    }
}

/// Path of a named route: `products.index` -> `/products`, `products.show` -> `/products/{id}`.
pub fn route_path(name: &str, id: Option<i64>) -> Result<String, AppError> {
    let (plural, action) = name
        .rsplit_once('.')
        .ok_or_else(|| AppError::Render(format!("route name '{}' has no action", name)))?;
    match (action, id) {
        ("index", _) => Ok(format!("/{}", plural)),
        ("create", _) => Ok(format!("/{}/create", plural)),
        ("show", Some(id)) => Ok(format!("/{}/{}", plural, id)),
        ("edit", Some(id)) => Ok(format!("/{}/{}/edit", plural, id)),
        _ => Err(AppError::Render(format!("cannot resolve route '{}'", name))),
    }
}

#[derive(Serialize)]
struct InertiaPage<'a> {
    component: &'a str,
    props: Value,
    url: &'a str,
    version: Option<&'a str>,
}

/// One controller result, before it is encoded for the client.
pub struct Reply<T> {
    pub view: String,
    pub payload: T,
    pub extras: Map<String, Value>,
    pub status: StatusCode,
    /// Record id, for routes that need one when redirecting.
    pub id: Option<i64>,
}

impl<T: Serialize> Reply<T> {
    pub fn new(view: String, payload: T) -> Self {
        Reply {
            view,
            payload,
            extras: Map::new(),
            status: StatusCode::OK,
            id: None,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extras.insert(key.to_string(), value.into());
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn negotiate(self, format: &ResponseFormat, renderers: &Renderers) -> Result<Response, AppError> {
        match format.return_type {
            ReturnType::Json => Ok((self.status, Json(self.payload)).into_response()),
            ReturnType::View => {
                let data = merge(to_value(&self.payload)?, &self.extras);
                let html = renderers.views.render(&self.view, &data)?;
                Ok((self.status, html_headers(), html).into_response())
            }
            ReturnType::Redirect => self.redirect(),
            ReturnType::Inertia => self.inertia(format, renderers),
        }
    }

    fn redirect(self) -> Result<Response, AppError> {
        let location = route_path(&self.view, self.id)?;
        let location = HeaderValue::from_str(&location).map_err(|e| AppError::Render(e.to_string()))?;
        let mut res = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
        if !self.extras.is_empty() {
            let json = serde_json::to_vec(&self.extras).map_err(|e| AppError::Render(e.to_string()))?;
            let cookie = format!(
                "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
                FLASH_COOKIE,
                STANDARD.encode(json),
                FLASH_MAX_AGE_SECS
            );
            let cookie = HeaderValue::from_str(&cookie).map_err(|e| AppError::Render(e.to_string()))?;
            res.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        Ok(res)
    }

    fn inertia(self, format: &ResponseFormat, renderers: &Renderers) -> Result<Response, AppError> {
        let version = renderers.inertia_version.as_deref();
        let stale = format.inertia_request
            && format.method == Method::GET
            && version.is_some()
            && format.inertia_version.as_deref() != version;
        if stale {
            tracing::debug!(url = %format.url, "client bridge asset version changed");
            let location = HeaderValue::from_str(&format.url).map_err(|e| AppError::Render(e.to_string()))?;
            return Ok((StatusCode::CONFLICT, [(INERTIA_LOCATION, location)]).into_response());
        }
        let page = InertiaPage {
            component: &self.view,
            props: merge(to_value(&self.payload)?, &self.extras),
            url: &format.url,
            version,
        };
        if format.inertia_request {
            let mut res = (self.status, Json(page)).into_response();
            let headers = res.headers_mut();
            headers.insert(INERTIA, HeaderValue::from_static("true"));
            headers.insert(header::VARY, HeaderValue::from_static("X-Inertia"));
            return Ok(res);
        }
        let json = serde_json::to_string(&page).map_err(|e| AppError::Render(e.to_string()))?;
        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n\
             <body>\n<div id=\"app\" data-page=\"{}\"></div>\n</body>\n</html>\n",
            escape_html(&json)
        );
        Ok((self.status, html_headers(), html).into_response())
    }
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value, AppError> {
    serde_json::to_value(payload).map_err(|e| AppError::Render(e.to_string()))
}

fn html_headers() -> [(HeaderName, HeaderValue); 1] {
    [(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))]
}
