//! Framework-independent Handler Abstraction
//!
//! Request handlers, including the cache wrapper, are written against these
//! types. `api::endpoint` mounts any `Handler` on an axum route.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::cache::QueryParams;
use crate::error::{ApiError, Result};

// == Api Request ==
/// An inbound request as seen by a handler.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub uri: Uri,
    /// Captured route parameters, e.g. `slug`
    pub params: HashMap<String, String>,
    /// Decoded query parameters
    pub query: QueryParams,
    /// Parsed JSON body, if one was sent
    pub body: Option<Value>,
    /// Values attached by gates in front of the handler, e.g. a validated query
    pub extensions: Extensions,
}

impl ApiRequest {
    /// Creates a body-less request, decoding the query from `uri`.
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = QueryParams::parse(uri.query().unwrap_or(""));
        Self {
            method,
            uri,
            params: HashMap::new(),
            query,
            body: None,
            extensions: Extensions::new(),
        }
    }

    /// Shorthand for a GET of `uri`.
    pub fn get(uri: &str) -> Result<Self> {
        let uri = uri
            .parse::<Uri>()
            .map_err(|e| ApiError::Internal(format!("invalid uri {}: {}", uri, e)))?;
        Ok(Self::new(Method::GET, uri))
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Route parameter `name`, or 404 when the route did not capture it.
    pub fn param(&self, name: &str) -> Result<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::NotFound(format!("missing route parameter '{}'", name)))
    }
}

// == Api Response ==
/// A JSON response produced by a handler.
///
/// The body is kept serialized so the cache can replay it unchanged.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    /// 200 response with `value` serialized as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::from_body(StatusCode::OK, serde_json::to_string(value)?))
    }

    /// Response with an already-serialized JSON body.
    pub fn from_body(status: StatusCode, body: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parses the body back into JSON.
    pub fn json_body(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

// == Handler ==
/// An async request handler.
///
/// Closures of the form `Fn(ApiRequest) -> impl Future<Output = Result<ApiResponse>>`
/// implement it directly.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
{
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        (self)(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_decodes_query() {
        let request = ApiRequest::get("/api/products?page=2&limit=10").unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path(), "/api/products");
        assert_eq!(request.query.get("page"), Some("2"));
    }

    #[test]
    fn test_request_param() {
        let request = ApiRequest::get("/api/products/panel-400w")
            .unwrap()
            .with_param("slug", "panel-400w");
        assert_eq!(request.param("slug").unwrap(), "panel-400w");
        assert!(matches!(request.param("id"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_json_response() {
        let response = ApiResponse::json(&json!({ "count": 1 })).unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, r#"{"count":1}"#);
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_closure_is_handler() {
        let handler = |request: ApiRequest| async move {
            ApiResponse::json(&json!({ "path": request.path() }))
        };

        let response = Handler::call(&handler, ApiRequest::get("/health").unwrap())
            .await
            .unwrap();
        assert_eq!(response.json_body().unwrap()["path"], "/health");
    }
}
