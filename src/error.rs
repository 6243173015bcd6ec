//! Error types for the storefront API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::ErrorResponse;

// == Validation Issue ==
/// One failed rule from the validation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Offending field, or `query` / `body` for parse failures
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// == API Error Enum ==
/// Unified error type for the storefront API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request failed the validation gate
    #[error("Validation failed ({} issue(s))", .0.len())]
    Validation(Vec<ValidationIssue>),

    /// Missing or wrong credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller may not use this surface
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Route does not answer this method
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// Data source failed while serving a read
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("serialization failed: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(issues) => {
                ErrorResponse::new("Validation failed").with_details(issues)
            }
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg) => ErrorResponse::new(msg),
            ApiError::MethodNotAllowed(method) => {
                ErrorResponse::new(format!("Method {} not allowed", method))
            }
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storefront API.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MethodNotAllowed(Method::POST).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::Upstream("db down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_response_lists_issues() {
        let err = ApiError::Validation(vec![ValidationIssue::new("limit", "must be at most 100")]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["details"][0]["field"], "limit");
    }
}
