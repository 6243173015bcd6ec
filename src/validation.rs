//! Request Validation Gate
//!
//! Parses a request's query or JSON body into a typed value and checks it
//! against the type's rules. On failure the request ends with a 400 and the
//! list of issues; the handler behind the gate never runs.

use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{FromRequest, Query, Request},
    http::Method,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result, ValidationIssue};
use crate::handler::{ApiRequest, ApiResponse, Handler};

// == Validate ==
/// A request schema.
///
/// `validate` returns every rule the value breaks; an empty list means the
/// value is accepted.
pub trait Validate {
    fn validate(&self) -> Vec<ValidationIssue>;
}

fn check<T: Validate>(value: T) -> Result<T> {
    let issues = value.validate();
    if issues.is_empty() {
        Ok(value)
    } else {
        Err(ApiError::Validation(issues))
    }
}

// == Query Gate ==
/// Deserializes and validates the query string of `request`.
pub fn validate_query<T>(request: &ApiRequest) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let Query(value) = Query::<T>::try_from_uri(&request.uri)
        .map_err(|e| ApiError::Validation(vec![ValidationIssue::new("query", e.body_text())]))?;
    check(value)
}

/// The query a `QueryGate` already validated, or a fresh check when the
/// handler is mounted without one.
pub fn validated_query<T>(request: &ApiRequest) -> Result<T>
where
    T: DeserializeOwned + Validate + Clone + Send + Sync + 'static,
{
    match request.extensions.get::<T>() {
        Some(value) => Ok(value.clone()),
        None => validate_query(request),
    }
}

// == Query Gate ==
/// Runs the query gate on GETs before `inner` sees the request.
///
/// Mounted outside a cached handler, a rejected query never derives a key,
/// touches the store or takes an in-flight lock. The validated value rides
/// along in the request extensions.
pub struct QueryGate<T, H> {
    inner: H,
    schema: PhantomData<fn() -> T>,
}

impl<T, H> QueryGate<T, H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            schema: PhantomData,
        }
    }
}

#[async_trait]
impl<T, H> Handler for QueryGate<T, H>
where
    T: DeserializeOwned + Validate + Clone + Send + Sync + 'static,
    H: Handler,
{
    async fn call(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        if request.method == Method::GET {
            let value: T = validate_query(&request)?;
            request.extensions.insert(value);
        }
        self.inner.call(request).await
    }
}

// == Body Gate ==
/// Deserializes and validates a JSON body. A missing body is an issue.
pub fn validate_body<T>(body: Option<&Value>) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let body = body.ok_or_else(|| {
        ApiError::Validation(vec![ValidationIssue::new("body", "request body is required")])
    })?;
    let value = T::deserialize(body)
        .map_err(|e| ApiError::Validation(vec![ValidationIssue::new("body", e.to_string())]))?;
    check(value)
}

// == Validated Json Extractor ==
/// Axum extractor running the body gate on a JSON request.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(vec![ValidationIssue::new("body", e.body_text())]))?;
        validate_body(Some(&body)).map(ValidatedJson)
    }
}

// == Rule Helpers ==
/// Collects issues while checking fields.
#[derive(Debug, Default)]
pub struct Issues(Vec<ValidationIssue>);

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(ValidationIssue::new(field, message));
    }

    /// Requires `value` to be within `min..=max`.
    pub fn range(&mut self, field: &str, value: u32, min: u32, max: u32) {
        if value < min || value > max {
            self.push(field, format!("must be between {} and {}", min, max));
        }
    }

    /// Requires `value` to have at most `max` characters.
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, format!("must be at most {} characters", max));
        }
    }

    /// Requires a non-empty slug of lowercase letters, digits and `-`.
    pub fn slug(&mut self, field: &str, value: &str) {
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            self.push(field, "must be a slug of lowercase letters, digits and '-'");
        }
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.0
    }
}
