//! API Handlers
//!
//! Storefront reads are `Handler` implementations so they can sit behind the
//! response cache. Admin and health endpoints are plain axum handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, Method, StatusCode},
    Json,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::cache::ResponseCache;
use crate::catalog::{DataSource, FetchRequest, Mutation};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::handler::{ApiRequest, ApiResponse, Handler};
use crate::models::{
    AddImageRequest, ClearResponse, HealthResponse, InvalidateRequest, InvalidateResponse,
    ProductQuery, StatsResponse,
};
use crate::validation::{validated_query, ValidatedJson};

/// Tag carried by every cached product response.
pub const PRODUCTS_TAG: &str = "products";
/// Tag carried by cached responses that embed product images.
pub const IMAGES_TAG: &str = "images";
/// Tag carried by the cached category list.
pub const CATEGORIES_TAG: &str = "categories";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Response cache shared by the cached routes and the admin API
    pub cache: ResponseCache,
    /// Catalog reads and writes
    pub catalog: Arc<dyn DataSource>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState with a fresh in-memory response cache.
    pub fn new(config: Config, catalog: Arc<dyn DataSource>) -> Self {
        Self::with_cache(config, catalog, ResponseCache::in_memory())
    }

    pub fn with_cache(config: Config, catalog: Arc<dyn DataSource>, cache: ResponseCache) -> Self {
        Self {
            cache,
            catalog,
            config: Arc::new(config),
        }
    }
}

fn ensure_get(request: &ApiRequest) -> Result<()> {
    if request.method == Method::GET {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed(request.method.clone()))
    }
}

// == Storefront Reads ==
/// `GET /api/products`
pub struct ListProducts {
    catalog: Arc<dyn DataSource>,
}

impl ListProducts {
    pub fn new(catalog: Arc<dyn DataSource>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Handler for ListProducts {
    #[instrument(name = "list_products", skip_all)]
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        ensure_get(&request)?;
        let query: ProductQuery = validated_query(&request)?;
        let page = self.catalog.fetch(FetchRequest::Products(query.into())).await?;
        ApiResponse::json(&page)
    }
}

/// `GET /api/products/:slug`
pub struct GetProduct {
    catalog: Arc<dyn DataSource>,
}

impl GetProduct {
    pub fn new(catalog: Arc<dyn DataSource>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Handler for GetProduct {
    #[instrument(name = "get_product", skip_all)]
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        ensure_get(&request)?;
        let slug = request.param("slug")?.to_string();
        let product = self.catalog.fetch(FetchRequest::Product { slug }).await?;
        ApiResponse::json(&product)
    }
}

/// `GET /api/categories`
pub struct ListCategories {
    catalog: Arc<dyn DataSource>,
}

impl ListCategories {
    pub fn new(catalog: Arc<dyn DataSource>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Handler for ListCategories {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        ensure_get(&request)?;
        let categories = self.catalog.fetch(FetchRequest::Categories).await?;
        ApiResponse::json(&categories)
    }
}

// == Admin Authorization ==
/// Extractor admitting requests that carry `Authorization: Bearer <ADMIN_TOKEN>`.
///
/// Without a configured token every admin request is refused with 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(expected) = state.config.admin_token.as_deref() else {
            return Err(ApiError::Forbidden("admin API is disabled".to_string()));
        };

        let provided = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match provided {
            Some(token) if token == expected => Ok(AdminAuth),
            Some(_) => Err(ApiError::Forbidden("invalid admin token".to_string())),
            None => Err(ApiError::Unauthorized("missing bearer token".to_string())),
        }
    }
}

// == Admin Handlers ==
/// Handler for POST /api/admin/cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    _: AdminAuth,
    ValidatedJson(req): ValidatedJson<InvalidateRequest>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate(&req.tags).await;
    Json(InvalidateResponse {
        tags: req.tags,
        removed,
    })
}

/// Handler for POST /api/admin/cache/clear
pub async fn clear_handler(State(state): State<AppState>, _: AdminAuth) -> Json<ClearResponse> {
    let removed = state.cache.clear().await;
    Json(ClearResponse { removed })
}

/// Handler for GET /api/admin/cache/stats
pub async fn stats_handler(State(state): State<AppState>, _: AdminAuth) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for POST /api/admin/products/:slug/images
///
/// Cached product responses embed images, so a successful write drops
/// everything tagged `products` or `images`.
#[instrument(skip(state, req))]
pub async fn add_image_handler(
    State(state): State<AppState>,
    _: AdminAuth,
    Path(slug): Path<String>,
    ValidatedJson(req): ValidatedJson<AddImageRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let product = state
        .catalog
        .apply(Mutation::AddImage {
            slug,
            image: req.into(),
        })
        .await?;

    let removed = state.cache.invalidate(&[PRODUCTS_TAG, IMAGES_TAG]).await;
    info!(removed, "product image added");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
