//! API Routes
//!
//! Configures the Axum router with all storefront endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::{Method, Uri},
    routing::{any, get, post, MethodRouter},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_image_handler, clear_handler, health_handler, invalidate_handler, stats_handler, AppState,
    GetProduct, ListCategories, ListProducts, CATEGORIES_TAG, IMAGES_TAG, PRODUCTS_TAG,
};
use crate::cache::CacheOptions;
use crate::error::{ApiError, Result, ValidationIssue};
use crate::handler::{ApiRequest, Handler};
use crate::models::ProductQuery;
use crate::validation::QueryGate;

/// Mounts a `Handler` on an axum route for every method.
///
/// Route parameters, the query string and an optional JSON body are copied
/// into the `ApiRequest`.
pub fn endpoint<H, S>(handler: H) -> MethodRouter<S>
where
    H: Handler,
    S: Clone + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    any(
        move |method: Method,
              uri: Uri,
              params: Option<Path<HashMap<String, String>>>,
              body: Bytes| {
            let handler = handler.clone();
            async move {
                let mut request = ApiRequest::new(method, uri);
                if let Some(Path(params)) = params {
                    request.params = params;
                }
                if !body.is_empty() {
                    request = request.with_body(parse_body(&body)?);
                }
                handler.call(request).await
            }
        },
    )
}

fn parse_body(body: &[u8]) -> Result<serde_json::Value> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(vec![ValidationIssue::new("body", e.to_string())]))
}

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /api/products` - Product listing (cached, tag `products`)
/// - `GET /api/products/:slug` - Product detail (cached, tags `products`, `images`)
/// - `GET /api/categories` - Category list (cached, tag `categories`)
/// - `POST /api/admin/cache/invalidate` - Evict by tag
/// - `POST /api/admin/cache/clear` - Evict everything
/// - `GET /api/admin/cache/stats` - Cache statistics
/// - `POST /api/admin/products/:slug/images` - Add a product image
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let config = &state.config;
    let products = state.cache.wrap(
        ListProducts::new(state.catalog.clone()),
        CacheOptions::new()
            .duration_secs(config.products_cache_duration)
            .tags([PRODUCTS_TAG]),
    );
    let product = state.cache.wrap(
        GetProduct::new(state.catalog.clone()),
        CacheOptions::new()
            .duration_secs(config.default_cache_duration)
            .tags([PRODUCTS_TAG, IMAGES_TAG]),
    );
    let categories = state.cache.wrap(
        ListCategories::new(state.catalog.clone()),
        CacheOptions::new()
            .duration_secs(config.categories_cache_duration)
            .tags([CATEGORIES_TAG]),
    );

    let admin = Router::new()
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/cache/clear", post(clear_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/products/:slug/images", post(add_image_handler));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/products", endpoint(QueryGate::<ProductQuery, _>::new(products)))
        .route("/api/products/:slug", endpoint(product))
        .route("/api/categories", endpoint(categories))
        .nest("/api/admin", admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
