//! API Module
//!
//! HTTP handlers and routing for the storefront REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /api/products`, `GET /api/products/:slug`, `GET /api/categories` -
//!   Cached catalog reads
//! - `/api/admin/...` - Cache invalidation, statistics and catalog writes

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, endpoint};
