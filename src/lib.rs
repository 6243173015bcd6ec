//! Storefront Cache - solar storefront API with an in-process response cache
//!
//! Read endpoints sit behind a tag-aware response cache; writes invalidate
//! the tags they affect.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handler;
pub mod models;
pub mod validation;

pub use api::{create_router, AppState};
pub use cache::{CacheOptions, ResponseCache};
pub use config::Config;
pub use error::{ApiError, Result};
pub use handler::{ApiRequest, ApiResponse, Handler};
