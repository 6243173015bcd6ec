//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache lifetime in seconds for routes without their own setting,
    /// currently the product detail route
    pub default_cache_duration: u64,
    /// Cache lifetime in seconds for product listings
    pub products_cache_duration: u64,
    /// Cache lifetime in seconds for the category list
    pub categories_cache_duration: u64,
    /// Bearer token for the admin API; the admin API is closed when unset
    pub admin_token: Option<String>,
    /// JSON catalog seed; the bundled catalog is used when unset
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_DEFAULT_DURATION` - Default cache lifetime in seconds (default: 60)
    /// - `PRODUCTS_CACHE_DURATION` - Product cache lifetime in seconds (default: 60)
    /// - `CATEGORIES_CACHE_DURATION` - Category cache lifetime in seconds (default: 300)
    /// - `ADMIN_TOKEN` - Admin bearer token (default: unset)
    /// - `CATALOG_PATH` - Catalog seed file (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            default_cache_duration: parse_var("CACHE_DEFAULT_DURATION")
                .unwrap_or(defaults.default_cache_duration),
            products_cache_duration: parse_var("PRODUCTS_CACHE_DURATION")
                .unwrap_or(defaults.products_cache_duration),
            categories_cache_duration: parse_var("CATEGORIES_CACHE_DURATION")
                .unwrap_or(defaults.categories_cache_duration),
            admin_token: non_empty_var("ADMIN_TOKEN"),
            catalog_path: non_empty_var("CATALOG_PATH").map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_cache_duration: 60,
            products_cache_duration: 60,
            categories_cache_duration: 300,
            admin_token: None,
            catalog_path: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
