//! Data Source Contract
//!
//! The storefront never builds queries itself; read handlers ask a
//! `DataSource` for a resource and shape whatever comes back.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::ProductImage;
use crate::error::ApiError;

// == Data Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Requested row does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Backend could not answer
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            DataError::Unavailable(msg) => ApiError::Upstream(msg),
        }
    }
}

// == Product Filter ==
/// Listing parameters for products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            featured: None,
            page: 1,
            limit: 12,
        }
    }
}

// == Fetch Request ==
/// A read against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Page of products: `{ items, page, limit, total }`
    Products(ProductFilter),
    /// A single product by slug
    Product { slug: String },
    /// Every category
    Categories,
}

// == Mutation ==
/// A write against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Appends an image to a product; returns the updated product
    AddImage { slug: String, image: ProductImage },
}

// == Data Source ==
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<Value, DataError>;

    async fn apply(&self, mutation: Mutation) -> Result<Value, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_mapping() {
        let err: ApiError = DataError::NotFound("product 'x'".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "product 'x' not found"));

        let err: ApiError = DataError::Unavailable("timeout".to_string()).into();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[test]
    fn test_default_filter() {
        let filter = ProductFilter::default();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 12);
        assert!(filter.category.is_none());
    }
}
