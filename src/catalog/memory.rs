//! In-memory Catalog
//!
//! `DataSource` backed by a seed document held in process memory.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::catalog::{
    CatalogData, DataError, DataSource, FetchRequest, Mutation, ProductFilter,
};

/// Catalog shipped with the binary.
const BUILTIN_SEED: &str = include_str!("../../data/catalog.json");

// == In-memory Catalog ==
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    data: RwLock<CatalogData>,
}

impl InMemoryCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Catalog built from the bundled seed.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(serde_json::from_str(BUILTIN_SEED)?))
    }

    /// Catalog loaded from a JSON seed file.
    pub async fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }

    fn list_products(data: &CatalogData, filter: &ProductFilter) -> Result<Value, DataError> {
        let matching: Vec<_> = data
            .products
            .iter()
            .filter(|p| filter.category.as_ref().map_or(true, |c| &p.category == c))
            .filter(|p| filter.featured.map_or(true, |f| p.featured == f))
            .filter(|p| filter.search.as_ref().map_or(true, |s| p.matches(s)))
            .collect();

        let limit = filter.limit.max(1) as usize;
        let offset = (filter.page.max(1) as usize - 1).saturating_mul(limit);
        let items: Vec<_> = matching.iter().skip(offset).take(limit).collect();

        to_json(&ProductPage {
            items,
            page: filter.page,
            limit: filter.limit,
            total: matching.len(),
        })
    }
}

#[derive(Serialize)]
struct ProductPage<T> {
    items: Vec<T>,
    page: u32,
    limit: u32,
    total: usize,
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, DataError> {
    serde_json::to_value(value).map_err(|e| DataError::Unavailable(e.to_string()))
}

#[async_trait]
impl DataSource for InMemoryCatalog {
    async fn fetch(&self, request: FetchRequest) -> Result<Value, DataError> {
        debug!(?request, "catalog fetch");
        let data = self.data.read().await;

        let value = match request {
            FetchRequest::Products(filter) => Self::list_products(&data, &filter)?,
            FetchRequest::Product { slug } => {
                let product = data
                    .products
                    .iter()
                    .find(|p| p.slug == slug)
                    .ok_or_else(|| DataError::NotFound(format!("product '{}'", slug)))?;
                to_json(product)?
            }
            FetchRequest::Categories => to_json(&data.categories)?,
        };
        Ok(value)
    }

    async fn apply(&self, mutation: Mutation) -> Result<Value, DataError> {
        debug!(?mutation, "catalog mutation");
        let mut data = self.data.write().await;

        match mutation {
            Mutation::AddImage { slug, image } => {
                let product = data
                    .products
                    .iter_mut()
                    .find(|p| p.slug == slug)
                    .ok_or_else(|| DataError::NotFound(format!("product '{}'", slug)))?;
                product.images.push(image);
                product.images.sort_by_key(|i| i.position);
                to_json(product)
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductImage;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::builtin().unwrap()
    }

    #[test]
    fn test_builtin_seed_parses() {
        let catalog = catalog();
        let data = catalog.data.try_read().unwrap();
        assert!(!data.categories.is_empty());
        assert!(!data.products.is_empty());
        for product in &data.products {
            assert!(
                data.categories.iter().any(|c| c.slug == product.category),
                "product {} has unknown category {}",
                product.slug,
                product.category
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_products_paginates() {
        let catalog = catalog();
        let filter = ProductFilter {
            page: 1,
            limit: 2,
            ..ProductFilter::default()
        };
        let page = catalog.fetch(FetchRequest::Products(filter)).await.unwrap();

        assert_eq!(page["items"].as_array().unwrap().len(), 2);
        assert_eq!(page["limit"], 2);
        assert!(page["total"].as_u64().unwrap() > 2);
    }

    #[tokio::test]
    async fn test_fetch_products_page_past_end_is_empty() {
        let catalog = catalog();
        let filter = ProductFilter {
            page: 100,
            ..ProductFilter::default()
        };
        let page = catalog.fetch(FetchRequest::Products(filter)).await.unwrap();
        assert!(page["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_products_by_category_and_search() {
        let catalog = catalog();
        let filter = ProductFilter {
            category: Some("solar-panels".to_string()),
            ..ProductFilter::default()
        };
        let page = catalog.fetch(FetchRequest::Products(filter)).await.unwrap();
        for item in page["items"].as_array().unwrap() {
            assert_eq!(item["category"], "solar-panels");
        }

        let filter = ProductFilter {
            search: Some("LITHIUM".to_string()),
            ..ProductFilter::default()
        };
        let page = catalog.fetch(FetchRequest::Products(filter)).await.unwrap();
        assert!(page["total"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_fetch_missing_product() {
        let err = catalog()
            .fetch(FetchRequest::Product {
                slug: "does-not-exist".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_image_keeps_position_order() {
        let catalog = catalog();
        let image = ProductImage {
            url: "https://cdn.example.com/panel-front.jpg".to_string(),
            alt: "Front".to_string(),
            position: 0,
        };
        let product = catalog
            .apply(Mutation::AddImage {
                slug: "mono-panel-400w".to_string(),
                image,
            })
            .await
            .unwrap();

        assert_eq!(
            product["images"][0]["url"],
            "https://cdn.example.com/panel-front.jpg"
        );

        let fetched = catalog
            .fetch(FetchRequest::Product {
                slug: "mono-panel-400w".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(fetched["images"], product["images"]);
    }
}
