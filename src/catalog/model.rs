//! Catalog records served by the storefront.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A purchasable configuration of a product, e.g. a panel frame colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub sku: String,
    pub name: String,
    pub price_cents: u64,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Category slug
    pub category: String,
    pub price_cents: u64,
    pub currency: String,
    /// Rated output in watts, where it applies
    #[serde(default)]
    pub wattage: Option<u32>,
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl Product {
    /// Case-insensitive match on name and description.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Seed document: the whole catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}
