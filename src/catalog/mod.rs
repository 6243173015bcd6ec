//! Catalog Module
//!
//! Storefront records and the data-fetch collaborator the read handlers
//! depend on.

mod memory;
mod model;
mod source;

pub use memory::InMemoryCatalog;
pub use model::{CatalogData, Category, Product, ProductImage, Variant};
pub use source::{DataError, DataSource, FetchRequest, Mutation, ProductFilter};
