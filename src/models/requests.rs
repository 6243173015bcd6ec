//! Request schemas for the storefront API
//!
//! Each schema is deserialized and then checked by the validation gate.

use serde::Deserialize;

use crate::catalog::{ProductFilter, ProductImage};
use crate::error::ValidationIssue;
use crate::validation::{Issues, Validate};

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Longest accepted cache tag.
pub const MAX_TAG_LENGTH: usize = 64;

/// Query for `GET /api/products`
#[derive(Debug, Clone, Deserialize)]
pub struct ProductQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    12
}

impl Validate for ProductQuery {
    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Issues::new();
        issues.range("page", self.page, 1, u32::MAX);
        issues.range("limit", self.limit, 1, MAX_PAGE_LIMIT);
        if let Some(category) = &self.category {
            issues.slug("category", category);
        }
        if let Some(search) = &self.search {
            issues.max_len("search", search, 100);
        }
        issues.into_vec()
    }
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            category: query.category,
            search: query.search.filter(|s| !s.trim().is_empty()),
            featured: query.featured,
            page: query.page,
            limit: query.limit,
        }
    }
}

/// Body for `POST /api/admin/cache/invalidate`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub tags: Vec<String>,
}

impl Validate for InvalidateRequest {
    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Issues::new();
        if self.tags.is_empty() {
            issues.push("tags", "at least one tag is required");
        }
        for (i, tag) in self.tags.iter().enumerate() {
            let valid = !tag.is_empty()
                && tag.len() <= MAX_TAG_LENGTH
                && tag
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "-_:".contains(c));
            if !valid {
                issues.push(
                    &format!("tags[{}]", i),
                    format!(
                        "must be 1 to {} characters of a-z, 0-9, '-', '_' or ':'",
                        MAX_TAG_LENGTH
                    ),
                );
            }
        }
        issues.into_vec()
    }
}

/// Body for `POST /api/admin/products/:slug/images`
#[derive(Debug, Clone, Deserialize)]
pub struct AddImageRequest {
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub position: u32,
}

impl Validate for AddImageRequest {
    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Issues::new();
        match url::Url::parse(&self.url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => issues.push("url", "must be an absolute http or https URL"),
        }
        issues.max_len("url", &self.url, 2048);
        issues.max_len("alt", &self.alt, 200);
        issues.into_vec()
    }
}

impl From<AddImageRequest> for ProductImage {
    fn from(req: AddImageRequest) -> Self {
        Self {
            url: req.url,
            alt: req.alt,
            position: req.position,
        }
    }
}
