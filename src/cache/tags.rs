//! Tag Index Module
//!
//! Maps invalidation tags to the cache keys stored under them.

use std::collections::{HashMap, HashSet};

// == Tag Index ==
/// Tracks which cache keys were stored while a tag was declared.
///
/// The index only answers "which keys go when this tag is invalidated". It
/// may still name keys whose entries have expired; expiry is decided by the
/// entry store alone.
#[derive(Debug, Default)]
pub struct TagIndex {
    keys_by_tag: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Records `key` under each of `tags`.
    pub fn register<S: AsRef<str>>(&mut self, key: &str, tags: &[S]) {
        for tag in tags {
            self.keys_by_tag
                .entry(tag.as_ref().to_string())
                .or_default()
                .insert(key.to_string());
        }
    }

    // == Take ==
    /// Removes `tag` and returns the keys that were registered under it.
    ///
    /// Unknown tags yield an empty set.
    pub fn take(&mut self, tag: &str) -> HashSet<String> {
        self.keys_by_tag.remove(tag).unwrap_or_default()
    }

    /// Returns the keys registered under `tag` without removing them.
    pub fn keys(&self, tag: &str) -> impl Iterator<Item = &str> {
        self.keys_by_tag
            .get(tag)
            .into_iter()
            .flat_map(|keys| keys.iter().map(String::as_str))
    }

    pub fn clear(&mut self) {
        self.keys_by_tag.clear();
    }

    /// Number of tags with at least one registered key.
    pub fn len(&self) -> usize {
        self.keys_by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys_by_tag.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_take() {
        let mut index = TagIndex::new();
        index.register("/api/products", &["products"]);
        index.register("/api/products/panel-400w", &["products", "images"]);

        let keys = index.take("products");
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("/api/products"));
        assert!(keys.contains("/api/products/panel-400w"));

        // Taking empties the tag
        assert!(index.take("products").is_empty());
        assert_eq!(index.keys("images").count(), 1);
    }

    #[test]
    fn test_take_unknown_tag() {
        let mut index = TagIndex::new();
        assert!(index.take("orders").is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_register_no_tags() {
        let mut index = TagIndex::new();
        index.register::<&str>("/api/categories", &[]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicate_registration_is_single_key() {
        let mut index = TagIndex::new();
        index.register("/api/products", &["products"]);
        index.register("/api/products", &["products"]);
        assert_eq!(index.keys("products").count(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut index = TagIndex::new();
        index.register("/a", &["x", "y"]);
        index.clear();
        assert!(index.is_empty());
    }
}
