//! Cache Key Module
//!
//! Derives deterministic cache keys from a request path and its query
//! parameters.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Separator used when a query parameter carries several values.
pub const MULTI_VALUE_SEPARATOR: &str = ",";

// == Query Params ==
/// Decoded query parameters, grouped by name.
///
/// Names are kept in a sorted map so rendering is independent of the order
/// in which parameters appeared on the wire. Values of a repeated name keep
/// their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    // == Constructor ==
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    // == Parse ==
    /// Decodes a raw `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored. Repeated names become multi-valued.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut params = Self::new();
        for (name, value) in form_urlencoded::parse(raw.as_bytes()) {
            params.append(name.into_owned(), value.into_owned());
        }
        params
    }

    // == Append ==
    /// Adds a value under `name`, keeping any values already present.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.entry(name.into()).or_default().push(value.into());
    }

    // == Get ==
    /// Returns the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    // == Canonical ==
    /// Renders the parameters as `name=value` pairs in lexicographic name
    /// order, joined by `&`. Multi-valued parameters are joined with `,`.
    ///
    /// Names and values are form-encoded again, so `&`, `=` and `,` inside
    /// a decoded value cannot be mistaken for separators.
    pub fn canonical(&self) -> String {
        self.params
            .iter()
            .map(|(name, values)| {
                let values: Vec<String> = values.iter().map(String::as_str).map(encode).collect();
                format!("{}={}", encode(name), values.join(MULTI_VALUE_SEPARATOR))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.append(name, value);
        }
        params
    }
}

fn encode(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

// == Derive Key ==
/// Computes the cache key for a request.
///
/// Any query suffix already present on `path` is dropped; the key only ever
/// carries the canonical rendering of `query`. With `include_query` off, or
/// with no parameters, the key is the bare path.
pub fn derive_key(path: &str, query: &QueryParams, include_query: bool) -> String {
    let path = strip_query(path);
    if !include_query || query.is_empty() {
        return path.to_string();
    }
    format!("{}?{}", path, query.canonical())
}

/// Returns `path` without its `?query` suffix.
fn strip_query(path: &str) -> &str {
    match path.split_once('?') {
        Some((bare, _)) => bare,
        None => path,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_parameter_order() {
        let a = QueryParams::parse("limit=10&page=2");
        let b = QueryParams::parse("page=2&limit=10");

        assert_eq!(
            derive_key("/api/products", &a, true),
            derive_key("/api/products", &b, true)
        );
        assert_eq!(derive_key("/api/products", &a, true), "/api/products?limit=10&page=2");
    }

    #[test]
    fn test_key_without_query() {
        let query = QueryParams::parse("page=2");
        assert_eq!(derive_key("/api/products", &query, false), "/api/products");
    }

    #[test]
    fn test_key_empty_query_has_no_separator() {
        assert_eq!(
            derive_key("/api/categories", &QueryParams::new(), true),
            "/api/categories"
        );
    }

    #[test]
    fn test_key_strips_existing_query_suffix() {
        let query = QueryParams::parse("b=2&a=1");
        assert_eq!(
            derive_key("/api/products?b=2&a=1", &query, true),
            "/api/products?a=1&b=2"
        );
        assert_eq!(derive_key("/api/products?b=2", &query, false), "/api/products");
    }

    #[test]
    fn test_multi_value_joined_in_order() {
        let query = QueryParams::parse("tag=mono&tag=bifacial&page=1");
        assert_eq!(query.canonical(), "page=1&tag=mono,bifacial");
    }

    #[test]
    fn test_encoded_separators_do_not_collide() {
        let encoded = QueryParams::parse("search=panel%26zzz%3D1");
        let split = QueryParams::parse("search=panel&zzz=1");

        assert_eq!(encoded.get("search"), Some("panel&zzz=1"));
        assert_ne!(
            derive_key("/api/products", &encoded, true),
            derive_key("/api/products", &split, true)
        );
        assert_eq!(encoded.canonical(), "search=panel%26zzz%3D1");
    }

    #[test]
    fn test_comma_in_value_differs_from_repeated_name() {
        let single = QueryParams::parse("tag=a%2Cb");
        let repeated = QueryParams::parse("tag=a&tag=b");
        assert_ne!(single.canonical(), repeated.canonical());
        assert_eq!(repeated.canonical(), "tag=a,b");
    }

    #[test]
    fn test_parse_decodes_form_encoding() {
        let query = QueryParams::parse("?search=solar+panel&category=off%2Dgrid");
        assert_eq!(query.get("search"), Some("solar panel"));
        assert_eq!(query.get("category"), Some("off-grid"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_from_iter() {
        let query: QueryParams = vec![("page", "2"), ("limit", "10")].into_iter().collect();
        assert_eq!(query.canonical(), "limit=10&page=2");
        assert!(query.get("missing").is_none());
    }
}
