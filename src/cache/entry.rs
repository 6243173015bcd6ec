//! Cache Entry Module
//!
//! Defines a single cached response payload with its expiry instant.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A cached response.
///
/// The payload is opaque to the store; the wrapper keeps the serialized
/// status, headers and body of the miss in it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized response
    pub payload: String,
    /// First instant at which the entry is no longer served
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stored at `now` that lives for `ttl`.
    pub fn new(payload: String, now: Instant, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// An entry is valid while `now < expires_at`. Once the instant is
    /// reached the entry is expired, so a zero TTL is never served.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_valid_before_expiry() {
        let now = Instant::now();
        let entry = CacheEntry::new("{\"count\":1}".to_string(), now, Duration::from_secs(5));

        assert_eq!(entry.payload, "{\"count\":1}");
        assert!(!entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now + Duration::from_millis(4999)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new("{}".to_string(), now, Duration::from_secs(5));

        assert!(entry.is_expired_at(now + Duration::from_secs(5)));
        assert!(entry.is_expired_at(now + Duration::from_secs(6)));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let now = Instant::now();
        let entry = CacheEntry::new("{}".to_string(), now, Duration::ZERO);
        assert!(entry.is_expired_at(now));
    }
}
