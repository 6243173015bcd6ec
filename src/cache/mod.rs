//! Cache Module
//!
//! In-process response cache with lazy TTL expiry and tag-based
//! invalidation.

mod backend;
mod entry;
mod flight;
mod key;
mod stats;
mod store;
mod tags;
mod wrapper;


// Re-export public types
pub use backend::{MemoryStore, ResponseStore};
pub use entry::CacheEntry;
pub use flight::{FlightGuard, SingleFlight};
pub use key::{derive_key, QueryParams, MULTI_VALUE_SEPARATOR};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use tags::TagIndex;
pub use wrapper::{
    CacheOptions, CacheStatus, CachedHandler, ResponseCache, CACHE_STATUS_HEADER,
    DEFAULT_DURATION,
};
