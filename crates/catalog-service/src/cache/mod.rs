//! Caching infrastructure for the service layer.
//!
//! A cache abstraction over raw JSON strings with a Redis implementation
//! and an in-process one for development and tests.

mod cache_interface;
pub mod cache_keys;
mod memory_cache;
mod redis_cache;

pub use cache_interface::{CacheExt, CacheInterface};
pub use memory_cache::InMemoryCache;
pub use redis_cache::{create_pool, RedisCacheService};
