//! # Catalog Resilience
//!
//! Upper bounds on calls to the cache, the relational source, and the
//! task broker. Nothing here retries.

pub mod timeout;

pub use timeout::*;
