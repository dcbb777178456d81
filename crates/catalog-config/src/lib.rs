//! # Catalog Config
//!
//! Configuration management for the catalog service.
//! Supports layered configuration from files, prefixed environment
//! variables, and the flat `DB_*` / `REDIS_HOST` variables used by the
//! container deployment.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
