//! # Catalog Server Library
//!
//! Wiring shared by the `catalog-server` and `catalog-worker` binaries:
//! collaborator construction and startup utilities.

pub mod di;
pub mod startup;
