//! # Catalog Core
//!
//! Core types, traits, and error definitions shared by every layer of the
//! catalog service: the product domain, typed identifiers, the unified
//! error taxonomy, and health-check abstractions.

pub mod domain;
pub mod error;
pub mod id;
pub mod result;
pub mod telemetry;
pub mod traits;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use result::*;
pub use traits::*;
