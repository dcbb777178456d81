//! # Catalog REST
//!
//! HTTP surface of the catalog service: the product listing, order
//! submission, task status, health probes, and the OpenAPI document.

pub mod controllers;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
