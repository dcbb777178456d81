//! # Catalog Service
//!
//! Business logic for the catalog: the read-through cached product
//! listing and order task submission.

pub mod cache;
pub mod dto;
pub mod r#impl;
pub mod order_service;
pub mod orders;
pub mod product_service;

pub use cache::*;
pub use dto::*;
pub use order_service::*;
pub use orders::*;
pub use product_service::*;
pub use r#impl::{OrderServiceImpl, ProductServiceImpl};
