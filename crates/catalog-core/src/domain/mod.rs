//! Domain model.

mod product;

pub use product::*;
