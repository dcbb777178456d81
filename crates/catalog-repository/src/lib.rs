//! # Catalog Repository
//!
//! Read access to the relational product source.
//!
//! ```text
//! ProductService
//!   ↓  Arc<dyn ProductRepository>
//! PgProductRepository
//!   ↓  Arc<dyn DatabasePoolInterface>
//! PostgreSQL
//! ```

pub mod pool;
pub mod postgres;
pub mod traits;

pub use pool::*;
pub use postgres::*;
pub use traits::*;
