//! Background jobs for orders.

mod process_order;

pub use process_order::ProcessOrderJob;
