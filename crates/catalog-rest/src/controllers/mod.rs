//! REST API controllers.

pub mod health_controller;
pub mod order_controller;
pub mod product_controller;
pub mod root_controller;
