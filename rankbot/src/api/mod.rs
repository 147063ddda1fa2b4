//! HTTP API handlers for rankbot

pub mod health;
pub mod promote;

pub use health::health_routes;
pub use promote::{promotion_routes, submit_progression};
