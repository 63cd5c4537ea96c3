//! HTTP route handlers.

pub mod booking;
pub mod health;
pub mod metrics;
