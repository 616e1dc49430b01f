//! Axum middleware: request/device identification and store-backed rate
//! limiting (spec.md §5, §6).
//!
//! # Middleware order
//! Request context (device/request id) must run before rate limiting,
//! since the limiter keys on the device id it attaches.

pub mod rate_limit;
pub mod request_context;

pub use rate_limit::rate_limit_middleware;
pub use request_context::{request_context_middleware, DeviceId, RequestId};
