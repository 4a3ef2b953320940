//! HTTP APIs: the public catalogue API and the internal newsroom API.

pub mod app;
pub mod context;
pub mod middleware;
