//! Headless WordPress gateway library.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::{GatewayConfig, Site};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
