//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → middleware/lockdown.rs (gateway pipeline: 404 / 301 / proceed)
//!     → proxy.rs (forward to upstream)
//!     → response.rs (rewrite self URLs for API responses)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use error::GatewayError;
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
