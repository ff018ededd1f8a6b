//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (browser cross-origin policy for the REST API)
//!     → headers.rs (strip hop-by-hop, set X-Forwarded-*)
//!     → Forward to upstream
//! ```
//!
//! # Design Decisions
//! - Forwarded headers are rebuilt, never passed through blindly
//! - CORS follows the JWT auth plugin's header set

pub mod cors;
pub mod headers;
