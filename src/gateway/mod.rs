//! Request classification and rewriting.
//!
//! # Data Flow
//! ```text
//! Inbound request parts
//!     → surface.rs (API / admin signals)
//!     → context.rs (RequestContext, transport view)
//!     → pipeline.rs
//!         → origin.rs (forwarded header trust)
//!         → classifier.rs (headless lockdown)
//!         → canonical.rs (suppressor, then canonical redirect)
//!     → Proceed | Blocked | Redirect
//!
//! Upstream response (API requests only)
//!     → rewriter.rs (self URLs onto the inbound host)
//! ```
//!
//! # Design Decisions
//! - Everything here is pure and synchronous; no I/O, no shared mutable state
//! - Configuration is passed in at construction, never read from the environment
//! - Stage order is explicit in `Pipeline::from_config`

pub mod canonical;
pub mod classifier;
pub mod context;
pub mod origin;
pub mod pipeline;
pub mod rewriter;
pub mod surface;

pub use classifier::{AllowList, Classification, PathClassifier};
pub use context::{CanonicalOrigin, RequestContext, Scheme};
pub use pipeline::{Outcome, Pipeline, Stage, StageResponse};
pub use rewriter::ResponseHostRewriter;
pub use surface::{SurfaceDetector, SurfaceSignals};
