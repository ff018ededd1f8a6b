//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! process environment
//!     → site.rs (resolve WP_* / ADMIN_* / JWT_* once)
//!     → Site (immutable)
//!
//! Both are handed by reference to the pipeline and server at startup.
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Decision code never reads the environment itself

pub mod loader;
pub mod schema;
pub mod site;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CanonicalConfig, CorsConfig, ForwardingConfig, GatewayConfig, ListenerConfig, LockdownConfig,
    LogFormat, ObservabilityConfig, SecurityConfig, TimeoutConfig, UpstreamConfig,
};
pub use site::{EnvironmentType, Site, SiteConfig};
