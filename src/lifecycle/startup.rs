//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Resolve site settings from the environment
//! - Surface configuration warnings once logging is up
//!
//! # Design Decisions
//! - Fail fast: a broken config file is fatal
//! - Missing environment settings are not: they default and warn

use std::path::Path;

use crate::config::{load_config, ConfigError, GatewayConfig, Site};

/// Everything the server needs, resolved once.
#[derive(Debug, Clone)]
pub struct Startup {
    pub config: GatewayConfig,
    pub site: Site,
}

impl Startup {
    /// Load the config file (or defaults) and resolve the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => load_config(path)?,
            None => GatewayConfig::default(),
        };
        let site = config.site.resolve_from_env();
        Ok(Self { config, site })
    }

    /// Log what was resolved and anything suspicious about it.
    pub fn log_summary(&self) {
        tracing::info!(
            bind_address = %self.config.listener.bind_address,
            upstream = %self.config.upstream.address,
            environment = %self.site.environment,
            debug = self.site.debug,
            lockdown = self.config.lockdown.enabled,
            canonical_origin = ?self.site.canonical_origin.as_ref().map(ToString::to_string),
            trusted_proxies = self.config.forwarding.trusted_proxies.len(),
            "Configuration loaded"
        );

        for warning in self.site.warnings() {
            tracing::warn!("{}", warning);
        }
        if self.site.environment.is_production() && self.site.uses_placeholder_secret() {
            tracing::error!("Running in production with the placeholder JWT secret");
        }
        if self.config.forwarding.trusted_proxies.is_empty() {
            tracing::debug!("No trusted proxies configured; forwarded headers are trusted from any peer");
        }
    }
}
