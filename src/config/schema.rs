//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::site::SiteConfig;

/// Root configuration for the headless gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, transport security).
    pub listener: ListenerConfig,

    /// The WordPress upstream every surviving request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Headless lockdown (path classification).
    pub lockdown: LockdownConfig,

    /// Reverse-proxy header trust.
    pub forwarding: ForwardingConfig,

    /// Canonical redirect behaviour for the admin surface.
    pub canonical: CanonicalConfig,

    /// CORS settings for the REST API.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Site-level settings. Values set here take precedence over the
    /// environment; anything left unset is filled in by `SiteConfig::resolve`.
    pub site: SiteConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Treat every inbound connection as TLS.
    ///
    /// Set when the listener only ever receives traffic through a
    /// TLS-terminating hop that does not send `X-Forwarded-Proto`.
    pub assume_https: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            assume_https: false,
        }
    }
}

/// Upstream (WordPress) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:9000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Headless lockdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LockdownConfig {
    /// Enable the path classifier. When disabled every path is allowed.
    pub enabled: bool,

    /// Path prefixes that stay reachable in headless mode.
    pub allow_prefixes: Vec<String>,

    /// REST API root, used both for surface detection and URL rewriting.
    pub api_root: String,

    /// Prefix of the admin UI.
    pub admin_prefix: String,
}

impl Default for LockdownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_prefixes: vec![
                "/wp-login.php".to_string(),
                "/wp-admin/".to_string(),
                "/wp-cron.php".to_string(),
                "/xmlrpc.php".to_string(),
                "/wp-includes/".to_string(),
                "/wp-content/".to_string(),
            ],
            api_root: "/wp-json/".to_string(),
            admin_prefix: "/wp-admin/".to_string(),
        }
    }
}

/// Forwarded header trust.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Networks allowed to set `X-Forwarded-*` headers (CIDR notation).
    /// Empty trusts every peer.
    pub trusted_proxies: Vec<String>,
}

/// Canonical redirect configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CanonicalConfig {
    /// Redirect admin-surface requests onto the canonical admin origin.
    pub enabled: bool,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Empty mirrors the request origin.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_secs: 600,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Time the upstream gets to send response headers. Must stay below
    /// `request_secs`.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            upstream_secs: 25,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Largest API response body buffered for URL rewriting, in bytes.
    /// Larger bodies are streamed through untouched.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            address = "10.0.0.5:80"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.address, "10.0.0.5:80");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.lockdown.enabled);
        assert_eq!(config.lockdown.api_root, "/wp-json/");
        assert_eq!(config.lockdown.allow_prefixes.len(), 6);
        assert!(config.forwarding.trusted_proxies.is_empty());
    }

    #[test]
    fn test_full_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9443"
            assume_https = true

            [lockdown]
            allow_prefixes = ["/wp-admin/"]

            [forwarding]
            trusted_proxies = ["10.0.0.0/8"]

            [observability]
            log_format = "json"

            [site]
            environment_type = "production"
            admin_origin = "https://admin.example.com"
            "#,
        )
        .unwrap();

        assert!(config.listener.assume_https);
        assert_eq!(config.lockdown.allow_prefixes, vec!["/wp-admin/".to_string()]);
        assert_eq!(config.forwarding.trusted_proxies, vec!["10.0.0.0/8".to_string()]);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(
            config.site.admin_origin.as_deref(),
            Some("https://admin.example.com")
        );
    }
}
