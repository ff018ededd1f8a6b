//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, path prefixes and CIDR lists
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::gateway::origin::parse_network;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("upstream.address {0:?} is not a host:port authority")]
    UpstreamAddress(String),

    #[error("lockdown.api_root {0:?} must start and end with '/'")]
    ApiRoot(String),

    #[error("lockdown.admin_prefix {0:?} must start with '/'")]
    AdminPrefix(String),

    #[error("lockdown.allow_prefixes entry {0:?} must start with '/'")]
    AllowPrefix(String),

    #[error("forwarding.trusted_proxies entry {0:?} is not an IP address or network")]
    TrustedProxy(String),

    #[error("timeouts.{0} must be greater than zero")]
    Timeout(&'static str),

    #[error("timeouts.upstream_secs ({upstream}) must be less than timeouts.request_secs ({request})")]
    UpstreamTimeout { upstream: u64, request: u64 },

    #[error("security.max_body_size must be greater than zero")]
    MaxBodySize,
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if Authority::from_str(&config.upstream.address).is_err() {
        errors.push(ValidationError::UpstreamAddress(config.upstream.address.clone()));
    }

    let lockdown = &config.lockdown;
    if lockdown.api_root.len() < 2
        || !lockdown.api_root.starts_with('/')
        || !lockdown.api_root.ends_with('/')
    {
        errors.push(ValidationError::ApiRoot(lockdown.api_root.clone()));
    }
    if !lockdown.admin_prefix.starts_with('/') {
        errors.push(ValidationError::AdminPrefix(lockdown.admin_prefix.clone()));
    }
    for prefix in &lockdown.allow_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::AllowPrefix(prefix.clone()));
        }
    }

    for entry in &config.forwarding.trusted_proxies {
        if parse_network(entry).is_none() {
            errors.push(ValidationError::TrustedProxy(entry.clone()));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Timeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Timeout("request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Timeout("upstream_secs"));
    } else if config.timeouts.upstream_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::UpstreamTimeout {
            upstream: config.timeouts.upstream_secs,
            request: config.timeouts.request_secs,
        });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::MaxBodySize);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.address = "http://wordpress/".into();
        config.lockdown.admin_prefix = "wp-admin/".into();
        config.lockdown.allow_prefixes.push("wp-content/".into());
        config.forwarding.trusted_proxies = vec!["10.0.0.0/8".into(), "proxy.local".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::UpstreamAddress("http://wordpress/".into()),
                ValidationError::AdminPrefix("wp-admin/".into()),
                ValidationError::AllowPrefix("wp-content/".into()),
                ValidationError::TrustedProxy("proxy.local".into()),
            ]
        );
    }

    #[test]
    fn test_hostname_upstream_is_accepted() {
        let mut config = GatewayConfig::default();
        config.upstream.address = "wordpress:80".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_api_root_shape() {
        let mut config = GatewayConfig::default();
        for bad in ["/", "/wp-json", "wp-json/"] {
            config.lockdown.api_root = bad.into();
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::ApiRoot(bad.into())])
            );
        }
    }

    #[test]
    fn test_upstream_timeout_must_undercut_request_timeout() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 10;
        config.timeouts.upstream_secs = 10;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::UpstreamTimeout {
                upstream: 10,
                request: 10
            }])
        );

        config.timeouts.upstream_secs = 0;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::Timeout("upstream_secs")])
        );
    }
}
