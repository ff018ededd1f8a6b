//! Site settings sourced from the environment.
//!
//! Values written in the config file win; anything left unset is read from
//! the process environment once at startup and frozen into a [`Site`].
//! Missing settings never fail startup. They fall back to defaults and show
//! up in [`Site::warnings`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gateway::context::CanonicalOrigin;

/// Placeholder used when no JWT secret is configured anywhere.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-this-secret";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    Local,
    #[default]
    Development,
    Staging,
    Production,
}

impl EnvironmentType {
    pub fn is_production(self) -> bool {
        self == EnvironmentType::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentType::Local => "local",
            EnvironmentType::Development => "development",
            EnvironmentType::Staging => "staging",
            EnvironmentType::Production => "production",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(EnvironmentType::Local),
            "development" => Ok(EnvironmentType::Development),
            "staging" => Ok(EnvironmentType::Staging),
            "production" => Ok(EnvironmentType::Production),
            _ => Err(()),
        }
    }
}

/// Site settings as written in the config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub environment_type: Option<EnvironmentType>,
    pub debug: Option<bool>,
    pub debug_log: Option<bool>,
    pub jwt_secret_key: Option<String>,
    pub jwt_cors_enable: Option<bool>,
    pub admin_origin: Option<String>,
    pub force_ssl_admin: Option<bool>,
}

/// Resolved, immutable site settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub environment: EnvironmentType,
    pub debug: bool,
    pub debug_log: bool,
    pub jwt_secret_key: String,
    pub jwt_cors_enable: bool,
    pub canonical_origin: Option<CanonicalOrigin>,
    pub force_ssl_admin: bool,
    /// Raw admin origin that failed to parse, kept for the startup warning.
    unparsed_admin_origin: Option<String>,
    unknown_environment: Option<String>,
}

impl SiteConfig {
    /// Resolve against the real process environment.
    pub fn resolve_from_env(&self) -> Site {
        self.resolve(|key| std::env::var(key).ok())
    }

    /// Resolve using `lookup` for environment variables.
    ///
    /// Empty variables count as unset.
    pub fn resolve<F>(&self, lookup: F) -> Site
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let mut unknown_environment = None;
        let environment = match self.environment_type {
            Some(e) => e,
            None => match env("WP_ENVIRONMENT_TYPE") {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    unknown_environment = Some(raw);
                    EnvironmentType::Development
                }),
                None => EnvironmentType::Development,
            },
        };
        let is_dev = !environment.is_production();

        let debug = self
            .debug
            .or_else(|| env("WP_DEBUG").and_then(|v| parse_bool(&v)))
            .unwrap_or(is_dev);
        let debug_log = self
            .debug_log
            .or_else(|| env("WP_DEBUG_LOG").and_then(|v| parse_bool(&v)))
            .unwrap_or(is_dev);

        let jwt_secret_key = self
            .jwt_secret_key
            .clone()
            .or_else(|| env("JWT_SECRET_KEY"))
            .unwrap_or_else(|| PLACEHOLDER_JWT_SECRET.to_string());
        let jwt_cors_enable = self
            .jwt_cors_enable
            .or_else(|| env("JWT_AUTH_CORS_ENABLE").and_then(|v| parse_bool(&v)))
            .unwrap_or(true);
        let force_ssl_admin = self
            .force_ssl_admin
            .or_else(|| env("FORCE_SSL_ADMIN").and_then(|v| parse_bool(&v)))
            .unwrap_or(true);

        let raw_origin = self
            .admin_origin
            .clone()
            .or_else(|| env("ADMIN_ORIGIN"))
            .or_else(|| env("ADMIN_HOST").map(|host| format!("https://{}", host)));
        let canonical_origin = raw_origin.as_deref().and_then(CanonicalOrigin::parse);
        let unparsed_admin_origin = match (&raw_origin, &canonical_origin) {
            (Some(raw), None) => Some(raw.clone()),
            _ => None,
        };

        Site {
            environment,
            debug,
            debug_log,
            jwt_secret_key,
            jwt_cors_enable,
            canonical_origin,
            force_ssl_admin,
            unparsed_admin_origin,
            unknown_environment,
        }
    }
}

impl Site {
    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret_key == PLACEHOLDER_JWT_SECRET
    }

    /// Problems worth surfacing once the logger is up.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(raw) = &self.unknown_environment {
            warnings.push(format!(
                "Unknown WP_ENVIRONMENT_TYPE {:?}, treating as development",
                raw
            ));
        }
        if self.uses_placeholder_secret() {
            warnings.push("JWT_SECRET_KEY is not set, using the placeholder secret".to_string());
        }
        match (&self.canonical_origin, &self.unparsed_admin_origin) {
            (None, Some(raw)) => warnings.push(format!(
                "Admin origin {:?} is not a valid URL, canonical redirects disabled",
                raw
            )),
            (None, None) => warnings.push(
                "Neither ADMIN_ORIGIN nor ADMIN_HOST is set, canonical redirects disabled"
                    .to_string(),
            ),
            _ => {}
        }
        warnings
    }
}

impl Default for Site {
    fn default() -> Self {
        SiteConfig::default().resolve(|_| None)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
