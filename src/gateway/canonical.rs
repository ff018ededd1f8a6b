//! Canonical redirects for the admin surface, and their suppression for API
//! requests.
//!
//! The suppressor must sit before [`CanonicalRedirect`] in the pipeline;
//! otherwise REST clients bounce between hosts.

use axum::http::Method;

use crate::gateway::context::{CanonicalOrigin, RequestContext, Scheme};
use crate::gateway::pipeline::{Flow, Stage, StageResponse};

/// Turns canonicalization off for API-classified requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalRedirectSuppressor;

impl Stage for CanonicalRedirectSuppressor {
    fn name(&self) -> &'static str {
        "canonical_suppressor"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Flow {
        if ctx.signals.api {
            ctx.canonical_redirect = false;
        }
        Flow::Continue
    }
}

/// Sends admin-surface page loads to the canonical admin origin.
#[derive(Debug, Clone)]
pub struct CanonicalRedirect {
    origin: Option<CanonicalOrigin>,
    admin_prefixes: Vec<String>,
    force_ssl_admin: bool,
    enabled: bool,
}

impl CanonicalRedirect {
    pub fn new(
        origin: Option<CanonicalOrigin>,
        admin_prefixes: Vec<String>,
        force_ssl_admin: bool,
        enabled: bool,
    ) -> Self {
        Self {
            origin,
            admin_prefixes,
            force_ssl_admin,
            enabled,
        }
    }

    /// Target URL when `ctx` should be redirected.
    pub fn target(&self, ctx: &RequestContext) -> Option<String> {
        if !self.enabled || !ctx.canonical_redirect {
            return None;
        }
        let origin = self.origin.as_ref()?;
        if ctx.method != Method::GET && ctx.method != Method::HEAD {
            return None;
        }
        if !self.admin_prefixes.iter().any(|p| ctx.path.starts_with(p.as_str())) {
            return None;
        }

        let host_matches = ctx.authority().is_some_and(|a| a == origin.authority());
        let insecure = self.force_ssl_admin && ctx.scheme != Scheme::Https;
        if host_matches && !insecure {
            return None;
        }

        Some(format!("{}{}", origin, ctx.path_and_query()))
    }
}

impl Stage for CanonicalRedirect {
    fn name(&self) -> &'static str {
        "canonical_redirect"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Flow {
        match self.target(ctx) {
            Some(location) => Flow::Respond(StageResponse::Redirect { location }),
            None => Flow::Continue,
        }
    }
}
