//! Ordered request pipeline.
//!
//! # Ordering contract
//! ```text
//! 1. origin_trust          rewrite scheme/host/port from forwarded headers
//! 2. path_classifier       404 anything outside the headless surface
//! 3. canonical_suppressor  turn canonicalization off for API requests
//! 4. canonical_redirect    301 admin page loads onto the canonical origin
//! ```
//! Stages run in this order on every request. The first stage that answers
//! ends the run; later stages never see the request.

use std::fmt;

use crate::config::{GatewayConfig, Site};
use crate::gateway::canonical::{CanonicalRedirect, CanonicalRedirectSuppressor};
use crate::gateway::classifier::{AllowList, PathClassifier};
use crate::gateway::context::RequestContext;
use crate::gateway::origin::{OriginTrustNormalizer, TrustedProxies};

/// Response a stage asks for instead of continuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResponse {
    /// Headless lockdown: bare, uncacheable 404.
    Blocked,
    /// Permanent redirect to the canonical URL.
    Redirect { location: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Respond(StageResponse),
}

/// One step of the pipeline. Stages are synchronous and keep no
/// per-request state of their own.
pub trait Stage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;
    fn apply(&self, ctx: &mut RequestContext) -> Flow;
}

/// Result of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Proceed,
    Respond {
        stage: &'static str,
        response: StageResponse,
    },
}

#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Build the standard stage list from configuration.
    pub fn from_config(config: &GatewayConfig, site: &Site) -> Self {
        let lockdown = &config.lockdown;
        let admin_prefixes = vec![lockdown.admin_prefix.clone(), "/wp-login.php".to_string()];

        Self::new(vec![
            Box::new(OriginTrustNormalizer::new(TrustedProxies::from_entries(
                &config.forwarding.trusted_proxies,
            ))),
            Box::new(PathClassifier::new(
                AllowList::new(lockdown.allow_prefixes.iter().cloned()),
                lockdown.enabled,
            )),
            Box::new(CanonicalRedirectSuppressor),
            Box::new(CanonicalRedirect::new(
                site.canonical_origin.clone(),
                admin_prefixes,
                site.force_ssl_admin,
                config.canonical.enabled,
            )),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, ctx: &mut RequestContext) -> Outcome {
        for stage in &self.stages {
            if let Flow::Respond(response) = stage.apply(ctx) {
                return Outcome::Respond {
                    stage: stage.name(),
                    response,
                };
            }
        }
        Outcome::Proceed
    }
}
