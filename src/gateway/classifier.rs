//! Headless lockdown: decides whether a request path may reach the upstream.
//!
//! API and admin-UI requests always pass. Everything else must start with an
//! allow-listed prefix or it is answered with a bare 404.

use crate::gateway::context::RequestContext;
use crate::gateway::pipeline::{Flow, Stage, StageResponse};

/// Ordered set of exact path prefixes.
#[derive(Debug, Clone)]
pub struct AllowList {
    prefixes: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Prefix match, not equality: `/wp-admin` does not match `/wp-admin/`.
    pub fn matches(&self, path: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|p| path.starts_with(p.as_str()))
            .map(String::as_str)
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new([
            "/wp-login.php",
            "/wp-admin/",
            "/wp-cron.php",
            "/xmlrpc.php",
            "/wp-includes/",
            "/wp-content/",
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Allow(AllowReason),
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowReason {
    Api,
    Admin,
    Prefix(String),
    Disabled,
}

#[derive(Debug, Clone)]
pub struct PathClassifier {
    allow: AllowList,
    enabled: bool,
}

impl PathClassifier {
    pub fn new(allow: AllowList, enabled: bool) -> Self {
        Self { allow, enabled }
    }

    pub fn classify(&self, ctx: &RequestContext) -> Classification {
        if !self.enabled {
            return Classification::Allow(AllowReason::Disabled);
        }
        if ctx.signals.api {
            return Classification::Allow(AllowReason::Api);
        }
        if ctx.signals.admin {
            return Classification::Allow(AllowReason::Admin);
        }
        match self.allow.matches(&ctx.path) {
            Some(prefix) => Classification::Allow(AllowReason::Prefix(prefix.to_string())),
            None => Classification::Block,
        }
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new(AllowList::default(), true)
    }
}

impl Stage for PathClassifier {
    fn name(&self) -> &'static str {
        "path_classifier"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Flow {
        match self.classify(ctx) {
            Classification::Allow(_) => Flow::Continue,
            Classification::Block => Flow::Respond(StageResponse::Blocked),
        }
    }
}
