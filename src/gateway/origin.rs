//! Origin trust normalization.
//!
//! # Responsibilities
//! - Decide whether the peer may set `X-Forwarded-*`
//! - Rewrite the perceived scheme, host and port from forwarded headers
//!
//! # Design Decisions
//! - An empty trusted list trusts every peer (plain reverse-proxy setup)
//! - Only the exact value `https` flips the scheme to secure
//! - Forwarded ports are copied verbatim; nothing here validates them
//! - A forwarded host replaces the transport port along with the host

use std::net::IpAddr;

use ipnet::IpNet;

use crate::gateway::context::{split_port, ForwardedHeaders, RequestContext, Scheme};
use crate::gateway::pipeline::{Flow, Stage};

/// Parse `10.0.0.0/8` or a bare address into a network.
pub fn parse_network(raw: &str) -> Option<IpNet> {
    let raw = raw.trim();
    if let Ok(net) = raw.parse::<IpNet>() {
        return Some(net);
    }
    raw.parse::<IpAddr>().ok().map(IpNet::from)
}

/// Peers allowed to describe the original client origin.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies {
    networks: Vec<IpNet>,
}

impl TrustedProxies {
    /// Trust every peer.
    pub fn any() -> Self {
        Self::default()
    }

    /// Build from config entries, skipping anything that does not parse.
    /// Validation rejects such entries before we get here.
    pub fn from_entries(entries: &[String]) -> Self {
        Self {
            networks: entries.iter().filter_map(|e| parse_network(e)).collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn trusts(&self, peer: Option<IpAddr>) -> bool {
        if self.is_open() {
            return true;
        }
        match peer {
            Some(ip) => self.networks.iter().any(|net| net.contains(&ip)),
            None => false,
        }
    }
}

/// Applies forwarded headers to the request context.
#[derive(Debug, Clone, Default)]
pub struct OriginTrustNormalizer {
    trusted: TrustedProxies,
}

impl OriginTrustNormalizer {
    pub fn new(trusted: TrustedProxies) -> Self {
        Self { trusted }
    }

    pub fn normalize(&self, ctx: &mut RequestContext) {
        if !self.trusted.trusts(ctx.peer) {
            if !ctx.forwarded.is_empty() {
                tracing::debug!(peer = ?ctx.peer, "Ignoring forwarded headers from untrusted peer");
            }
            ctx.forwarded = ForwardedHeaders::default();
            return;
        }

        if let Some(proto) = &ctx.forwarded.proto {
            ctx.scheme = if proto == "https" { Scheme::Https } else { Scheme::Http };
        }
        if let Some(host) = &ctx.forwarded.host {
            // The transport port belongs to the replaced host.
            ctx.port = split_port(host).map(|(_, p)| p.to_string());
            ctx.host = Some(host.clone());
        }
        if let Some(port) = &ctx.forwarded.port {
            ctx.port = Some(port.clone());
        }
    }
}

impl Stage for OriginTrustNormalizer {
    fn name(&self) -> &'static str {
        "origin_trust"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Flow {
        self.normalize(ctx);
        Flow::Continue
    }
}
