//! Header manipulation between client and upstream.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Append the peer to X-Forwarded-For
//! - Replace X-Forwarded-Proto/Host/Port with the normalized view
//!
//! # Design Decisions
//! - The upstream sees the origin the pipeline settled on, so spoofed
//!   forwarded headers from untrusted peers never reach it

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::gateway::context::{X_FORWARDED_HOST, X_FORWARDED_PORT, X_FORWARDED_PROTO};
use crate::gateway::RequestContext;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Hop-by-hop headers that must never be forwarded.
const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(name) || name.as_str() == "keep-alive"
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Describe the client-facing origin to the upstream.
pub fn set_forwarding_headers(headers: &mut HeaderMap, ctx: &RequestContext) {
    if let Some(peer) = ctx.peer {
        let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.trim().is_empty() => format!("{}, {}", existing, peer),
            _ => peer.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    headers.insert(
        X_FORWARDED_PROTO,
        HeaderValue::from_static(ctx.scheme.as_str()),
    );
    replace_or_remove(headers, X_FORWARDED_HOST, ctx.host.as_deref());
    replace_or_remove(headers, X_FORWARDED_PORT, ctx.port.as_deref());
}

fn replace_or_remove(headers: &mut HeaderMap, name: &'static str, value: Option<&str>) {
    match value.and_then(|v| HeaderValue::from_str(v).ok()) {
        Some(v) => {
            headers.insert(name, v);
        }
        None => {
            headers.remove(name);
        }
    }
}
