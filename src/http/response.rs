//! Response construction and transformation.
//!
//! # Responsibilities
//! - Build the lockdown 404 and canonical redirect responses
//! - Rewrite self-referential URLs in API responses
//!
//! # Design Decisions
//! - The lockdown 404 has no body, so blocked and missing paths look the same
//! - Only uncompressed JSON is rewritten; everything else streams through

use axum::{
    body::Body,
    http::{header, response::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::gateway::{RequestContext, ResponseHostRewriter};

/// `Cache-Control` sent with lockdown responses.
pub const NO_CACHE_CONTROL: &str = "no-cache, must-revalidate, max-age=0, no-store, private";
/// `Expires` date in the past so intermediaries drop the response.
pub const EXPIRES_IN_THE_PAST: &str = "Wed, 11 Jan 1984 05:00:00 GMT";

/// Bare 404 for paths outside the headless surface.
pub fn blocked_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        [
            (header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE_CONTROL)),
            (header::EXPIRES, HeaderValue::from_static(EXPIRES_IN_THE_PAST)),
        ],
    )
        .into_response()
}

/// 301 to the canonical URL.
pub fn redirect_response(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(location = %location, "Canonical location is not a valid header value");
            blocked_response()
        }
    }
}

/// Rewrite `Link` and `Location` headers of an API response in place.
/// Returns how many URLs changed.
pub fn rewrite_headers(parts: &mut Parts, rewriter: &ResponseHostRewriter, ctx: &RequestContext) -> usize {
    let mut changed = 0;

    let links: Vec<HeaderValue> = parts.headers.get_all(header::LINK).iter().cloned().collect();
    if !links.is_empty() {
        parts.headers.remove(header::LINK);
        for value in links {
            let rewritten = value
                .to_str()
                .ok()
                .and_then(|text| rewriter.rewrite_link_header(text, ctx))
                .and_then(|text| HeaderValue::from_str(&text).ok());
            match rewritten {
                Some(new_value) => {
                    changed += 1;
                    parts.headers.append(header::LINK, new_value);
                }
                None => {
                    parts.headers.append(header::LINK, value);
                }
            }
        }
    }

    let location = parts
        .headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|text| rewriter.rewrite_if_self(text, ctx))
        .and_then(|text| HeaderValue::from_str(&text).ok());
    if let Some(value) = location {
        parts.headers.insert(header::LOCATION, value);
        changed += 1;
    }

    changed
}

/// Whether the body of this response is a candidate for URL rewriting.
pub fn is_rewritable(parts: &Parts) -> bool {
    if parts.headers.contains_key(header::CONTENT_ENCODING) {
        return false;
    }
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Declared body length, when the upstream sent one.
pub fn content_length(parts: &Parts) -> Option<usize> {
    parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Reassemble a response around a rewritten body.
pub fn with_body(mut parts: Parts, bytes: Vec<u8>) -> Response {
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::TRANSFER_ENCODING);
    Response::from_parts(parts, Body::from(bytes))
}
