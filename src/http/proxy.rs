//! Forwarding to the WordPress upstream.
//!
//! Requests reaching this handler already passed the pipeline; the
//! `RequestContext` it left in the extensions drives header rewriting on
//! the way out and URL rewriting on the way back.

use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, uri::Scheme, Request, Uri},
    response::{IntoResponse, Response},
};

use futures_util::{stream, StreamExt};

use crate::gateway::RequestContext;
use crate::http::error::GatewayError;
use crate::http::request::RequestIdExt;
use crate::http::response::{content_length, is_rewritable, rewrite_headers, with_body};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::headers::{set_forwarding_headers, strip_hop_by_hop};

/// Main proxy handler.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();

    let Some(ctx) = request.extensions().get::<RequestContext>().cloned() else {
        let err = GatewayError::MissingContext;
        tracing::error!(request_id = %request_id, error = %err, "Cannot proxy request");
        return err.into_response();
    };
    let surface = ctx.signals.label();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %ctx.path,
        surface = surface,
        "Proxying request"
    );

    match forward(&state, &ctx, request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), surface, start_time);
            response
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Upstream error");
            metrics::record_request(&method, err.status().as_u16(), surface, start_time);
            err.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    ctx: &RequestContext,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let (mut parts, body) = request.into_parts();

    strip_hop_by_hop(&mut parts.headers);
    set_forwarding_headers(&mut parts.headers, ctx);
    if ctx.signals.api {
        // Identity encoding keeps API bodies rewritable.
        parts.headers.remove(header::ACCEPT_ENCODING);
    }

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    parts.uri = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(state.upstream.clone())
        .path_and_query(path_and_query)
        .build()?;

    let upstream_request = Request::from_parts(parts, body);
    let response = tokio::time::timeout(
        Duration::from_secs(state.upstream_timeout_secs),
        state.client.request(upstream_request),
    )
    .await
    .map_err(|_| GatewayError::Timeout(state.upstream_timeout_secs))??;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    let body = Body::new(body);

    if !ctx.signals.api {
        return Ok(Response::from_parts(parts, body));
    }

    let mut rewritten = rewrite_headers(&mut parts, &state.rewriter, ctx);

    let within_limit = content_length(&parts).map_or(true, |len| len <= state.max_body_size);
    if !is_rewritable(&parts) || !within_limit {
        metrics::record_rewrites(rewritten);
        return Ok(Response::from_parts(parts, body));
    }

    let bytes = match buffer_up_to(body, state.max_body_size).await? {
        Buffered::Complete(bytes) => bytes,
        Buffered::Overflow(body) => {
            tracing::debug!(
                limit = state.max_body_size,
                "API response exceeds rewrite limit; streaming unmodified"
            );
            metrics::record_rewrites(rewritten);
            return Ok(Response::from_parts(parts, body));
        }
    };
    let response = match state.rewriter.rewrite_body(&bytes, ctx) {
        Some((new_body, changed)) => {
            rewritten += changed;
            with_body(parts, new_body)
        }
        None => Response::from_parts(parts, Body::from(bytes)),
    };

    metrics::record_rewrites(rewritten);
    Ok(response)
}

enum Buffered {
    Complete(Bytes),
    /// Limit exceeded: the chunks read so far followed by the unread rest.
    Overflow(Body),
}

/// Collect `body` while it fits in `limit` bytes. Past the limit nothing is
/// lost; the body is handed back whole for streaming.
async fn buffer_up_to(body: Body, limit: usize) -> Result<Buffered, GatewayError> {
    let mut rest = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = rest.next().await {
        let chunk = chunk.map_err(GatewayError::Body)?;
        if buf.len() + chunk.len() > limit {
            let head = stream::iter([Ok(Bytes::from(buf)), Ok(chunk)]);
            return Ok(Buffered::Overflow(Body::from_stream(head.chain(rest))));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(Buffered::Complete(Bytes::from(buf)))
}
