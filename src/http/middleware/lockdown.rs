//! Lockdown middleware.
//! Runs the request pipeline before anything else touches the request.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::gateway::{Outcome, RequestContext, StageResponse};
use crate::http::request::RequestIdExt;
use crate::http::response::{blocked_response, redirect_response};
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn lockdown_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (mut parts, body) = request.into_parts();
    let signals = state.detector.detect(parts.uri.path(), parts.uri.query());
    let mut ctx = RequestContext::from_parts(&parts, state.assume_https, peer, signals);
    let outcome = state.pipeline.run(&mut ctx);

    if state.debug_log {
        tracing::debug!(
            request_id = %parts.headers.request_id(),
            method = %ctx.method,
            path = %ctx.path,
            surface = signals.label(),
            scheme = %ctx.scheme,
            host = ?ctx.host,
            outcome = ?outcome,
            "Pipeline decision"
        );
    }

    let method = ctx.method.to_string();
    match outcome {
        Outcome::Proceed => {
            parts.extensions.insert(ctx);
            next.run(Request::from_parts(parts, body)).await
        }
        Outcome::Respond {
            response: StageResponse::Blocked,
            ..
        } => {
            metrics::record_blocked();
            metrics::record_request(&method, 404, signals.label(), start_time);
            blocked_response()
        }
        Outcome::Respond {
            response: StageResponse::Redirect { location },
            ..
        } => {
            tracing::debug!(
                request_id = %parts.headers.request_id(),
                location = %location,
                "Canonical redirect"
            );
            metrics::record_redirect();
            metrics::record_request(&method, 301, signals.label(), start_time);
            redirect_response(&location)
        }
    }
}
