//! Errors on the forwarding path and their client-facing status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not answer within {0} seconds")]
    Timeout(u64),

    #[error("failed to read upstream response body: {0}")]
    Body(#[source] axum::Error),

    #[error("could not build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("request context missing; lockdown middleware not installed")]
    MissingContext,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Upstream(_) | GatewayError::Body(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Request(_) | GatewayError::MissingContext => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = match self {
            GatewayError::Upstream(_) => "Upstream request failed",
            GatewayError::Timeout(_) => "Upstream timed out",
            GatewayError::Body(_) => "Upstream response could not be read",
            GatewayError::Request(_) | GatewayError::MissingContext => "Internal gateway error",
        };
        (self.status(), message).into_response()
    }
}
