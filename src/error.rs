use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::audio::SelectionError;

/// Failures of the webhook handler. Callers only ever see the two fixed
/// messages; the underlying cause goes to the log.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid request format")]
    InvalidRequest,
    #[error("audio selection failed: {0}")]
    ResourceUnavailable(#[from] SelectionError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::ResourceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "Invalid request format",
            Self::ResourceUnavailable(_) => "Internal server error",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        if let Self::ResourceUnavailable(source) = &self {
            error!("Error during audio selection: {}", source);
        }
        (self.status(), Json(ErrorBody { error: self.public_message() })).into_response()
    }
}
