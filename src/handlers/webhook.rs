use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::WebhookError;
use crate::payload::{decode_body, WebhookRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub message: &'static str,
    pub intro_path: String,
    pub outro_path: String,
}

/// `POST /webhook`: validate the body, then pick one intro and one outro.
#[instrument(name = "webhook", skip_all)]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let decoded = decode_body(&headers, &body);
    debug!("Webhook request received: {:?}", decoded);

    let request = WebhookRequest::from_body(decoded).map_err(|e| {
        warn!("Invalid request format");
        e
    })?;
    info!("Request received and validated");
    debug!(payload = %request.value(), "Accepted webhook payload");

    let selection = state.selector.select(&mut rand::thread_rng())?;

    Ok(Json(WebhookResponse {
        message: "Request received and validated",
        intro_path: selection.intro_path.to_string_lossy().into_owned(),
        outro_path: selection.outro_path.to_string_lossy().into_owned(),
    }))
}
