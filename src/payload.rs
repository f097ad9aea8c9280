use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde_json::{Map, Value};

use crate::error::WebhookError;

/// Inbound webhook body. Any non-null object is accepted; arrays count as
/// objects. No further schema is enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest(Value);

impl WebhookRequest {
    pub fn from_body(body: Option<Value>) -> Result<Self, WebhookError> {
        match body {
            Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(Self(value)),
            _ => Err(WebhookError::InvalidRequest),
        }
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let essence = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if essence == "application/json" || essence.ends_with("+json") {
        BodyKind::Json
    } else if essence == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

/// Decode a raw body according to its content type. Unparseable JSON and
/// unknown content types yield `None`, the same as a missing body.
pub fn decode_body(headers: &HeaderMap, bytes: &[u8]) -> Option<Value> {
    match body_kind(headers) {
        BodyKind::Json => serde_json::from_slice(bytes).ok(),
        BodyKind::Form => {
            let fields: Map<String, Value> = url::form_urlencoded::parse(bytes)
                .into_owned()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            Some(Value::Object(fields))
        }
        BodyKind::Other => None,
    }
}
