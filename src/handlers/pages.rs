use std::any::Any;
use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::session::Session;
use crate::state::AppState;

pub const SERVER_ERROR_PAGE: &str = "There was an error serving your request.";
pub const NOT_FOUND_PAGE: &str = "Page not found.";

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_PAGE).into_response()
}

/// `GET /`
pub async fn index(State(state): State<AppState>, Extension(session): Extension<Session>) -> Response {
    let context = HashMap::from([
        ("session.id", session.id.to_string()),
        ("session.views", session.views.to_string()),
        ("session.user", session.user_label().to_string()),
        ("session.created_at", session.created_at.to_rfc3339()),
    ]);

    match state.views.render("index", &context).await {
        Ok(page) => {
            info!("Root path accessed.");
            Html(page).into_response()
        }
        Err(e) => {
            error!("Unhandled application error: {}", e);
            server_error()
        }
    }
}

/// `GET /ping`
pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

pub async fn not_found() -> (StatusCode, &'static str) {
    info!("404 - Page not found.");
    (StatusCode::NOT_FOUND, NOT_FOUND_PAGE)
}

/// Turn a handler panic into the generic 500 page.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Unhandled application error: {}", detail);
    server_error()
}
