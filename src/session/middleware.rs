use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use super::{find_cookie, set_cookie_header, sign_session_id, verify_session_id, Session};
use crate::state::AppState;

/// Attach a session to every request, counting views.
///
/// A missing, forged or expired cookie starts a fresh session. Store
/// failures are logged and the request carries on with an unsaved session.
pub async fn track_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let settings = &state.config.session_config;
    let secret = settings.session_secret.as_bytes();
    let ttl = settings.ttl();

    let existing = match find_cookie(request.headers(), &settings.cookie_name)
        .and_then(|value| verify_session_id(value, secret))
    {
        Some(id) => match state.sessions.load(&id).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to load session {}: {}", id, e);
                None
            }
        },
        None => None,
    };

    let is_new = existing.is_none();
    let mut session = existing.unwrap_or_else(|| Session::new(ttl));
    session.touch(ttl);

    if is_new {
        info!(session_id = %session.id, "Session created at: {}", session.created_at.to_rfc3339());
    } else {
        info!(
            session_id = %session.id,
            "Session accessed again at: {}, Views: {}, User ID: {}",
            chrono::Utc::now().to_rfc3339(),
            session.views,
            session.user_label()
        );
    }

    if let Err(e) = state.sessions.save(&session).await {
        warn!("Failed to save session {}: {}", session.id, e);
    }

    let cookie = is_new
        .then(|| sign_session_id(&session.id, secret))
        .flatten()
        .map(|value| set_cookie_header(&settings.cookie_name, &value, ttl));

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;

    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Session cookie is not a valid header value: {}", e),
        }
    }

    response
}
