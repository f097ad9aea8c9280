use axum::{
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::handlers::{pages, webhook};
use crate::session::track_session;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router<AppState> {
    let system_config = &state.config.system_config;

    let static_files = ServeDir::new(&system_config.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(pages::not_found.into_service());

    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/ping", get(pages::ping))

        // Webhook
        .route("/webhook", post(webhook::handle_webhook))

        // Sessions cover the routes above; static files and 404s go without
        .layer(middleware::from_fn_with_state(state.clone(), track_session))

        // Static file serving, 404 when nothing matches
        .fallback_service(static_files)
}
