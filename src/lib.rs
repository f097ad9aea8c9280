pub mod audio;
pub mod config;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// The full application: routes, sessions, static files and the outer
/// panic, tracing and CORS layers.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes(state.clone()))
        .layer(CatchPanicLayer::custom(handlers::pages::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
