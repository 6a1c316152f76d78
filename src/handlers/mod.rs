use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod event;
pub mod extract;

/// Build the HTTP router over the booking core
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Event booking server is running." }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/events", get(event::list_events).post(event::create_event))
        .route(
            "/events/{id}",
            put(event::update_event).delete(event::delete_event),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
