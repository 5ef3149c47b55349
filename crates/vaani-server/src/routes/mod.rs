//! API routes

use axum::Router;

use crate::AppState;

mod agent;
mod schemes;
mod sessions;
mod speak;
mod transcribe;

/// Build the API router with all endpoints
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/agent", agent::router())
        .nest("/transcribe", transcribe::router())
        .nest("/speak", speak::router())
        .nest("/schemes", schemes::router())
        .nest("/sessions", sessions::router())
}
