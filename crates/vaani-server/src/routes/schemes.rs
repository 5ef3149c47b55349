//! Scheme catalog endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use vaani_core::schemes::Scheme;

use crate::error::AppError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schemes))
        .route("/:id", get(get_scheme))
}

async fn list_schemes(State(state): State<AppState>) -> Json<Vec<Scheme>> {
    Json(state.catalog.schemes().to_vec())
}

async fn get_scheme(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Scheme>, AppError> {
    state
        .catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Scheme {} not found", id)))
}
