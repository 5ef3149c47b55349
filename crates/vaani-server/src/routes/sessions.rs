//! Session management endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use vaani_core::agent::{Step, StepExecutor, StepOutcome};
use vaani_core::storage::{Session, SessionInfo};

use crate::error::AppError;
use crate::types::{CreateSessionRequest, SessionResponse};
use crate::AppState;

/// Build the sessions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions).post(create_session))
        .route("/:id", get(get_session))
        .route("/:id/steps", post(trigger_step))
}

/// List sessions, most recently updated first
async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionResponse>> {
    Json(
        state
            .store
            .list()
            .into_iter()
            .map(SessionResponse::from)
            .collect(),
    )
}

async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let language = req
        .language
        .unwrap_or_else(|| state.settings.language.clone());

    let id = state.store.create(Some(language.as_str()));
    let session = state
        .store
        .get(&id)
        .ok_or_else(|| AppError::Internal("Session vanished after creation".to_string()))?;

    Ok(Json(SessionResponse::from(SessionInfo::from(&session))))
}

/// Full snapshot: profile, waiting mode, offers and history
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
}

/// Run one named step outside the planner, e.g. `submit_application`.
///
/// Body is `{"step": "<name>", ...payload, "utterance"?: "..."}`.
async fn trigger_step(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<StepOutcome>, AppError> {
    if !state.store.exists(&id) {
        return Err(AppError::NotFound(format!("Session {} not found", id)));
    }

    let name = body
        .get("step")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::BadRequest("step is required".to_string()))?;
    if !Step::is_known_name(name) {
        tracing::warn!(session_id = %id, step = name, "Unknown step requested");
        return Ok(Json(StepOutcome::unknown_step()));
    }

    let utterance = body
        .get("utterance")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let step: Step = serde_json::from_value(body)?;

    let _guard = state.lock_session(&id).await?;
    let outcome = state
        .orchestrator
        .executor()
        .execute(&step, &id, &utterance)
        .await?;

    tracing::info!(
        session_id = %id,
        step = step.name(),
        status = %outcome.status,
        "Step triggered"
    );
    Ok(Json(outcome))
}
