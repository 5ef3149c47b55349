//! Text-to-speech endpoint.

use axum::{extract::State, routing::post, Json, Router};

use vaani_core::speech;

use crate::error::AppError;
use crate::types::{SpeakRequest, SpeakResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(speak))
}

async fn speak(
    State(state): State<AppState>,
    Json(req): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, AppError> {
    let text = req
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("text is required".to_string()))?;
    let language = req
        .lang
        .unwrap_or_else(|| vaani_core::constants::agent::DEFAULT_LANGUAGE.to_string());

    vaani_core::paths::ensure_dir(&state.tmp_dir)
        .map_err(|e| AppError::Internal(format!("Failed to prepare audio dir: {}", e)))?;
    let out = state
        .tmp_dir
        .join(format!("speak_{}.mp3", uuid::Uuid::new_v4().simple()));

    let path = state
        .synthesizer
        .synthesize(text, &language, &out)
        .await
        .map_err(|e| {
            if speech::is_not_configured(&e) {
                AppError::NotImplemented("Speech synthesis is not configured".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    Ok(Json(SpeakResponse {
        audio: path.display().to_string(),
    }))
}
