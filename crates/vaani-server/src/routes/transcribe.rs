//! Audio upload and recognition.

use std::path::Path;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};

use vaani_core::constants::replies;
use vaani_core::speech;

use crate::error::AppError;
use crate::types::TranscribeResponse;
use crate::AppState;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(transcribe))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, AppError> {
    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut language = state.settings.language.clone();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let extension = upload_extension(field.file_name());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                audio = Some((bytes.to_vec(), extension));
            }
            Some("lang") => {
                if let Ok(value) = field.text().await {
                    if !value.trim().is_empty() {
                        language = value.trim().to_string();
                    }
                }
            }
            _ => {}
        }
    }

    let (bytes, extension) =
        audio.ok_or_else(|| AppError::BadRequest("file is required".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("file is empty".to_string()));
    }

    vaani_core::paths::ensure_dir(&state.tmp_dir)
        .map_err(|e| AppError::Internal(format!("Failed to prepare upload dir: {}", e)))?;
    let path = state
        .tmp_dir
        .join(format!("upload_{}.{}", uuid::Uuid::new_v4().simple(), extension));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    let result = state.recognizer.recognize(&path, &language).await;
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::debug!(path = %path.display(), "Failed to remove upload: {}", e);
    }

    let transcription = match result {
        Ok(t) => t,
        Err(e) if speech::is_not_configured(&e) => {
            return Err(AppError::NotImplemented(
                "Speech recognition is not configured".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let low_confidence = transcription.confidence < state.settings.confidence_threshold;
    tracing::info!(
        confidence = transcription.confidence,
        low_confidence,
        "Audio transcribed"
    );

    Ok(Json(TranscribeResponse {
        text: transcription.text,
        confidence: transcription.confidence,
        low_confidence,
        clarify_prompt: low_confidence.then(|| replies::TRANSCRIBE_CLARIFY.to_string()),
    }))
}

/// Extension for the stored upload. Client filenames are never used as paths.
fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "wav".to_string())
}
