//! Dialogue endpoint: one utterance in, one reply out.

use axum::{extract::State, routing::post, Json, Router};

use vaani_core::speech;

use crate::error::AppError;
use crate::types::{AgentReply, AgentRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(agent))
}

async fn agent(
    State(state): State<AppState>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentReply>, AppError> {
    let transcript = req
        .transcript
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("transcript is required".to_string()))?
        .to_string();

    let session_id = match req.session_id {
        Some(id) => {
            if !state.store.exists(&id) {
                return Err(AppError::NotFound(format!("Session {} not found", id)));
            }
            id
        }
        None => state.store.create(Some(state.settings.language.as_str())),
    };

    let _guard = state.lock_session(&session_id).await?;

    let response = state
        .orchestrator
        .process_input(&session_id, &transcript, req.confidence)
        .await?;

    let audio = match response.reply.as_deref() {
        Some(reply) if !reply.is_empty() => synthesize_reply(&state, &session_id, reply).await,
        _ => None,
    };

    Ok(Json(AgentReply {
        session_id,
        status: response.status,
        reply: response.reply,
        audio,
        eligible: response.offers,
        application_id: response.application_id,
    }))
}

/// Synthesize the reply; failure only costs the audio.
async fn synthesize_reply(state: &AppState, session_id: &str, reply: &str) -> Option<String> {
    let language = state
        .store
        .get(session_id)
        .map(|s| s.language)
        .unwrap_or_else(|| state.settings.language.clone());
    let out = state.tmp_dir.join(format!("reply_{}.mp3", session_id));

    match state.synthesizer.synthesize(reply, &language, &out).await {
        Ok(path) => Some(path.display().to_string()),
        Err(e) if speech::is_not_configured(&e) => None,
        Err(e) => {
            tracing::warn!(session_id = %session_id, "Reply synthesis failed: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use vaani_core::constants::replies;

    use std::sync::Arc;

    use vaani_core::speech::DisabledRecognizer;

    use crate::build_router;
    use crate::testing::{post_json, send, state_in, state_with, FileSynthesizer};

    #[tokio::test]
    async fn missing_transcript_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state_in(dir.path()));

        let (status, body) = send(app, post_json("/api/agent", json!({ "transcript": "  " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let app = build_router(state.clone());

        let (status, body) = send(
            app,
            post_json(
                "/api/agent",
                json!({ "session_id": "ghost", "transcript": "hello" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(!state.store.exists("ghost"));
    }

    #[tokio::test]
    async fn new_conversation_gets_session_and_age_question() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let app = build_router(state.clone());

        let (status, body) =
            send(app, post_json("/api/agent", json!({ "transcript": "namaste" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ask");
        assert_eq!(body["reply"], replies::ASK_AGE);
        assert!(body.get("audio").is_none());
        let session_id = body["session_id"].as_str().unwrap();
        assert!(state.store.exists(session_id));
    }

    #[tokio::test]
    async fn conversation_reaches_eligibility_offers() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let id = state.store.create(None);

        for utterance in ["hello", "70"] {
            let app = build_router(state.clone());
            send(
                app,
                post_json(
                    "/api/agent",
                    json!({ "session_id": id, "transcript": utterance }),
                ),
            )
            .await;
        }

        let app = build_router(state.clone());
        let (status, body) = send(
            app,
            post_json(
                "/api/agent",
                json!({ "session_id": id, "transcript": "80,000", "confidence": 0.9 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "eligible_check");
        let eligible = body["eligible"].as_array().unwrap();
        assert!(eligible.iter().any(|o| o["id"] == "aasara-pension"));
    }

    #[tokio::test]
    async fn low_confidence_asks_for_rerecording() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(state_in(dir.path()));

        let (status, body) = send(
            app,
            post_json(
                "/api/agent",
                json!({ "transcript": "??", "confidence": 0.1 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "clarify");
        assert_eq!(body["reply"], replies::CLARIFY_ASR);
    }

    #[tokio::test]
    async fn busy_session_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let id = state.store.create(None);
        let _held = state.lock_session(&id).await.unwrap();

        let app = build_router(state.clone());
        let (status, body) = send(
            app,
            post_json("/api/agent", json!({ "session_id": id, "transcript": "hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
        assert!(state.store.get(&id).unwrap().history.is_empty());
    }

    #[tokio::test]
    async fn reply_audio_is_synthesized_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(
            dir.path(),
            Arc::new(DisabledRecognizer),
            Arc::new(FileSynthesizer),
        );
        let app = build_router(state);

        let (status, body) =
            send(app, post_json("/api/agent", json!({ "transcript": "hello" }))).await;

        assert_eq!(status, StatusCode::OK);
        let session_id = body["session_id"].as_str().unwrap();
        let audio = body["audio"].as_str().unwrap();
        assert!(audio.ends_with(&format!("reply_{}.mp3", session_id)));
        assert!(std::path::Path::new(audio).exists());
    }
}
