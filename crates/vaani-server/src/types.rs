//! Request and response types for the API

use serde::{de, Deserialize, Deserializer, Serialize};

use vaani_core::agent::StepStatus;
use vaani_core::schemes::Offer;
use vaani_core::storage::{SessionInfo, WaitingFor};

// ============================================================================
// Agent Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    /// Session ID (creates new session if not provided)
    pub session_id: Option<String>,
    /// Recognized user utterance
    #[serde(alias = "text")]
    pub transcript: Option<String>,
    /// Recognition confidence in [0, 1]; absent means typed input
    #[serde(default = "full_confidence", deserialize_with = "deserialize_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfidenceInput {
    Number(f64),
    String(String),
}

/// Accept a number or a numeric string (form-style clients send strings).
fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<ConfidenceInput>::deserialize(deserializer)? {
        None => return Ok(full_confidence()),
        Some(ConfidenceInput::Number(n)) => n,
        Some(ConfidenceInput::String(raw)) => raw.trim().parse::<f64>().map_err(|_| {
            de::Error::custom(format!("invalid confidence '{}'; expected a number", raw))
        })?,
    };
    if !(0.0..=1.0).contains(&value) {
        return Err(de::Error::custom(format!(
            "confidence {} is outside [0, 1]",
            value
        )));
    }
    Ok(value)
}

#[derive(Debug, Serialize)]
pub struct AgentReply {
    pub session_id: String,
    pub status: StepStatus,
    pub reply: Option<String>,
    /// Path of the synthesized reply audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Offers from an eligibility check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible: Option<Vec<Offer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

// ============================================================================
// Speech Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
    pub confidence: f64,
    pub low_confidence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarify_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub audio: String,
}

// ============================================================================
// Session Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub language: String,
    pub waiting_for: Option<WaitingFor>,
    pub turns: usize,
    pub updated_at: String,
}

impl From<SessionInfo> for SessionResponse {
    fn from(s: SessionInfo) -> Self {
        Self {
            id: s.id,
            language: s.language,
            waiting_for: s.waiting_for,
            turns: s.turns,
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AgentRequest;
    use serde_json::json;

    #[test]
    fn agent_request_defaults_confidence_to_full() {
        let req: AgentRequest = serde_json::from_value(json!({ "transcript": "hello" }))
            .expect("request should deserialize");
        assert_eq!(req.confidence, 1.0);
        assert!(req.session_id.is_none());
    }

    #[test]
    fn agent_request_accepts_string_confidence_and_text_alias() {
        let req: AgentRequest = serde_json::from_value(json!({
            "text": "నా వయస్సు 30",
            "confidence": "0.42"
        }))
        .expect("request should deserialize");
        assert_eq!(req.confidence, 0.42);
        assert_eq!(req.transcript.as_deref(), Some("నా వయస్సు 30"));
    }

    #[test]
    fn agent_request_null_confidence_is_full() {
        let req: AgentRequest =
            serde_json::from_value(json!({ "transcript": "hi", "confidence": null }))
                .expect("request should deserialize");
        assert_eq!(req.confidence, 1.0);
    }

    #[test]
    fn agent_request_rejects_out_of_range_confidence() {
        let result = serde_json::from_value::<AgentRequest>(json!({
            "transcript": "hi",
            "confidence": 1.7
        }));
        match result {
            Ok(_) => panic!("request should fail"),
            Err(err) => assert!(err.to_string().contains("outside [0, 1]")),
        }
    }
}
