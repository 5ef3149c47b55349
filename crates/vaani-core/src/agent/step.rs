//! Steps the planner proposes and the outcomes the executor reports.

use serde::{Deserialize, Serialize};

use crate::schemes::Offer;

/// One unit of work. Each variant carries only what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Recognition was too unsure to act on; ask the user to record again.
    RequestRerecord,
    AskField { field: String },
    FillField { field: String },
    CheckEligibility,
    DescribeOffer { query: String },
    Confirm,
    /// Never planned; only reachable through an external trigger.
    SubmitApplication,
}

impl Step {
    /// Wire names of every step kind.
    pub const NAMES: &'static [&'static str] = &[
        "request_rerecord",
        "ask_field",
        "fill_field",
        "check_eligibility",
        "describe_offer",
        "confirm",
        "submit_application",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::RequestRerecord => "request_rerecord",
            Step::AskField { .. } => "ask_field",
            Step::FillField { .. } => "fill_field",
            Step::CheckEligibility => "check_eligibility",
            Step::DescribeOffer { .. } => "describe_offer",
            Step::Confirm => "confirm",
            Step::SubmitApplication => "submit_application",
        }
    }

    pub fn is_known_name(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Clarify,
    Ask,
    /// A field was captured silently; the loop keeps planning.
    Filled,
    EligibleCheck,
    Describe,
    NoDetails,
    Submitted,
    Declined,
    ConfirmAsk,
    UnknownStep,
    NoAction,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Clarify => "clarify",
            StepStatus::Ask => "ask",
            StepStatus::Filled => "filled",
            StepStatus::EligibleCheck => "eligible_check",
            StepStatus::Describe => "describe",
            StepStatus::NoDetails => "no_details",
            StepStatus::Submitted => "submitted",
            StepStatus::Declined => "declined",
            StepStatus::ConfirmAsk => "confirm_ask",
            StepStatus::UnknownStep => "unknown_step",
            StepStatus::NoAction => "no_action",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of executing one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<Vec<Offer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl StepOutcome {
    /// Outcome the user should hear.
    pub fn reply(status: StepStatus, reply: impl Into<String>) -> Self {
        Self {
            status,
            reply: Some(reply.into()),
            offers: None,
            application_id: None,
        }
    }

    /// Internal transition with nothing to say.
    pub fn silent(status: StepStatus) -> Self {
        Self {
            status,
            reply: None,
            offers: None,
            application_id: None,
        }
    }

    pub fn unknown_step() -> Self {
        Self::silent(StepStatus::UnknownStep)
    }

    pub fn with_offers(mut self, offers: Vec<Offer>) -> Self {
        self.offers = Some(offers);
        self
    }

    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn has_reply(&self) -> bool {
        self.reply.as_deref().is_some_and(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn steps_deserialize_from_tagged_json() {
        let step: Step = serde_json::from_value(json!({ "step": "submit_application" }))
            .expect("step should deserialize");
        assert_eq!(step, Step::SubmitApplication);

        let step: Step = serde_json::from_value(json!({ "step": "ask_field", "field": "age" }))
            .expect("step should deserialize");
        assert_eq!(
            step,
            Step::AskField {
                field: "age".to_string()
            }
        );
    }

    #[test]
    fn names_match_serde_tags() {
        let steps = [
            Step::RequestRerecord,
            Step::AskField { field: "age".into() },
            Step::FillField { field: "age".into() },
            Step::CheckEligibility,
            Step::DescribeOffer { query: "q".into() },
            Step::Confirm,
            Step::SubmitApplication,
        ];
        for step in steps {
            let json = serde_json::to_value(&step).unwrap();
            assert_eq!(json["step"], step.name());
            assert!(Step::is_known_name(step.name()));
        }
        assert!(!Step::is_known_name("launch_rocket"));
    }

    #[test]
    fn status_serializes_like_display() {
        for status in [StepStatus::EligibleCheck, StepStatus::ConfirmAsk, StepStatus::NoAction] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, json!(status.to_string()));
        }
    }

    #[test]
    fn empty_reply_does_not_count() {
        assert!(!StepOutcome::reply(StepStatus::Ask, "").has_reply());
        assert!(StepOutcome::reply(StepStatus::Ask, "x").has_reply());
        assert!(!StepOutcome::silent(StepStatus::Filled).has_reply());
    }
}
