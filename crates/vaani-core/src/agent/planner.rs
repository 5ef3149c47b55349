//! Next-step selection.
//!
//! Pure function of (session snapshot, utterance, confidence). Rules are
//! checked in order and the first match wins:
//!
//! 1. low recognition confidence -> ask for a re-recording
//! 2. waiting on confirmation -> describe an offer or resolve yes/no
//! 3. waiting on a field -> fill it
//! 4. a required field is missing -> ask for the first one
//! 5. otherwise -> check eligibility

use crate::config::AgentSettings;
use crate::constants::agent::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_REQUIRED_FIELDS, DETAILS_KEYWORDS,
};
use crate::storage::{Session, WaitingFor};

use super::step::Step;

/// Planning seam used by the orchestration loop.
pub trait StepPlanner: Send + Sync {
    fn plan(&self, session: &Session, utterance: &str, confidence: f64) -> Vec<Step>;
}

#[derive(Debug, Clone)]
pub struct Planner {
    confidence_threshold: f64,
    required_fields: Vec<String>,
    details_keywords: Vec<String>,
}

impl Default for Planner {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            required_fields: DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            details_keywords: DETAILS_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Planner {
    pub fn new(settings: &AgentSettings) -> Self {
        Self {
            confidence_threshold: settings.confidence_threshold,
            required_fields: settings.required_fields.clone(),
            ..Default::default()
        }
    }

    fn asks_for_details(&self, utterance: &str) -> bool {
        let text = utterance.to_lowercase();
        self.details_keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

impl StepPlanner for Planner {
    fn plan(&self, session: &Session, utterance: &str, confidence: f64) -> Vec<Step> {
        // A garbled utterance must never be read as data.
        if confidence < self.confidence_threshold {
            return vec![Step::RequestRerecord];
        }

        match &session.waiting_for {
            Some(WaitingFor::Confirmation) => {
                if self.asks_for_details(utterance) {
                    return vec![Step::DescribeOffer {
                        query: utterance.to_string(),
                    }];
                }
                return vec![Step::Confirm];
            }
            Some(WaitingFor::Field(field)) => {
                return vec![Step::FillField {
                    field: field.clone(),
                }];
            }
            None => {}
        }

        if let Some(missing) = self
            .required_fields
            .iter()
            .find(|f| !session.profile.contains(f))
        {
            return vec![Step::AskField {
                field: missing.clone(),
            }];
        }

        vec![Step::CheckEligibility]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::profile::FieldValue;

    fn session() -> Session {
        Session::new("s1", "te")
    }

    fn complete_session() -> Session {
        let mut s = session();
        s.profile.set("age", FieldValue::Integer(30));
        s.profile.set("income", FieldValue::Integer(100_000));
        s
    }

    #[test]
    fn low_confidence_dominates_every_state() {
        let planner = Planner::default();
        let mut states = vec![session(), complete_session()];
        let mut waiting_field = session();
        waiting_field.waiting_for = Some(WaitingFor::Field("age".into()));
        states.push(waiting_field);
        let mut waiting_confirm = complete_session();
        waiting_confirm.waiting_for = Some(WaitingFor::Confirmation);
        states.push(waiting_confirm);

        for state in &states {
            for utterance in ["yes", "I am 30", "details about Arogyasri", ""] {
                for confidence in [0.0, 0.3, 0.59] {
                    assert_eq!(
                        planner.plan(state, utterance, confidence),
                        vec![Step::RequestRerecord]
                    );
                }
            }
        }
    }

    #[test]
    fn threshold_itself_is_high_enough() {
        let planner = Planner::default();
        assert_eq!(
            planner.plan(&session(), "hello", 0.6),
            vec![Step::AskField {
                field: "age".into()
            }]
        );
    }

    #[test]
    fn confirmation_with_details_keyword_describes() {
        let planner = Planner::default();
        let mut s = complete_session();
        s.waiting_for = Some(WaitingFor::Confirmation);

        assert_eq!(
            planner.plan(&s, "Tell me MORE about Arogyasri", 0.9),
            vec![Step::DescribeOffer {
                query: "Tell me MORE about Arogyasri".into()
            }]
        );
        assert_eq!(planner.plan(&s, "ఆరోగ్యశ్రీ వివరాలు", 0.9).len(), 1);
        assert_eq!(planner.plan(&s, "yes", 0.9), vec![Step::Confirm]);
    }

    #[test]
    fn waiting_field_is_filled_before_anything_else() {
        let planner = Planner::default();
        let mut s = session();
        s.waiting_for = Some(WaitingFor::Field("income".into()));

        assert_eq!(
            planner.plan(&s, "50000", 0.95),
            vec![Step::FillField {
                field: "income".into()
            }]
        );
    }

    #[test]
    fn missing_fields_are_asked_in_order() {
        let planner = Planner::default();
        let mut s = session();
        assert_eq!(
            planner.plan(&s, "hi", 1.0),
            vec![Step::AskField {
                field: "age".into()
            }]
        );

        s.profile.set("age", FieldValue::Integer(0));
        assert_eq!(
            planner.plan(&s, "hi", 1.0),
            vec![Step::AskField {
                field: "income".into()
            }]
        );
    }

    #[test]
    fn complete_profile_checks_eligibility() {
        let planner = Planner::default();
        assert_eq!(
            planner.plan(&complete_session(), "anything", 1.0),
            vec![Step::CheckEligibility]
        );
    }

    #[test]
    fn configured_fields_and_threshold_are_used() {
        let settings = AgentSettings {
            confidence_threshold: 0.8,
            required_fields: vec!["district".into()],
            ..Default::default()
        };
        let planner = Planner::new(&settings);

        assert_eq!(
            planner.plan(&session(), "hi", 0.7),
            vec![Step::RequestRerecord]
        );
        assert_eq!(
            planner.plan(&session(), "hi", 0.9),
            vec![Step::AskField {
                field: "district".into()
            }]
        );
    }
}
