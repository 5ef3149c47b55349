//! Dialogue orchestrator: the bounded plan/execute loop behind every turn.
//!
//! One call handles one utterance for one session:
//!
//! ```text
//!   utterance ──► plan(snapshot) ──► execute(first step) ──► reply? ──► return
//!                      ▲                      │
//!                      └──── filled ◄─────────┘
//! ```
//!
//! Silent field fills re-plan against a fresh snapshot so a single
//! utterance can both answer one question and receive the next one.

use serde::Serialize;

use crate::config::AgentSettings;
use crate::constants::agent::ITERATION_SLACK;
use crate::error::AgentError;
use crate::schemes::Offer;
use crate::storage::{Role, SessionStore};

use super::executor::{Executor, ExecutorServices, StepExecutor};
use super::planner::{Planner, StepPlanner};
use super::step::{StepOutcome, StepStatus};

/// Loop configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub max_iterations: usize,
}

impl OrchestratorConfig {
    /// One iteration per required field plus slack.
    pub fn for_required_fields(count: usize) -> Self {
        Self {
            max_iterations: count + ITERATION_SLACK,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::for_required_fields(crate::constants::agent::DEFAULT_REQUIRED_FIELDS.len())
    }
}

/// What the boundary gets back for one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentResponse {
    pub status: StepStatus,
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<Vec<Offer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl AgentResponse {
    fn no_action() -> Self {
        Self {
            status: StepStatus::NoAction,
            reply: None,
            offers: None,
            application_id: None,
        }
    }
}

impl From<StepOutcome> for AgentResponse {
    fn from(outcome: StepOutcome) -> Self {
        Self {
            status: outcome.status,
            reply: outcome.reply,
            offers: outcome.offers,
            application_id: outcome.application_id,
        }
    }
}

pub struct DialogueOrchestrator<P = Planner, E = Executor> {
    store: SessionStore,
    planner: P,
    executor: E,
    config: OrchestratorConfig,
}

impl DialogueOrchestrator<Planner, Executor> {
    /// Wire the keyword planner and the default executor from settings.
    pub fn from_settings(
        store: SessionStore,
        settings: &AgentSettings,
        services: ExecutorServices,
    ) -> Self {
        let config = OrchestratorConfig {
            max_iterations: settings.max_iterations(),
        };
        let executor = Executor::new(store.clone(), services);
        Self::new(store, Planner::new(settings), executor, config)
    }
}

impl<P: StepPlanner, E: StepExecutor> DialogueOrchestrator<P, E> {
    pub fn new(store: SessionStore, planner: P, executor: E, config: OrchestratorConfig) -> Self {
        Self {
            store,
            planner,
            executor,
            config,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Direct access for externally triggered steps.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn max_iterations(&self) -> usize {
        self.config.max_iterations
    }

    /// Process one user utterance and return the first reply produced.
    pub async fn process_input(
        &self,
        session_id: &str,
        utterance: &str,
        confidence: f64,
    ) -> Result<AgentResponse, AgentError> {
        if !self.store.exists(session_id) {
            return Err(AgentError::SessionNotFound(session_id.to_string()));
        }
        self.store
            .append_history(session_id, Role::User, utterance)?;

        let mut last: Option<StepOutcome> = None;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let session = self
                .store
                .get(session_id)
                .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;
            let plan = self.planner.plan(&session, utterance, confidence);
            let Some(step) = plan.first() else {
                tracing::debug!(session_id = %session_id, "Planner returned no steps");
                break;
            };

            let outcome = self.executor.execute(step, session_id, utterance).await?;
            tracing::debug!(
                session_id = %session_id,
                step = step.name(),
                status = %outcome.status,
                iteration = iterations,
                "Step executed"
            );

            if outcome.has_reply() {
                tracing::info!(
                    session_id = %session_id,
                    status = %outcome.status,
                    iterations,
                    "Turn complete"
                );
                return Ok(outcome.into());
            }

            let filled = outcome.status == StepStatus::Filled;
            last = Some(outcome);
            if !filled {
                break;
            }
        }

        let response = match last {
            Some(outcome) if outcome.status != StepStatus::Filled => {
                let mut response = AgentResponse::from(outcome);
                response.reply = None;
                response
            }
            _ => AgentResponse::no_action(),
        };

        if iterations >= self.config.max_iterations {
            tracing::warn!(
                session_id = %session_id,
                iterations,
                "Iteration bound reached without a reply"
            );
        } else {
            tracing::info!(
                session_id = %session_id,
                status = %response.status,
                iterations,
                "Turn ended without a reply"
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::agent::executor::tests::{services, RecordingSubmissions};
    use crate::agent::step::Step;
    use crate::constants::replies;
    use crate::storage::{Session, WaitingFor};

    fn orchestrator() -> (DialogueOrchestrator, SessionStore, Arc<RecordingSubmissions>) {
        let store = SessionStore::new();
        let submissions = Arc::new(RecordingSubmissions::default());
        let orchestrator = DialogueOrchestrator::from_settings(
            store.clone(),
            &AgentSettings::default(),
            services(submissions.clone()),
        );
        (orchestrator, store, submissions)
    }

    struct AlwaysFill;

    impl StepPlanner for AlwaysFill {
        fn plan(&self, _session: &Session, _utterance: &str, _confidence: f64) -> Vec<Step> {
            vec![Step::FillField {
                field: "age".into(),
            }]
        }
    }

    #[derive(Default)]
    struct CountingFiller {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StepExecutor for CountingFiller {
        async fn execute(
            &self,
            _step: &Step,
            _session_id: &str,
            _utterance: &str,
        ) -> Result<StepOutcome, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutcome::silent(StepStatus::Filled))
        }
    }

    struct NothingToDo;

    impl StepPlanner for NothingToDo {
        fn plan(&self, _session: &Session, _utterance: &str, _confidence: f64) -> Vec<Step> {
            Vec::new()
        }
    }

    #[test]
    fn default_bound_is_fields_plus_slack() {
        assert_eq!(OrchestratorConfig::default().max_iterations, 5);
        assert_eq!(OrchestratorConfig::for_required_fields(4).max_iterations, 7);
    }

    #[tokio::test]
    async fn new_session_is_asked_for_age() {
        let (orchestrator, store, _) = orchestrator();
        let id = store.create(None);

        let response = orchestrator.process_input(&id, "hello", 0.9).await.unwrap();

        assert_eq!(response.status, StepStatus::Ask);
        assert_eq!(response.reply.as_deref(), Some(replies::ASK_AGE));
        assert_eq!(
            store.get(&id).unwrap().waiting_for,
            Some(WaitingFor::Field("age".into()))
        );
    }

    #[tokio::test]
    async fn filled_age_flows_into_income_question() {
        let (orchestrator, store, _) = orchestrator();
        let id = store.create(None);
        store
            .set_waiting(&id, Some(WaitingFor::Field("age".into())))
            .unwrap();

        let response = orchestrator
            .process_input(&id, "I am 30 years old", 0.95)
            .await
            .unwrap();

        assert_eq!(response.reply.as_deref(), Some(replies::ASK_INCOME));
        let session = store.get(&id).unwrap();
        assert_eq!(session.profile.get_integer("age"), Some(30));
        assert_eq!(
            session.waiting_for,
            Some(WaitingFor::Field("income".into()))
        );
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, Role::User);
        assert_eq!(session.history[0].text, "I am 30 years old");
    }

    #[tokio::test]
    async fn negative_confirmation_declines_without_submitting() {
        let (orchestrator, store, submissions) = orchestrator();
        let id = store.create(None);
        store
            .set_waiting(&id, Some(WaitingFor::Confirmation))
            .unwrap();

        let response = orchestrator.process_input(&id, "లేదు", 0.9).await.unwrap();

        assert_eq!(response.status, StepStatus::Declined);
        assert_eq!(response.reply.as_deref(), Some(replies::DECLINED));
        assert!(store.get(&id).unwrap().waiting_for.is_none());
        assert_eq!(submissions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn affirmative_confirmation_submits_once_with_profile() {
        let (orchestrator, store, submissions) = orchestrator();
        let id = store.create(None);

        orchestrator.process_input(&id, "hi", 0.9).await.unwrap();
        orchestrator.process_input(&id, "65", 0.9).await.unwrap();
        let response = orchestrator
            .process_input(&id, "1,00,000", 0.9)
            .await
            .unwrap();
        assert_eq!(response.status, StepStatus::EligibleCheck);
        assert!(response.offers.as_ref().is_some_and(|o| !o.is_empty()));

        let response = orchestrator.process_input(&id, "అవును", 0.9).await.unwrap();

        assert_eq!(response.status, StepStatus::Submitted);
        let application_id = response.application_id.unwrap();
        assert!(response.reply.unwrap().contains(&application_id));
        assert_eq!(submissions.calls.load(Ordering::SeqCst), 1);
        let profile = submissions.last_profile.lock().clone().unwrap();
        assert_eq!(profile.get_integer("age"), Some(65));
        assert_eq!(profile.get_integer("income"), Some(100_000));
        assert!(store.get(&id).unwrap().waiting_for.is_none());
    }

    #[tokio::test]
    async fn low_confidence_never_touches_the_profile() {
        let (orchestrator, store, _) = orchestrator();
        let id = store.create(None);
        store
            .set_waiting(&id, Some(WaitingFor::Field("age".into())))
            .unwrap();

        let response = orchestrator.process_input(&id, "30", 0.2).await.unwrap();

        assert_eq!(response.status, StepStatus::Clarify);
        let session = store.get(&id).unwrap();
        assert!(session.profile.is_empty());
        assert!(session.waiting_for.is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_rejected_before_mutation() {
        let (orchestrator, store, _) = orchestrator();

        let err = orchestrator
            .process_input("ghost", "hello", 1.0)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::SessionNotFound(id) if id == "ghost"));
        assert!(!store.exists("ghost"));
    }

    #[tokio::test]
    async fn silent_loop_stops_at_iteration_bound() {
        let store = SessionStore::new();
        let id = store.create(None);
        let orchestrator = DialogueOrchestrator::new(
            store.clone(),
            AlwaysFill,
            CountingFiller::default(),
            OrchestratorConfig::default(),
        );

        let response = orchestrator.process_input(&id, "42", 1.0).await.unwrap();

        assert_eq!(orchestrator.executor().calls.load(Ordering::SeqCst), 5);
        assert_eq!(response.status, StepStatus::NoAction);
        assert!(response.reply.is_none());
    }

    #[tokio::test]
    async fn empty_plan_is_no_action() {
        let store = SessionStore::new();
        let id = store.create(None);
        let orchestrator = DialogueOrchestrator::new(
            store.clone(),
            NothingToDo,
            CountingFiller::default(),
            OrchestratorConfig::default(),
        );

        let response = orchestrator.process_input(&id, "hi", 1.0).await.unwrap();

        assert_eq!(response, AgentResponse::no_action());
        assert_eq!(orchestrator.executor().calls.load(Ordering::SeqCst), 0);
        // The utterance is still recorded.
        assert_eq!(store.get(&id).unwrap().history.len(), 1);
    }
}
