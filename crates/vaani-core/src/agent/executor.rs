//! Step execution.
//!
//! Handles:
//! - Session mutation through `SessionStore` accessors
//! - Collaborator calls (eligibility, offer lookup, submission)
//! - Re-prompt self-loops for unparseable fields and unclear confirmations
//! - Recording every produced reply in the session history

use std::sync::Arc;

use async_trait::async_trait;

use crate::constants::replies;
use crate::error::AgentError;
use crate::schemes::{EligibilityEvaluator, Offer, OfferStore, SubmissionService};
use crate::storage::{Role, Session, SessionStore, WaitingFor};

use super::confirmation::{Confirmation, ConfirmationClassifier, KeywordClassifier};
use super::profile::ProfileField;
use super::step::{Step, StepOutcome, StepStatus};

/// Execution seam used by the orchestration loop.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        step: &Step,
        session_id: &str,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError>;
}

/// Collaborators the executor needs.
#[derive(Clone)]
pub struct ExecutorServices {
    pub eligibility: Arc<dyn EligibilityEvaluator>,
    pub offers: Arc<dyn OfferStore>,
    pub submissions: Arc<dyn SubmissionService>,
    pub classifier: Arc<dyn ConfirmationClassifier>,
}

impl ExecutorServices {
    /// Services with the keyword confirmation classifier.
    pub fn new(
        eligibility: Arc<dyn EligibilityEvaluator>,
        offers: Arc<dyn OfferStore>,
        submissions: Arc<dyn SubmissionService>,
    ) -> Self {
        Self {
            eligibility,
            offers,
            submissions,
            classifier: Arc::new(KeywordClassifier),
        }
    }
}

pub struct Executor {
    store: SessionStore,
    services: ExecutorServices,
}

impl Executor {
    pub fn new(store: SessionStore, services: ExecutorServices) -> Self {
        Self { store, services }
    }

    fn say(
        &self,
        session_id: &str,
        status: StepStatus,
        reply: impl Into<String>,
    ) -> Result<StepOutcome, AgentError> {
        let reply = reply.into();
        self.store
            .append_history(session_id, Role::Assistant, reply.clone())?;
        Ok(StepOutcome::reply(status, reply))
    }

    fn request_rerecord(&self, session_id: &str) -> Result<StepOutcome, AgentError> {
        self.store.set_waiting(session_id, None)?;
        self.say(session_id, StepStatus::Clarify, replies::CLARIFY_ASR)
    }

    fn ask_field(&self, session_id: &str, field: &str) -> Result<StepOutcome, AgentError> {
        let Some(known) = ProfileField::from_name(field) else {
            tracing::warn!(session_id = %session_id, field, "No prompt for field");
            return self.say(session_id, StepStatus::Ask, replies::ASK_UNKNOWN);
        };
        self.store
            .set_waiting(session_id, Some(WaitingFor::Field(field.to_string())))?;
        self.say(session_id, StepStatus::Ask, known.prompt())
    }

    fn fill_field(
        &self,
        session_id: &str,
        field: &str,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let value = ProfileField::from_name(field).and_then(|f| f.extract(utterance));

        match value {
            Some(value) => {
                tracing::debug!(session_id = %session_id, field, ?value, "Field filled");
                self.store.set_profile_field(session_id, field, value)?;
                self.store.set_waiting(session_id, None)?;
                Ok(StepOutcome::silent(StepStatus::Filled))
            }
            None => {
                self.store
                    .set_waiting(session_id, Some(WaitingFor::Field(field.to_string())))?;
                self.say(session_id, StepStatus::Ask, replies::restate_field(field))
            }
        }
    }

    async fn check_eligibility(&self, session: &Session) -> Result<StepOutcome, AgentError> {
        let offers = self
            .services
            .eligibility
            .evaluate(&session.profile)
            .await
            .map_err(|e| AgentError::collaborator("check_eligibility", e))?;

        tracing::info!(
            session_id = %session.id,
            offers = offers.len(),
            "Eligibility checked"
        );
        self.store.set_last_offers(&session.id, offers.clone())?;

        let outcome = if offers.is_empty() {
            self.store.set_waiting(&session.id, None)?;
            self.say(&session.id, StepStatus::EligibleCheck, replies::NO_MATCHING_OFFER)?
        } else {
            let names = offers
                .iter()
                .map(|o| o.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            self.store
                .set_waiting(&session.id, Some(WaitingFor::Confirmation))?;
            self.say(
                &session.id,
                StepStatus::EligibleCheck,
                replies::eligible_offers(&names),
            )?
        };
        Ok(outcome.with_offers(offers))
    }

    async fn describe_offer(
        &self,
        session: &Session,
        query: &str,
    ) -> Result<StepOutcome, AgentError> {
        let needle = query.to_lowercase();
        let mut hits: Vec<Offer> = session
            .last_offers
            .iter()
            .filter(|o| {
                needle.contains(&o.name.to_lowercase()) || needle.contains(&o.id.to_lowercase())
            })
            .cloned()
            .collect();

        if hits.is_empty() {
            hits = self
                .services
                .offers
                .search(query)
                .await
                .map_err(|e| AgentError::collaborator("describe_offer", e))?;
        }

        // Describing never resolves the pending yes/no decision.
        self.store
            .set_waiting(&session.id, Some(WaitingFor::Confirmation))?;

        let Some(first) = hits.into_iter().next() else {
            return self.say(&session.id, StepStatus::NoDetails, replies::NO_DETAILS);
        };

        let offer = self
            .services
            .offers
            .lookup_by_id(&first.id)
            .await
            .map_err(|e| AgentError::collaborator("describe_offer", e))?
            .unwrap_or(first);

        self.say(
            &session.id,
            StepStatus::Describe,
            format!("{}: {}", offer.name, offer.description),
        )
    }

    async fn submit(&self, session: &Session) -> Result<String, AgentError> {
        self.services
            .submissions
            .submit(&session.profile)
            .await
            .map_err(|e| AgentError::collaborator("submit_application", e))
    }

    async fn confirm(&self, session: &Session, utterance: &str) -> Result<StepOutcome, AgentError> {
        match self.services.classifier.classify(utterance) {
            Confirmation::Affirmative => {
                let application_id = self.submit(session).await?;
                self.store.set_waiting(&session.id, None)?;
                Ok(self
                    .say(
                        &session.id,
                        StepStatus::Submitted,
                        replies::submitted(&application_id),
                    )?
                    .with_application_id(application_id))
            }
            Confirmation::Negative => {
                self.store.set_waiting(&session.id, None)?;
                self.say(&session.id, StepStatus::Declined, replies::DECLINED)
            }
            Confirmation::Ambiguous => {
                self.store
                    .set_waiting(&session.id, Some(WaitingFor::Confirmation))?;
                self.say(&session.id, StepStatus::ConfirmAsk, replies::CONFIRM_AGAIN)
            }
        }
    }

    async fn submit_application(&self, session: &Session) -> Result<StepOutcome, AgentError> {
        let application_id = self.submit(session).await?;
        self.store.set_waiting(&session.id, None)?;
        Ok(self
            .say(
                &session.id,
                StepStatus::Submitted,
                replies::submitted_direct(&application_id),
            )?
            .with_application_id(application_id))
    }
}

#[async_trait]
impl StepExecutor for Executor {
    async fn execute(
        &self,
        step: &Step,
        session_id: &str,
        utterance: &str,
    ) -> Result<StepOutcome, AgentError> {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;

        tracing::debug!(session_id = %session_id, step = step.name(), "Executing step");

        match step {
            Step::RequestRerecord => self.request_rerecord(session_id),
            Step::AskField { field } => self.ask_field(session_id, field),
            Step::FillField { field } => self.fill_field(session_id, field, utterance),
            Step::CheckEligibility => self.check_eligibility(&session).await,
            Step::DescribeOffer { query } => self.describe_offer(&session, query).await,
            Step::Confirm => self.confirm(&session, utterance).await,
            Step::SubmitApplication => self.submit_application(&session).await,
        }
    }
}
