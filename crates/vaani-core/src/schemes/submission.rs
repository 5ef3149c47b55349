//! In-process application submission.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::SubmissionService;
use crate::agent::profile::Profile;

/// A recorded application.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub application_id: String,
    pub profile: Profile,
    pub submitted_at: DateTime<Utc>,
}

/// Submission service that keeps applications for the process lifetime.
#[derive(Debug, Default)]
pub struct InMemorySubmissions {
    submitted: Mutex<Vec<Submission>>,
}

impl InMemorySubmissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submitted.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.submitted.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn new_application_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("APP-{}", id[..8].to_ascii_uppercase())
}

#[async_trait]
impl SubmissionService for InMemorySubmissions {
    async fn submit(&self, profile: &Profile) -> Result<String> {
        let application_id = new_application_id();
        self.submitted.lock().push(Submission {
            application_id: application_id.clone(),
            profile: profile.clone(),
            submitted_at: Utc::now(),
        });
        tracing::info!(application_id = %application_id, "Application submitted");
        Ok(application_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::profile::FieldValue;

    #[tokio::test]
    async fn submit_records_profile_and_issues_id() {
        let service = InMemorySubmissions::new();
        let mut profile = Profile::default();
        profile.set("age", FieldValue::Integer(30));

        let id = service.submit(&profile).await.unwrap();

        assert!(id.starts_with("APP-"));
        assert_eq!(id.len(), 12);
        let recorded = service.submissions();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].application_id, id);
        assert_eq!(recorded[0].profile.get_integer("age"), Some(30));
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let service = InMemorySubmissions::new();
        let profile = Profile::default();
        let a = service.submit(&profile).await.unwrap();
        let b = service.submit(&profile).await.unwrap();
        assert_ne!(a, b);
    }
}
