//! Welfare schemes: the collaborators the executor consults.
//!
//! - `EligibilityEvaluator` - profile in, eligible offers out
//! - `OfferStore` - lookup by id and free-text search
//! - `SubmissionService` - submit an application, get its identifier
//!
//! `SchemeCatalog` implements the first two from a JSON rule catalog,
//! `InMemorySubmissions` implements the third.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::profile::Profile;

mod catalog;
mod submission;

pub use catalog::{EligibilityRules, Scheme, SchemeCatalog};
pub use submission::{InMemorySubmissions, Submission};

/// An eligibility result item the user may apply for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

#[async_trait]
pub trait EligibilityEvaluator: Send + Sync {
    /// Offers the profile qualifies for, possibly empty.
    async fn evaluate(&self, profile: &Profile) -> Result<Vec<Offer>>;
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn lookup_by_id(&self, id: &str) -> Result<Option<Offer>>;

    async fn search(&self, query: &str) -> Result<Vec<Offer>>;
}

#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Submit an application for the profile and return its identifier.
    async fn submit(&self, profile: &Profile) -> Result<String>;
}
