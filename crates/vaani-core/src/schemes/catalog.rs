//! JSON-backed scheme catalog with simple age/income rules.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EligibilityEvaluator, Offer, OfferStore};
use crate::agent::profile::Profile;

const BUILTIN_CATALOG: &str = include_str!("default_catalog.json");

/// Words that carry no information about which scheme is meant.
const SEARCH_STOPWORDS: &[&str] = &[
    "about", "details", "more", "tell", "what", "scheme", "please", "the", "and", "for",
];

/// Eligibility rules. A rule that is present requires its field to be known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_income: Option<i64>,
}

impl EligibilityRules {
    pub fn is_satisfied_by(&self, profile: &Profile) -> bool {
        let age = profile.get_integer("age");
        let income = profile.get_integer("income");

        if let Some(min) = self.min_age {
            if !age.is_some_and(|a| a >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_age {
            if !age.is_some_and(|a| a <= max) {
                return false;
            }
        }
        if let Some(max) = self.max_income {
            if !income.is_some_and(|i| i <= max) {
                return false;
            }
        }
        true
    }
}

/// A catalog entry: the offer shown to the user plus its rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: EligibilityRules,
}

impl Scheme {
    pub fn offer(&self) -> Offer {
        Offer {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemeCatalog {
    #[serde(default)]
    schemes: Vec<Scheme>,
}

impl SchemeCatalog {
    pub fn new(schemes: Vec<Scheme>) -> Self {
        Self { schemes }
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        serde_json::from_str(BUILTIN_CATALOG).context("Failed to parse built-in scheme catalog")
    }

    /// Load a catalog file, or the built-in catalog when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::builtin(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scheme catalog {}", path.display()))?;
        let catalog: SchemeCatalog = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scheme catalog {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            schemes = catalog.schemes.len(),
            "Loaded scheme catalog"
        );
        Ok(catalog)
    }

    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    pub fn get(&self, id: &str) -> Option<&Scheme> {
        self.schemes.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }

    pub fn eligible_for(&self, profile: &Profile) -> Vec<Offer> {
        self.schemes
            .iter()
            .filter(|s| s.rules.is_satisfied_by(profile))
            .map(Scheme::offer)
            .collect()
    }

    /// Free-text search: whole name/id mentioned in the query first, then
    /// individual query words against name, id, category and description.
    pub fn find(&self, query: &str) -> Vec<Offer> {
        let query = query.to_lowercase();

        let mentioned: Vec<Offer> = self
            .schemes
            .iter()
            .filter(|s| query.contains(&s.name.to_lowercase()) || query.contains(&s.id.to_lowercase()))
            .map(Scheme::offer)
            .collect();
        if !mentioned.is_empty() {
            return mentioned;
        }

        let words: Vec<&str> = query
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| w.chars().count() >= 3 && !SEARCH_STOPWORDS.contains(w))
            .collect();
        if words.is_empty() {
            return Vec::new();
        }

        self.schemes
            .iter()
            .filter(|s| {
                let name = s.name.to_lowercase();
                let category = s.category.to_lowercase();
                let description = s.description.to_lowercase();
                words.iter().any(|w| {
                    name.contains(w)
                        || s.id.contains(w)
                        || category == *w
                        || description.contains(w)
                })
            })
            .map(Scheme::offer)
            .collect()
    }
}

#[async_trait]
impl EligibilityEvaluator for SchemeCatalog {
    async fn evaluate(&self, profile: &Profile) -> Result<Vec<Offer>> {
        Ok(self.eligible_for(profile))
    }
}

#[async_trait]
impl OfferStore for SchemeCatalog {
    async fn lookup_by_id(&self, id: &str) -> Result<Option<Offer>> {
        Ok(self.get(id).map(Scheme::offer))
    }

    async fn search(&self, query: &str) -> Result<Vec<Offer>> {
        Ok(self.find(query))
    }
}
