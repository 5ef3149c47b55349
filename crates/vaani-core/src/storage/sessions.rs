//! In-memory session store
//!
//! One independently lockable record per session id. Readers get cloned
//! snapshots; every mutation goes through an accessor so the record lock is
//! never held across an await point.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::agent::profile::{FieldValue, Profile};
use crate::constants::agent::DEFAULT_LANGUAGE;
use crate::error::AgentError;
use crate::schemes::Offer;

/// The single pending expectation a session has for the next utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum WaitingFor {
    /// A named profile field.
    Field(String),
    /// A yes/no decision on the last offers.
    Confirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Per-conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub language: String,
    pub profile: Profile,
    pub waiting_for: Option<WaitingFor>,
    pub last_offers: Vec<Offer>,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            language: language.into(),
            profile: Profile::default(),
            waiting_for: None,
            last_offers: Vec::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Session metadata for listings
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub language: String,
    pub waiting_for: Option<WaitingFor>,
    pub turns: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionInfo {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id.clone(),
            language: s.language.clone(),
            waiting_for: s.waiting_for.clone(),
            turns: s.history.len(),
            updated_at: s.updated_at,
        }
    }
}

/// Sole owner of all session records. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a fresh id
    pub fn create(&self, language: Option<&str>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(&id, language.unwrap_or(DEFAULT_LANGUAGE));
        self.insert(session);
        tracing::debug!(session_id = %id, "Session created");
        id
    }

    /// Insert a prepared session, replacing any record with the same id
    pub fn insert(&self, session: Session) {
        let id = session.id.clone();
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
    }

    pub fn exists(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Snapshot of a session, if it exists
    pub fn get(&self, id: &str) -> Option<Session> {
        let record = self.record(id)?;
        let session = record.lock().clone();
        Some(session)
    }

    /// List sessions, most recently updated first
    pub fn list(&self) -> Vec<SessionInfo> {
        let records: Vec<Arc<Mutex<Session>>> =
            self.sessions.iter().map(|e| e.value().clone()).collect();
        let mut infos: Vec<SessionInfo> = records
            .iter()
            .map(|r| SessionInfo::from(&*r.lock()))
            .collect();
        infos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        infos
    }

    pub fn set_waiting(&self, id: &str, waiting: Option<WaitingFor>) -> Result<(), AgentError> {
        self.update(id, |s| s.waiting_for = waiting)
    }

    pub fn append_history(
        &self,
        id: &str,
        role: Role,
        text: impl Into<String>,
    ) -> Result<(), AgentError> {
        let text = text.into();
        self.update(id, |s| {
            s.history.push(Turn {
                role,
                text,
                at: Utc::now(),
            })
        })
    }

    pub fn set_profile_field(
        &self,
        id: &str,
        field: &str,
        value: FieldValue,
    ) -> Result<(), AgentError> {
        self.update(id, |s| s.profile.set(field, value))
    }

    pub fn set_last_offers(&self, id: &str, offers: Vec<Offer>) -> Result<(), AgentError> {
        self.update(id, |s| s.last_offers = offers)
    }

    fn record(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        // Clone the Arc out so the map shard is released before locking.
        self.sessions.get(id).map(|e| e.value().clone())
    }

    fn update<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> Result<T, AgentError> {
        let record = self
            .record(id)
            .ok_or_else(|| AgentError::SessionNotFound(id.to_string()))?;
        let mut session = record.lock();
        let result = f(&mut *session);
        session.updated_at = Utc::now();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_returns_empty_session() {
        let store = SessionStore::new();
        let id = store.create(None);

        let session = store.get(&id).expect("session should exist");
        assert_eq!(session.language, "te");
        assert!(session.profile.is_empty());
        assert!(session.waiting_for.is_none());
        assert!(session.history.is_empty());
    }

    #[test]
    fn mutations_on_unknown_session_fail_without_creating_it() {
        let store = SessionStore::new();
        let err = store
            .set_waiting("missing", Some(WaitingFor::Confirmation))
            .unwrap_err();
        assert!(matches!(err, AgentError::SessionNotFound(id) if id == "missing"));
        assert!(!store.exists("missing"));
    }

    #[test]
    fn history_keeps_insertion_order() {
        let store = SessionStore::new();
        let id = store.create(Some("en"));
        store.append_history(&id, Role::User, "hello").unwrap();
        store.append_history(&id, Role::Assistant, "hi").unwrap();
        store.append_history(&id, Role::User, "bye").unwrap();

        let texts: Vec<String> = store
            .get(&id)
            .unwrap()
            .history
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["hello", "hi", "bye"]);
    }

    #[test]
    fn snapshots_do_not_alias_the_stored_record() {
        let store = SessionStore::new();
        let id = store.create(None);
        let mut snapshot = store.get(&id).unwrap();
        snapshot.waiting_for = Some(WaitingFor::Confirmation);

        assert!(store.get(&id).unwrap().waiting_for.is_none());
    }

    #[test]
    fn waiting_for_serializes_with_field_name() {
        let json = serde_json::to_value(WaitingFor::Field("age".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "field", "field": "age" }));
        let json = serde_json::to_value(WaitingFor::Confirmation).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "confirmation" }));
    }
}
