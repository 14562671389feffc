//! Population loading and suggestion persistence seams.
//!
//! The engine reads profiles through [`PopulationSource`] and writes results
//! through [`SuggestionStore`]. Both are implemented for the RocksDB
//! [`Storage`] and for [`InMemoryStore`].

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;

use skill_storage::{Storage, StorageError};
use skill_types::{Suggestion, User};

/// Failure of a population read or suggestion write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to user profiles.
///
/// Enumeration order is the store's key order and must be stable between
/// calls; ranking ties fall back to it.
pub trait PopulationSource: Send + Sync {
    fn get_all_users(&self) -> Result<Vec<User>, StoreError>;

    /// Users eligible to appear as candidates.
    fn get_visible_users(&self) -> Result<Vec<User>, StoreError>;

    fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError>;
}

/// Per-requester suggestion persistence.
pub trait SuggestionStore: Send + Sync {
    /// Upsert the suggestion for `requester_id`.
    ///
    /// Replaces any previous record in full. An empty list is valid and
    /// clears a stale result.
    fn save_suggestions(&self, requester_id: &str, candidate_ids: &[String]) -> Result<(), StoreError>;

    fn get_suggestion(&self, requester_id: &str) -> Result<Option<Suggestion>, StoreError>;
}

impl PopulationSource for Storage {
    fn get_all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(Storage::get_all_users(self)?)
    }

    fn get_visible_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(Storage::get_visible_users(self)?)
    }

    fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.get_user(user_id)?)
    }
}

impl SuggestionStore for Storage {
    fn save_suggestions(&self, requester_id: &str, candidate_ids: &[String]) -> Result<(), StoreError> {
        let suggestion = Suggestion::new(requester_id, candidate_ids.to_vec());
        self.put_suggestion(&suggestion)?;
        Ok(())
    }

    fn get_suggestion(&self, requester_id: &str) -> Result<Option<Suggestion>, StoreError> {
        Ok(Storage::get_suggestion(self, requester_id)?)
    }
}

/// Process-local store for tests and dry runs.
///
/// Users enumerate in id order, the same order RocksDB keys give.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<BTreeMap<String, User>>,
    suggestions: RwLock<HashMap<String, Suggestion>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            // Fresh lock, cannot be poisoned
            if let Ok(mut map) = store.users.write() {
                map.insert(user.user_id.clone(), user);
            }
        }
        store
    }

    pub fn put_user(&self, user: User) -> Result<(), StoreError> {
        self.users
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .insert(user.user_id.clone(), user);
        Ok(())
    }

    pub fn suggestion_count(&self) -> usize {
        self.suggestions.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl PopulationSource for InMemoryStore {
    fn get_all_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(users.values().cloned().collect())
    }

    fn get_visible_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(users.values().filter(|u| u.is_visible()).cloned().collect())
    }

    fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(users.get(user_id).cloned())
    }
}

impl SuggestionStore for InMemoryStore {
    fn save_suggestions(&self, requester_id: &str, candidate_ids: &[String]) -> Result<(), StoreError> {
        let suggestion = Suggestion::new(requester_id, candidate_ids.to_vec());
        self.suggestions
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .insert(requester_id.to_string(), suggestion);
        debug!(requester = %requester_id, count = candidate_ids.len(), "Saved suggestion in memory");
        Ok(())
    }

    fn get_suggestion(&self, requester_id: &str) -> Result<Option<Suggestion>, StoreError> {
        let suggestions = self
            .suggestions
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(suggestions.get(requester_id).cloned())
    }
}
