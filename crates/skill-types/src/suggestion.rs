//! Persisted match result for one requester.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SkillError;

/// Ordered list of matched candidate ids for a requester.
///
/// Written whole on every successful refresh. Scores are not stored, so the
/// order of `matches` is the only record of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub requester_id: String,

    /// Candidate ids, best match first
    pub matches: Vec<String>,

    /// When this record was last written
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Suggestion {
    /// Create a suggestion stamped with the current time.
    pub fn new(requester_id: impl Into<String>, matches: Vec<String>) -> Self {
        Self {
            requester_id: requester_id.into(),
            matches,
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SkillError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SkillError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
