//! Key encoding for the storage layer.
//!
//! Key format: `{prefix}:{id}`
//! - prefix: `user` or `suggestion`
//! - id: the opaque user id, stored verbatim
//!
//! Ids are compared byte-wise, so a full scan of a column family always yields
//! the same order. That order is the population enumeration order.

use crate::error::StorageError;

const USER_PREFIX: &str = "user:";
const SUGGESTION_PREFIX: &str = "suggestion:";

fn parse_prefixed(bytes: &[u8], prefix: &str) -> Result<String, StorageError> {
    let s = std::str::from_utf8(bytes)
        .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
    match s.strip_prefix(prefix) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(StorageError::Key(format!("Invalid key format: {}", s))),
    }
}

/// Key for a user profile
/// Format: user:{user_id}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKey {
    pub user_id: String,
}

impl UserKey {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}{}", USER_PREFIX, self.user_id).into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        parse_prefixed(bytes, USER_PREFIX).map(Self::new)
    }
}

/// Key for a requester's suggestion record
/// Format: suggestion:{requester_id}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionKey {
    pub requester_id: String,
}

impl SuggestionKey {
    pub fn new(requester_id: impl Into<String>) -> Self {
        Self {
            requester_id: requester_id.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}{}", SUGGESTION_PREFIX, self.requester_id).into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        parse_prefixed(bytes, SUGGESTION_PREFIX).map(Self::new)
    }
}
