//! Storage layer for skill-match.
//!
//! RocksDB-backed store with:
//! - Column family isolation for user profiles and suggestions
//! - Id-prefixed keys, so iteration order is stable across runs
//! - Whole-record upserts for suggestions (a write replaces, never merges)
//! - Batched profile imports via WriteBatch

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{SuggestionKey, UserKey};
