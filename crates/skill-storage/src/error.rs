//! Storage layer error types.

use thiserror::Error;

use skill_types::SkillError;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Key encoding/decoding error
    #[error("Key error: {0}")]
    Key(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<SkillError> for StorageError {
    fn from(err: SkillError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
