//! RocksDB wrapper for skill-match storage.
//!
//! Provides:
//! - Database open with column family setup
//! - Profile reads (single, full scan, visibility-filtered scan)
//! - Batched profile imports
//! - Suggestion upserts that replace the whole record

use rocksdb::{ColumnFamily, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use tracing::{debug, info};

use skill_types::{Suggestion, User};

use crate::column_families::{build_cf_descriptors, ALL_CF_NAMES, CF_SUGGESTIONS, CF_USERS};
use crate::error::StorageError;
use crate::keys::{SuggestionKey, UserKey};

/// Main storage interface for skill-match
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating it if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(2);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;
        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    // ==================== User Methods ====================

    /// Insert or replace a user profile.
    pub fn put_user(&self, user: &User) -> Result<(), StorageError> {
        let cf = self.cf(CF_USERS)?;
        let key = UserKey::new(&user.user_id);
        self.db.put_cf(cf, key.to_bytes(), user.to_bytes()?)?;
        debug!(user_id = %user.user_id, "Stored user");
        Ok(())
    }

    /// Insert or replace many profiles in one atomic batch.
    ///
    /// Returns the number of profiles written.
    pub fn put_users(&self, users: &[User]) -> Result<usize, StorageError> {
        let cf = self.cf(CF_USERS)?;
        let mut batch = WriteBatch::default();
        for user in users {
            batch.put_cf(cf, UserKey::new(&user.user_id).to_bytes(), user.to_bytes()?);
        }
        self.db.write(batch)?;
        debug!(count = users.len(), "Stored user batch");
        Ok(users.len())
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        let cf = self.cf(CF_USERS)?;
        match self.db.get_cf(cf, UserKey::new(user_id).to_bytes())? {
            Some(bytes) => Ok(Some(User::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All profiles in key order.
    pub fn get_all_users(&self) -> Result<Vec<User>, StorageError> {
        self.scan_users(|_| true)
    }

    /// Public profiles in key order.
    pub fn get_visible_users(&self) -> Result<Vec<User>, StorageError> {
        self.scan_users(User::is_visible)
    }

    fn scan_users(&self, keep: impl Fn(&User) -> bool) -> Result<Vec<User>, StorageError> {
        let cf = self.cf(CF_USERS)?;
        let mut users = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let key = UserKey::from_bytes(&key)?;
            let user = User::from_bytes(&value)?;
            if user.user_id != key.user_id {
                return Err(StorageError::Key(format!(
                    "user record {} stored under key {}",
                    user.user_id, key.user_id
                )));
            }
            if keep(&user) {
                users.push(user);
            }
        }
        Ok(users)
    }

    // ==================== Suggestion Methods ====================

    /// Write a requester's suggestion, replacing any previous record in full.
    pub fn put_suggestion(&self, suggestion: &Suggestion) -> Result<(), StorageError> {
        let cf = self.cf(CF_SUGGESTIONS)?;
        let key = SuggestionKey::new(&suggestion.requester_id);
        self.db.put_cf(cf, key.to_bytes(), suggestion.to_bytes()?)?;
        debug!(
            requester = %suggestion.requester_id,
            matches = suggestion.matches.len(),
            "Stored suggestion"
        );
        Ok(())
    }

    pub fn get_suggestion(&self, requester_id: &str) -> Result<Option<Suggestion>, StorageError> {
        let cf = self.cf(CF_SUGGESTIONS)?;
        match self.db.get_cf(cf, SuggestionKey::new(requester_id).to_bytes())? {
            Some(bytes) => Ok(Some(Suggestion::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    // ==================== Maintenance ====================

    /// Flush all column families to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            self.db.flush_cf(self.cf(cf_name)?)?;
        }
        Ok(())
    }

    /// Count profiles and suggestions.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let mut stats = StorageStats::default();

        for item in self.db.iterator_cf(self.cf(CF_USERS)?, IteratorMode::Start) {
            let (_, value) = item?;
            stats.user_count += 1;
            if User::from_bytes(&value)?.is_visible() {
                stats.visible_user_count += 1;
            }
        }

        for item in self
            .db
            .iterator_cf(self.cf(CF_SUGGESTIONS)?, IteratorMode::Start)
        {
            item?;
            stats.suggestion_count += 1;
        }

        Ok(stats)
    }
}

/// Database statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub user_count: u64,
    pub visible_user_count: u64,
    pub suggestion_count: u64,
}
