//! Column family definitions for RocksDB.
//!
//! - users: profile documents, read by every refresh
//! - suggestions: one record per requester, overwritten on each refresh

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for user profiles
pub const CF_USERS: &str = "users";

/// Column family name for persisted suggestions
pub const CF_SUGGESTIONS: &str = "suggestions";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_USERS, CF_SUGGESTIONS];

fn users_options() -> Options {
    let mut opts = Options::default();
    // Profiles are read far more often than written
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_USERS, users_options()),
        ColumnFamilyDescriptor::new(CF_SUGGESTIONS, Options::default()),
    ]
}
