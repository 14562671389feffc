//! # skill-types
//!
//! Shared domain types for the skill-match system.
//!
//! - Users: read-only profiles with offered/wanted skill lists and visibility
//! - Suggestions: the persisted, ordered match result for one requester
//! - Settings: layered configuration for the refresh tooling
//!
//! ## Usage
//!
//! ```rust
//! use skill_types::{User, Visibility};
//!
//! let user = User::new("u1", vec!["Rust".into()], vec!["Go".into()]);
//! assert_eq!(user.visibility, Visibility::Public);
//! ```

pub mod config;
pub mod error;
pub mod suggestion;
pub mod user;

pub use config::{
    EmbeddingSettings, EmptyPopulationPolicy, MatchingSettings, ProviderKind, RemoteSettings,
    Settings,
};
pub use error::SkillError;
pub use suggestion::Suggestion;
pub use user::{User, Visibility};
