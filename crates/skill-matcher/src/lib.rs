//! # skill-matcher
//!
//! Matching engine for skill-exchange suggestions.
//!
//! Pipeline: population loader, normalizer, similarity provider, ranker,
//! suggestion store, driven by [`RefreshOrchestrator`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skill_matcher::{InMemoryStore, MockProvider, RefreshConfig, RefreshOrchestrator};
//! use skill_types::User;
//!
//! # async fn run() -> Result<(), skill_matcher::MatchError> {
//! let store = Arc::new(InMemoryStore::with_users(vec![
//!     User::new("a", vec!["Python".into()], vec!["Yoga".into()]),
//!     User::new("b", vec!["Yoga".into()], vec!["Python".into()]),
//! ]));
//! let orchestrator = RefreshOrchestrator::new(
//!     Arc::new(MockProvider::new()),
//!     store.clone(),
//!     store,
//!     RefreshConfig::default(),
//! );
//! let outcome = orchestrator.refresh_user("a").await?;
//! assert_eq!(outcome.matches(), ["b".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod provider;
pub mod ranker;
pub mod store;

pub use error::MatchError;
pub use normalize::{offered_phrase, skill_phrase, wanted_phrase, EMPTY_SKILLS_SENTINEL};
pub use orchestrator::{RefreshConfig, RefreshOrchestrator, RefreshOutcome, RefreshStats};
pub use provider::{
    LocalEmbeddingProvider, MockProvider, ProviderError, RemoteProviderConfig,
    RemoteSimilarityProvider, SimilarityProvider,
};
pub use ranker::{rank, ScoredCandidate, DEFAULT_TOP_K};
pub use store::{InMemoryStore, PopulationSource, SuggestionStore, StoreError};
