//! Error types for the matching engine.

use thiserror::Error;

use crate::provider::ProviderError;
use crate::store::StoreError;

/// Errors raised while refreshing suggestions.
///
/// In a full-population run only `PopulationLoad` and `Vectorize` abort the
/// run. `Provider`, `Persistence` and `SelfCandidate` are counted and logged
/// instead.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Missing or invalid settings, raised before any work starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Similarity provider failed for requester {requester}: {source}")]
    Provider {
        requester: String,
        source: ProviderError,
    },

    #[error("Failed to persist suggestion for requester {requester}: {source}")]
    Persistence {
        requester: String,
        source: StoreError,
    },

    #[error("Failed to load population: {0}")]
    PopulationLoad(#[source] StoreError),

    #[error("Batch vectorization failed: {0}")]
    Vectorize(#[source] ProviderError),

    /// The requester was passed to the ranker as one of its own candidates
    #[error("Requester {0} appears among its own candidates")]
    SelfCandidate(String),
}

impl From<skill_types::SkillError> for MatchError {
    fn from(err: skill_types::SkillError) -> Self {
        MatchError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_requester() {
        let provider = MatchError::Provider {
            requester: "u1".to_string(),
            source: ProviderError::RateLimited,
        };
        assert!(provider.to_string().contains("u1"));

        let load = MatchError::PopulationLoad(StoreError::Unavailable("down".to_string()));
        assert!(load.to_string().contains("down"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: MatchError = skill_types::SkillError::Config("top_k must be > 0".to_string()).into();
        assert!(matches!(err, MatchError::Configuration(msg) if msg.contains("top_k")));
    }
}
