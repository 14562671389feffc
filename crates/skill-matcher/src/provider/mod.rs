//! Similarity provider trait and implementations.
//!
//! A provider scores one query phrase against a batch of candidate phrases.
//! Two production variants are interchangeable behind [`SimilarityProvider`]:
//! - [`LocalEmbeddingProvider`]: cosine similarity of local dense embeddings.
//!   Exposes vectors, so a full refresh can embed every user once.
//! - [`RemoteSimilarityProvider`]: one hosted API call per query. No vectors,
//!   no reuse across requesters.
//!
//! Scores are only comparable within one provider.

mod local;
mod mock;
mod remote;

pub use local::LocalEmbeddingProvider;
pub use mock::MockProvider;
pub use remote::{RemoteProviderConfig, RemoteSimilarityProvider};

use async_trait::async_trait;
use thiserror::Error;

use skill_embeddings::{Embedding, EmbeddingError};

/// Failure to score one requester.
///
/// Never fatal to a batch run: the requester is skipped and its stored
/// suggestion is left as it was.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Similarity API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Similarity API rate limit exceeded")]
    RateLimited,

    #[error("Malformed similarity response: {0}")]
    Malformed(String),

    /// Provider returned a different number of scores than candidates sent
    #[error("Score count mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Blocking embedding task panicked or was cancelled
    #[error("Embedding task failed: {0}")]
    Task(String),

    #[error("Invalid provider configuration: {0}")]
    Config(String),
}

/// Scores candidate phrases against a query phrase.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    /// Short name for logs ("local", "remote", "mock").
    fn name(&self) -> &str;

    /// Score every candidate against `query`.
    ///
    /// `output[i]` is the similarity of `candidates[i]`; output length must
    /// equal `candidates.len()`.
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError>;

    /// Embed phrases for reuse across a whole refresh cycle.
    ///
    /// Providers that cannot expose vectors return `Ok(None)`, and callers
    /// fall back to [`score`](Self::score) per requester.
    async fn embed_phrases(
        &self,
        _phrases: &[String],
    ) -> Result<Option<Vec<Embedding>>, ProviderError> {
        Ok(None)
    }
}

/// Enforce the one-score-per-candidate contract.
pub fn check_score_count(expected: usize, scores: Vec<f32>) -> Result<Vec<f32>, ProviderError> {
    if scores.len() != expected {
        return Err(ProviderError::LengthMismatch {
            expected,
            actual: scores.len(),
        });
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_score_count() {
        assert_eq!(check_score_count(2, vec![0.1, 0.2]).unwrap(), vec![0.1, 0.2]);
        assert!(check_score_count(0, vec![]).unwrap().is_empty());

        match check_score_count(3, vec![0.1]) {
            Err(ProviderError::LengthMismatch { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected LengthMismatch, got {:?}", other),
        }
    }
}
