//! Deterministic provider for tests and offline dry runs.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::normalize::PHRASE_SEPARATOR;

use super::{ProviderError, SimilarityProvider};

/// Scores phrases without a model or network.
///
/// Pairs registered with [`with_score`](Self::with_score) return that score;
/// anything else scores by Jaccard overlap of the comma-separated skills,
/// compared case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct MockProvider {
    scores: HashMap<(String, String), f32>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the score of `candidate` against `query`.
    pub fn with_score(
        mut self,
        query: impl Into<String>,
        candidate: impl Into<String>,
        score: f32,
    ) -> Self {
        self.scores.insert((query.into(), candidate.into()), score);
        self
    }

    fn overlap(query: &str, candidate: &str) -> f32 {
        let q = skill_set(query);
        let c = skill_set(candidate);
        let union = q.union(&c).count();
        if union == 0 {
            return 0.0;
        }
        q.intersection(&c).count() as f32 / union as f32
    }
}

fn skill_set(phrase: &str) -> BTreeSet<String> {
    phrase
        .split(PHRASE_SEPARATOR.trim())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl SimilarityProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
        Ok(candidates
            .iter()
            .map(|c| {
                self.scores
                    .get(&(query.to_string(), c.clone()))
                    .copied()
                    .unwrap_or_else(|| Self::overlap(query, c))
            })
            .collect())
    }
}
