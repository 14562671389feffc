//! Suggestion refresh workflows.
//!
//! Two entry points:
//! - [`RefreshOrchestrator::refresh_user`]: one requester, errors propagate.
//! - [`RefreshOrchestrator::refresh_all`]: every stored user as requester,
//!   private ones included. Per-requester failures are logged and counted,
//!   never fatal.
//!
//! Candidates are always the visible users other than the requester.
//!
//! A full run goes LOAD_POPULATION, then VECTORIZE_ALL when the provider
//! exposes vectors, then NORMALIZE, SCORE, RANK and PERSIST for each requester.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use skill_embeddings::Embedding;
use skill_types::{EmptyPopulationPolicy, MatchingSettings, User};

use crate::error::MatchError;
use crate::normalize::{offered_phrase, wanted_phrase};
use crate::provider::{check_score_count, ProviderError, SimilarityProvider};
use crate::ranker::{rank, ScoredCandidate, DEFAULT_TOP_K};
use crate::store::{PopulationSource, SuggestionStore};

/// Refresh loop configuration
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Maximum candidates kept per suggestion
    pub top_k: usize,
    /// What to do when a requester has no one to compare against
    pub empty_population: EmptyPopulationPolicy,
    /// Requesters in flight at once during a full refresh
    pub concurrency: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            empty_population: EmptyPopulationPolicy::PersistEmpty,
            concurrency: 1,
        }
    }
}

impl From<&MatchingSettings> for RefreshConfig {
    fn from(settings: &MatchingSettings) -> Self {
        Self {
            top_k: settings.top_k,
            empty_population: settings.empty_population,
            concurrency: settings.concurrency.max(1),
        }
    }
}

/// Result of refreshing one requester.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Ranked candidate ids, best first, as persisted
    Matched(Vec<String>),
    /// No candidates existed. `persisted` is true when an empty suggestion was written.
    EmptyPopulation { persisted: bool },
}

impl RefreshOutcome {
    /// Matched ids; empty when there was no one to match against.
    pub fn matches(&self) -> &[String] {
        match self {
            RefreshOutcome::Matched(ids) => ids,
            RefreshOutcome::EmptyPopulation { .. } => &[],
        }
    }
}

/// Statistics from a full-population refresh
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshStats {
    /// Requesters attempted
    pub requesters: usize,
    /// Suggestions written, including empty ones
    pub persisted: usize,
    /// Requesters with no candidates
    pub empty: usize,
    pub provider_failures: usize,
    pub persistence_failures: usize,
    pub rank_failures: usize,
}

impl RefreshStats {
    /// Total requesters skipped because of an error
    pub fn failures(&self) -> usize {
        self.provider_failures + self.persistence_failures + self.rank_failures
    }

    fn record(&mut self, result: &Result<RefreshOutcome, MatchError>) {
        self.requesters += 1;
        match result {
            Ok(RefreshOutcome::Matched(_)) => self.persisted += 1,
            Ok(RefreshOutcome::EmptyPopulation { persisted }) => {
                self.empty += 1;
                if *persisted {
                    self.persisted += 1;
                }
            }
            Err(MatchError::Persistence { .. }) => self.persistence_failures += 1,
            Err(MatchError::SelfCandidate(_)) => self.rank_failures += 1,
            Err(_) => self.provider_failures += 1,
        }
    }
}

/// Offered vectors for every candidate and wanted vectors for every
/// requester, built once per run.
struct VectorCache {
    offered_index: HashMap<String, usize>,
    offered: Vec<Embedding>,
    wanted_index: HashMap<String, usize>,
    wanted: Vec<Embedding>,
}

fn index_by_id(users: &[&User]) -> HashMap<String, usize> {
    users
        .iter()
        .enumerate()
        .map(|(i, u)| (u.user_id.clone(), i))
        .collect()
}

impl VectorCache {
    /// `vectors` holds the candidates' offered vectors followed by the
    /// requesters' wanted vectors.
    fn build(
        candidates: &[&User],
        requesters: &[User],
        vectors: Vec<Embedding>,
    ) -> Result<Self, ProviderError> {
        let expected = candidates.len() + requesters.len();
        if vectors.len() != expected {
            return Err(ProviderError::LengthMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        let mut offered = vectors;
        let wanted = offered.split_off(candidates.len());
        let requester_refs: Vec<&User> = requesters.iter().collect();
        Ok(Self {
            offered_index: index_by_id(candidates),
            offered,
            wanted_index: index_by_id(&requester_refs),
            wanted,
        })
    }

    fn score(&self, requester: &User, candidates: &[&User]) -> Result<Vec<f32>, ProviderError> {
        let lookup = |index: &HashMap<String, usize>, id: &str| {
            index.get(id).copied().ok_or_else(|| {
                ProviderError::Malformed(format!("no cached vector for user {}", id))
            })
        };
        let query = &self.wanted[lookup(&self.wanted_index, &requester.user_id)?];
        candidates
            .iter()
            .map(|c| {
                lookup(&self.offered_index, &c.user_id)
                    .map(|i| query.cosine_similarity(&self.offered[i]))
            })
            .collect()
    }
}

/// Drives suggestion refreshes against injected collaborators.
pub struct RefreshOrchestrator {
    provider: Arc<dyn SimilarityProvider>,
    population: Arc<dyn PopulationSource>,
    store: Arc<dyn SuggestionStore>,
    config: RefreshConfig,
}

impl RefreshOrchestrator {
    pub fn new(
        provider: Arc<dyn SimilarityProvider>,
        population: Arc<dyn PopulationSource>,
        store: Arc<dyn SuggestionStore>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            provider,
            population,
            store,
            config,
        }
    }

    /// Refresh the suggestion of one requester.
    ///
    /// The requester may be private; candidates are the visible users other
    /// than the requester. Any failure is returned, and on failure the stored
    /// suggestion is left untouched.
    pub async fn refresh_user(&self, user_id: &str) -> Result<RefreshOutcome, MatchError> {
        let requester = self
            .population
            .get_user_by_id(user_id)
            .map_err(MatchError::PopulationLoad)?
            .ok_or_else(|| MatchError::UserNotFound(user_id.to_string()))?;

        let visible = self
            .population
            .get_visible_users()
            .map_err(MatchError::PopulationLoad)?;
        let candidates: Vec<&User> = visible
            .iter()
            .filter(|u| u.user_id != requester.user_id)
            .collect();

        let outcome = self.refresh_requester(&requester, &candidates, None).await?;
        info!(
            requester = %requester.user_id,
            provider = self.provider.name(),
            matches = outcome.matches().len(),
            "Refreshed suggestion"
        );
        Ok(outcome)
    }

    /// Refresh every user's suggestion.
    ///
    /// Fails only when the population cannot be loaded or batch vectorization
    /// fails, both before any requester is processed.
    pub async fn refresh_all(&self) -> Result<RefreshStats, MatchError> {
        let requesters = self
            .population
            .get_all_users()
            .map_err(MatchError::PopulationLoad)?;
        let visible: Vec<&User> = requesters.iter().filter(|u| u.is_visible()).collect();
        info!(
            users = requesters.len(),
            visible = visible.len(),
            provider = self.provider.name(),
            concurrency = self.config.concurrency,
            "Starting full refresh"
        );

        let cache = self.vectorize_all(&visible, &requesters).await?;
        let cache = cache.as_ref();
        let visible_ref = &visible;

        let results: Vec<Result<RefreshOutcome, MatchError>> = stream::iter(requesters.iter())
            .map(move |requester| async move {
                let candidates: Vec<&User> = visible_ref
                    .iter()
                    .copied()
                    .filter(|u| u.user_id != requester.user_id)
                    .collect();
                let result = self.refresh_requester(requester, &candidates, cache).await;
                match &result {
                    Ok(outcome) => debug!(
                        requester = %requester.user_id,
                        matches = outcome.matches().len(),
                        "Refreshed suggestion"
                    ),
                    Err(e) => warn!(
                        requester = %requester.user_id,
                        error = %e,
                        "Skipping requester"
                    ),
                }
                result
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut stats = RefreshStats::default();
        for result in &results {
            stats.record(result);
        }

        info!(
            requesters = stats.requesters,
            persisted = stats.persisted,
            empty = stats.empty,
            failures = stats.failures(),
            "Full refresh complete"
        );
        Ok(stats)
    }

    /// Embed candidates' offered phrases and requesters' wanted phrases in one
    /// batch.
    ///
    /// Returns `None` when the provider does not expose vectors.
    async fn vectorize_all(
        &self,
        candidates: &[&User],
        requesters: &[User],
    ) -> Result<Option<VectorCache>, MatchError> {
        if requesters.is_empty() {
            return Ok(None);
        }

        let phrases: Vec<String> = candidates
            .iter()
            .map(|u| offered_phrase(u))
            .chain(requesters.iter().map(wanted_phrase))
            .collect();

        let vectors = match self
            .provider
            .embed_phrases(&phrases)
            .await
            .map_err(MatchError::Vectorize)?
        {
            Some(vectors) => vectors,
            None => {
                debug!(provider = self.provider.name(), "Provider has no vectors, scoring per requester");
                return Ok(None);
            }
        };

        let cache =
            VectorCache::build(candidates, requesters, vectors).map_err(MatchError::Vectorize)?;
        info!(
            candidates = candidates.len(),
            requesters = requesters.len(),
            "Vectorized population"
        );
        Ok(Some(cache))
    }

    async fn refresh_requester(
        &self,
        requester: &User,
        candidates: &[&User],
        cache: Option<&VectorCache>,
    ) -> Result<RefreshOutcome, MatchError> {
        if candidates.is_empty() {
            return self.handle_empty(&requester.user_id);
        }

        let scores = match cache {
            Some(cache) => cache.score(requester, candidates),
            None => {
                let query = wanted_phrase(requester);
                let phrases: Vec<String> = candidates.iter().map(|c| offered_phrase(c)).collect();
                self.provider.score(&query, &phrases).await
            }
        }
        .and_then(|scores| check_score_count(candidates.len(), scores))
        .map_err(|source| MatchError::Provider {
            requester: requester.user_id.clone(),
            source,
        })?;

        let scored = candidates
            .iter()
            .zip(scores)
            .map(|(c, score)| ScoredCandidate::new(c.user_id.clone(), score))
            .collect();
        let ranked = rank(&requester.user_id, scored, self.config.top_k)?;

        self.persist(&requester.user_id, &ranked)?;
        Ok(RefreshOutcome::Matched(ranked))
    }

    fn handle_empty(&self, requester_id: &str) -> Result<RefreshOutcome, MatchError> {
        match self.config.empty_population {
            EmptyPopulationPolicy::PersistEmpty => {
                self.persist(requester_id, &[])?;
                Ok(RefreshOutcome::EmptyPopulation { persisted: true })
            }
            EmptyPopulationPolicy::Skip => {
                debug!(requester = %requester_id, "No candidates, leaving suggestion as is");
                Ok(RefreshOutcome::EmptyPopulation { persisted: false })
            }
        }
    }

    fn persist(&self, requester_id: &str, ids: &[String]) -> Result<(), MatchError> {
        self.store
            .save_suggestions(requester_id, ids)
            .map_err(|source| MatchError::Persistence {
                requester: requester_id.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use skill_types::{Suggestion, Visibility};

    use crate::provider::MockProvider;
    use crate::store::{InMemoryStore, StoreError};

    fn user(id: &str, offered: &[&str], wanted: &[&str]) -> User {
        User::new(
            id,
            offered.iter().map(|s| s.to_string()).collect(),
            wanted.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn orchestrator(
        provider: impl SimilarityProvider + 'static,
        store: &Arc<InMemoryStore>,
        config: RefreshConfig,
    ) -> RefreshOrchestrator {
        RefreshOrchestrator::new(Arc::new(provider), store.clone(), store.clone(), config)
    }

    fn stored(store: &InMemoryStore, id: &str) -> Option<Vec<String>> {
        store.get_suggestion(id).unwrap().map(|s| s.matches)
    }

    /// Returns one score too few whenever the query matches `bad_query`.
    struct ShortProvider {
        bad_query: String,
    }

    #[async_trait]
    impl SimilarityProvider for ShortProvider {
        fn name(&self) -> &str {
            "short"
        }

        async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
            let mut scores = MockProvider::new().score(query, candidates).await?;
            if query == self.bad_query {
                scores.pop();
            }
            Ok(scores)
        }
    }

    /// Serves vectors from a fixed table and counts score calls.
    struct VectorProvider {
        table: HashMap<String, Vec<f32>>,
        score_calls: AtomicUsize,
        embed_calls: AtomicUsize,
    }

    impl VectorProvider {
        fn new(table: &[(&str, [f32; 2])]) -> Self {
            Self {
                table: table.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect(),
                score_calls: AtomicUsize::new(0),
                embed_calls: AtomicUsize::new(0),
            }
        }

        fn vector(&self, phrase: &str) -> Embedding {
            Embedding::new(self.table.get(phrase).cloned().unwrap_or(vec![0.0, 1.0]))
        }
    }

    #[async_trait]
    impl SimilarityProvider for VectorProvider {
        fn name(&self) -> &str {
            "vectors"
        }

        async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
            self.score_calls.fetch_add(1, Ordering::SeqCst);
            let q = self.vector(query);
            Ok(candidates.iter().map(|c| q.cosine_similarity(&self.vector(c))).collect())
        }

        async fn embed_phrases(
            &self,
            phrases: &[String],
        ) -> Result<Option<Vec<Embedding>>, ProviderError> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(phrases.iter().map(|p| self.vector(p)).collect()))
        }
    }

    /// Fails vectorization outright.
    struct BrokenVectors;

    #[async_trait]
    impl SimilarityProvider for BrokenVectors {
        fn name(&self) -> &str {
            "broken"
        }

        async fn score(&self, _query: &str, _candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Transport("unreachable".to_string()))
        }

        async fn embed_phrases(
            &self,
            _phrases: &[String],
        ) -> Result<Option<Vec<Embedding>>, ProviderError> {
            Err(ProviderError::Transport("unreachable".to_string()))
        }
    }

    /// Delegates to an in-memory store but refuses writes for one requester.
    struct FlakyStore {
        inner: Arc<InMemoryStore>,
        reject: String,
    }

    impl SuggestionStore for FlakyStore {
        fn save_suggestions(&self, requester_id: &str, candidate_ids: &[String]) -> Result<(), StoreError> {
            if requester_id == self.reject {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.save_suggestions(requester_id, candidate_ids)
        }

        fn get_suggestion(&self, requester_id: &str) -> Result<Option<Suggestion>, StoreError> {
            self.inner.get_suggestion(requester_id)
        }
    }

    /// Population that cannot be read.
    struct DownSource;

    impl PopulationSource for DownSource {
        fn get_all_users(&self) -> Result<Vec<User>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn get_visible_users(&self) -> Result<Vec<User>, StoreError> {
            self.get_all_users()
        }

        fn get_user_by_id(&self, _user_id: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_refresh_user_ranks_by_score() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Yoga"], &[]),
            user("b", &["Python", "Go"], &[]),
            user("r", &["Cooking"], &["Python"]),
        ]));
        let provider = MockProvider::new()
            .with_score("Python", "Python, Go", 0.9)
            .with_score("Python", "Yoga", 0.05);

        let outcome = orchestrator(provider, &store, RefreshConfig::default())
            .refresh_user("r")
            .await
            .unwrap();

        assert_eq!(outcome, RefreshOutcome::Matched(ids(&["b", "a"])));
        assert_eq!(stored(&store, "r"), Some(ids(&["b", "a"])));
    }

    #[tokio::test]
    async fn test_refresh_user_not_found() {
        let store = Arc::new(InMemoryStore::with_users(vec![user("a", &["Go"], &[])]));
        let result = orchestrator(MockProvider::new(), &store, RefreshConfig::default())
            .refresh_user("ghost")
            .await;

        assert!(matches!(result, Err(MatchError::UserNotFound(id)) if id == "ghost"));
        assert_eq!(store.suggestion_count(), 0);
    }

    #[tokio::test]
    async fn test_private_users_are_not_candidates() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Python"], &[]),
            user("p", &["Python"], &[]).with_visibility(Visibility::Private),
            user("q", &[], &["Python"]).with_visibility(Visibility::Private),
        ]));

        // A private requester still gets matches
        let outcome = orchestrator(MockProvider::new(), &store, RefreshConfig::default())
            .refresh_user("q")
            .await
            .unwrap();
        assert_eq!(outcome.matches(), ids(&["a"]).as_slice());
    }

    #[tokio::test]
    async fn test_only_self_yields_empty_suggestion() {
        let store = Arc::new(InMemoryStore::with_users(vec![user("r", &["Go"], &["Python"])]));
        store.save_suggestions("r", &ids(&["stale"])).unwrap();

        let outcome = orchestrator(MockProvider::new(), &store, RefreshConfig::default())
            .refresh_user("r")
            .await
            .unwrap();

        assert_eq!(outcome, RefreshOutcome::EmptyPopulation { persisted: true });
        assert_eq!(stored(&store, "r"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_skip_policy_leaves_suggestion_alone() {
        let store = Arc::new(InMemoryStore::with_users(vec![user("r", &["Go"], &["Python"])]));
        store.save_suggestions("r", &ids(&["stale"])).unwrap();
        let config = RefreshConfig {
            empty_population: EmptyPopulationPolicy::Skip,
            ..Default::default()
        };

        let outcome = orchestrator(MockProvider::new(), &store, config)
            .refresh_user("r")
            .await
            .unwrap();

        assert_eq!(outcome, RefreshOutcome::EmptyPopulation { persisted: false });
        assert_eq!(stored(&store, "r"), Some(ids(&["stale"])));
    }

    #[tokio::test]
    async fn test_short_scores_keep_stale_suggestion() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Go"], &["Rust"]),
            user("b", &["Rust"], &["Go"]),
            user("r", &["Yoga"], &["Python"]),
        ]));
        store.save_suggestions("r", &ids(&["old"])).unwrap();
        let provider = ShortProvider {
            bad_query: "Python".to_string(),
        };

        let result = orchestrator(provider, &store, RefreshConfig::default())
            .refresh_user("r")
            .await;
        assert!(matches!(
            result,
            Err(MatchError::Provider {
                source: ProviderError::LengthMismatch { expected: 2, actual: 1 },
                ..
            })
        ));
        assert_eq!(stored(&store, "r"), Some(ids(&["old"])));
    }

    #[tokio::test]
    async fn test_refresh_all_isolates_provider_failure() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Go"], &["Rust"]),
            user("b", &["Rust"], &["Go"]),
            user("r", &["Yoga"], &["Python"]),
        ]));
        store.save_suggestions("r", &ids(&["old"])).unwrap();
        let provider = ShortProvider {
            bad_query: "Python".to_string(),
        };

        let stats = orchestrator(provider, &store, RefreshConfig::default())
            .refresh_all()
            .await
            .unwrap();

        assert_eq!(stats.requesters, 3);
        assert_eq!(stats.persisted, 2);
        assert_eq!(stats.provider_failures, 1);
        assert_eq!(stored(&store, "r"), Some(ids(&["old"])));
        assert_eq!(stored(&store, "a"), Some(ids(&["b", "r"])));
    }

    #[tokio::test]
    async fn test_refresh_all_isolates_persistence_failure() {
        let inner = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Go"], &["Rust"]),
            user("b", &["Rust"], &["Go"]),
        ]));
        let store = Arc::new(FlakyStore {
            inner: inner.clone(),
            reject: "a".to_string(),
        });
        let orchestrator = RefreshOrchestrator::new(
            Arc::new(MockProvider::new()),
            inner.clone(),
            store,
            RefreshConfig::default(),
        );

        let stats = orchestrator.refresh_all().await.unwrap();
        assert_eq!(stats.persistence_failures, 1);
        assert_eq!(stats.persisted, 1);
        assert_eq!(stored(&inner, "a"), None);
        assert_eq!(stored(&inner, "b"), Some(ids(&["a"])));
    }

    #[tokio::test]
    async fn test_refresh_all_is_idempotent() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Python", "Go"], &["Yoga"]),
            user("b", &["Yoga"], &["Python"]),
            user("c", &["Go"], &["Go", "Yoga"]),
            user("d", &[], &[]),
        ]));
        let orchestrator = orchestrator(MockProvider::new(), &store, RefreshConfig::default());

        orchestrator.refresh_all().await.unwrap();
        let first: Vec<_> = ["a", "b", "c", "d"].iter().map(|id| stored(&store, id)).collect();
        orchestrator.refresh_all().await.unwrap();
        let second: Vec<_> = ["a", "b", "c", "d"].iter().map(|id| stored(&store, id)).collect();

        assert_eq!(first, second);
        for (id, matches) in ["a", "b", "c", "d"].iter().zip(&first) {
            let matches = matches.as_ref().unwrap();
            assert_eq!(matches.len(), 3);
            assert!(!matches.iter().any(|m| m == id));
        }
    }

    #[tokio::test]
    async fn test_ties_follow_population_order() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("d", &["Go"], &[]),
            user("b", &["Go"], &[]),
            user("c", &["Go"], &[]),
            user("a", &[], &["Go"]),
        ]));

        orchestrator(MockProvider::new(), &store, RefreshConfig::default())
            .refresh_user("a")
            .await
            .unwrap();
        assert_eq!(stored(&store, "a"), Some(ids(&["b", "c", "d"])));
    }

    #[tokio::test]
    async fn test_top_k_truncation() {
        let mut users = vec![user("r", &[], &["Python"])];
        let mut provider = MockProvider::new();
        for i in 0..25 {
            let skill = format!("skill{:02}", i);
            provider = provider.with_score("Python", skill.clone(), i as f32 / 100.0);
            users.push(user(&format!("u{:02}", i), &[skill.as_str()], &[]));
        }
        let store = Arc::new(InMemoryStore::with_users(users));

        let outcome = orchestrator(provider, &store, RefreshConfig::default())
            .refresh_user("r")
            .await
            .unwrap();

        let expected: Vec<String> = (5..25).rev().map(|i| format!("u{:02}", i)).collect();
        assert_eq!(outcome.matches(), expected.as_slice());
    }

    #[tokio::test]
    async fn test_refresh_all_covers_private_requesters() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("hidden", &["Python"], &["Go"]).with_visibility(Visibility::Private),
            user("open", &["Go"], &["Python"]),
            user("other", &["Python"], &["Go"]),
        ]));

        let stats = orchestrator(MockProvider::new(), &store, RefreshConfig::default())
            .refresh_all()
            .await
            .unwrap();

        assert_eq!(stats.requesters, 3);
        assert_eq!(stats.persisted, 3);
        assert_eq!(stored(&store, "hidden"), Some(ids(&["open", "other"])));
        assert_eq!(stored(&store, "open"), Some(ids(&["other"])));
        assert_eq!(stored(&store, "other"), Some(ids(&["open"])));
    }

    #[tokio::test]
    async fn test_precomputed_vectors_cover_private_requesters() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Python"], &["Yoga"]),
            user("b", &["Yoga"], &["Python"]),
            user("h", &["Go"], &["Python"]).with_visibility(Visibility::Private),
        ]));
        let provider = Arc::new(VectorProvider::new(&[
            ("Python", [1.0, 0.0]),
            ("Yoga", [0.0, 1.0]),
            ("Go", [0.8, 0.6]),
        ]));
        let orchestrator = RefreshOrchestrator::new(
            provider.clone(),
            store.clone(),
            store.clone(),
            RefreshConfig::default(),
        );

        let stats = orchestrator.refresh_all().await.unwrap();
        assert_eq!(stats.persisted, 3);
        assert_eq!(stats.failures(), 0);
        assert_eq!(provider.embed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.score_calls.load(Ordering::SeqCst), 0);

        assert_eq!(stored(&store, "h"), Some(ids(&["a", "b"])));
        assert_eq!(stored(&store, "a"), Some(ids(&["b"])));
        assert_eq!(stored(&store, "b"), Some(ids(&["a"])));
    }

    #[tokio::test]
    async fn test_full_refresh_uses_precomputed_vectors() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Python"], &["Yoga"]),
            user("b", &["Yoga"], &["Python"]),
            user("c", &["Go"], &["Python"]),
        ]));
        let provider = Arc::new(VectorProvider::new(&[
            ("Python", [1.0, 0.0]),
            ("Yoga", [0.0, 1.0]),
            ("Go", [0.8, 0.6]),
        ]));
        let orchestrator = RefreshOrchestrator::new(
            provider.clone(),
            store.clone(),
            store.clone(),
            RefreshConfig::default(),
        );

        let stats = orchestrator.refresh_all().await.unwrap();
        assert_eq!(stats.persisted, 3);
        assert_eq!(provider.embed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.score_calls.load(Ordering::SeqCst), 0);

        assert_eq!(stored(&store, "a"), Some(ids(&["b", "c"])));
        assert_eq!(stored(&store, "b"), Some(ids(&["a", "c"])));
        assert_eq!(stored(&store, "c"), Some(ids(&["a", "b"])));

        // Single refresh scores directly and agrees with the cached path
        let outcome = orchestrator.refresh_user("c").await.unwrap();
        assert_eq!(outcome.matches(), ids(&["a", "b"]).as_slice());
        assert_eq!(provider.score_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_vectorize_failure_aborts_before_any_write() {
        let store = Arc::new(InMemoryStore::with_users(vec![
            user("a", &["Go"], &["Rust"]),
            user("b", &["Rust"], &["Go"]),
        ]));

        let result = orchestrator(BrokenVectors, &store, RefreshConfig::default())
            .refresh_all()
            .await;
        assert!(matches!(result, Err(MatchError::Vectorize(_))));
        assert_eq!(store.suggestion_count(), 0);
    }

    #[tokio::test]
    async fn test_population_load_failure_is_fatal() {
        let store = Arc::new(InMemoryStore::new());
        let orchestrator = RefreshOrchestrator::new(
            Arc::new(MockProvider::new()),
            Arc::new(DownSource),
            store.clone(),
            RefreshConfig::default(),
        );

        assert!(matches!(
            orchestrator.refresh_all().await,
            Err(MatchError::PopulationLoad(_))
        ));
        assert!(matches!(
            orchestrator.refresh_user("a").await,
            Err(MatchError::PopulationLoad(_))
        ));
        assert_eq!(store.suggestion_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_results() {
        let users: Vec<User> = (0..12)
            .map(|i| {
                let offered = format!("skill{}", i % 4);
                let wanted = format!("skill{}", (i + 1) % 4);
                user(&format!("u{:02}", i), &[offered.as_str()], &[wanted.as_str()])
            })
            .collect();

        let sequential = Arc::new(InMemoryStore::with_users(users.clone()));
        orchestrator(MockProvider::new(), &sequential, RefreshConfig::default())
            .refresh_all()
            .await
            .unwrap();

        let parallel = Arc::new(InMemoryStore::with_users(users.clone()));
        let config = RefreshConfig {
            concurrency: 4,
            ..Default::default()
        };
        let stats = orchestrator(MockProvider::new(), &parallel, config)
            .refresh_all()
            .await
            .unwrap();
        assert_eq!(stats.persisted, 12);

        for u in &users {
            assert_eq!(stored(&sequential, &u.user_id), stored(&parallel, &u.user_id));
        }
    }

    #[tokio::test]
    async fn test_empty_population_refresh_all() {
        let store = Arc::new(InMemoryStore::new());
        let stats = orchestrator(MockProvider::new(), &store, RefreshConfig::default())
            .refresh_all()
            .await
            .unwrap();
        assert_eq!(stats, RefreshStats::default());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = MatchingSettings {
            top_k: 5,
            empty_population: EmptyPopulationPolicy::Skip,
            concurrency: 0,
        };
        let config = RefreshConfig::from(&settings);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.empty_population, EmptyPopulationPolicy::Skip);
        assert_eq!(config.concurrency, 1);
    }
}
