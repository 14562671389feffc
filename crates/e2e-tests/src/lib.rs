//! End-to-end test infrastructure for skill-match.
//!
//! Provides a shared TestHarness backed by a temporary RocksDB store and
//! helpers for seeding populations and driving refreshes through the
//! full load, score, rank and persist pipeline.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use skill_matcher::{
    MockProvider, ProviderError, RefreshConfig, RefreshOrchestrator, SimilarityProvider,
};
use skill_storage::Storage;
use skill_types::User;

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
}

impl TestHarness {
    /// Create a new test harness with temp directory and storage.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage =
            Arc::new(Storage::open(temp_dir.path()).expect("Failed to open test storage"));

        Self {
            _temp_dir: temp_dir,
            storage,
        }
    }

    /// Create a harness pre-populated with `users`.
    pub fn with_users(users: &[User]) -> Self {
        let harness = Self::new();
        harness.seed(users);
        harness
    }

    pub fn seed(&self, users: &[User]) {
        self.storage.put_users(users).expect("Failed to seed users");
    }

    /// Orchestrator reading and writing this harness's storage.
    pub fn orchestrator(
        &self,
        provider: Arc<dyn SimilarityProvider>,
        config: RefreshConfig,
    ) -> RefreshOrchestrator {
        RefreshOrchestrator::new(provider, self.storage.clone(), self.storage.clone(), config)
    }

    /// Persisted match ids for `user_id`, if a suggestion exists.
    pub fn suggestion_ids(&self, user_id: &str) -> Option<Vec<String>> {
        self.storage
            .get_suggestion(user_id)
            .expect("Failed to read suggestion")
            .map(|s| s.matches)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a public user from string slices.
pub fn user(id: &str, offered: &[&str], wanted: &[&str]) -> User {
    User::new(
        id,
        offered.iter().map(|s| s.to_string()).collect(),
        wanted.iter().map(|s| s.to_string()).collect(),
    )
}

pub fn ids(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A requester wanting `query_skill` plus `count` candidates, each offering a
/// unique skill with a distinct fixed score.
///
/// Scores are shuffled with a seeded RNG so population order and score order
/// disagree. Returns the users, a provider serving those scores, and the
/// candidate ids sorted best first.
pub fn scored_population(
    requester_id: &str,
    query_skill: &str,
    count: usize,
    seed: u64,
) -> (Vec<User>, MockProvider, Vec<String>) {
    let mut scores: Vec<f32> = (0..count).map(|i| (i + 1) as f32 / (count + 1) as f32).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    scores.shuffle(&mut rng);

    let mut users = vec![user(requester_id, &["Teaching"], &[query_skill])];
    let mut provider = MockProvider::new();
    let mut ranked: Vec<(String, f32)> = Vec::with_capacity(count);

    for (i, score) in scores.into_iter().enumerate() {
        let id = format!("cand-{:03}", i);
        let skill = format!("skill-{:03}", i);
        provider = provider.with_score(query_skill, skill.clone(), score);
        users.push(user(&id, &[skill.as_str()], &[]));
        ranked.push((id, score));
    }

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let expected = ranked.into_iter().map(|(id, _)| id).collect();
    (users, provider, expected)
}

/// Provider wrapper that records every query and candidate batch it sees.
pub struct RecordingProvider {
    inner: MockProvider,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingProvider {
    pub fn new(inner: MockProvider) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

#[async_trait]
impl SimilarityProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((query.to_string(), candidates.to_vec()));
        self.inner.score(query, candidates).await
    }
}

/// Provider that drops the last score for one query phrase.
pub struct TruncatingProvider {
    pub inner: MockProvider,
    pub bad_query: String,
}

#[async_trait]
impl SimilarityProvider for TruncatingProvider {
    fn name(&self) -> &str {
        "truncating"
    }

    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
        let mut scores = self.inner.score(query, candidates).await?;
        if query == self.bad_query {
            scores.pop();
        }
        Ok(scores)
    }
}
