//! Hosted sentence-similarity API provider.
//!
//! Speaks the HuggingFace inference `sentence-similarity` task format:
//! `{"inputs": {"source_sentence": q, "sentences": [...]}}` -> `[f32, ...]`.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error, warn};

use skill_types::RemoteSettings;

use super::{check_score_count, ProviderError, SimilarityProvider};

/// Configuration for the remote similarity provider.
#[derive(Debug, Clone)]
pub struct RemoteProviderConfig {
    pub endpoint: String,

    /// Sent as a bearer token when present
    pub api_key: Option<SecretString>,

    pub timeout: Duration,

    /// Extra attempts after a transient failure. 0 disables retrying.
    pub max_retries: u32,
}

impl RemoteProviderConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 0,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn from_settings(settings: &RemoteSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
        }
    }
}

#[derive(Serialize)]
struct SimilarityRequest<'a> {
    inputs: SimilarityInputs<'a>,
}

#[derive(Serialize)]
struct SimilarityInputs<'a> {
    source_sentence: &'a str,
    sentences: &'a [String],
}

/// One network call per query; nothing is cached between calls.
pub struct RemoteSimilarityProvider {
    client: Client,
    config: RemoteProviderConfig,
}

impl RemoteSimilarityProvider {
    pub fn new(config: RemoteProviderConfig) -> Result<Self, ProviderError> {
        if config.endpoint.trim().is_empty() {
            return Err(ProviderError::Config("endpoint must not be empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Call the API, retrying transient failures when configured to.
    async fn call_api(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, candidates = candidates.len(), "Calling similarity API");

            let err = match self.make_request(query, candidates).await {
                Ok(scores) => return Ok(scores),
                Err(e) => e,
            };

            if !is_transient(&err) || attempts > self.config.max_retries {
                if self.config.max_retries > 0 {
                    error!(error = %err, attempts, "Similarity API call failed");
                }
                return Err(err);
            }

            match backoff.next_backoff() {
                Some(delay) => {
                    warn!(
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "Similarity API call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(error = %err, "Backoff exhausted");
                    return Err(err);
                }
            }
        }
    }

    async fn make_request(
        &self,
        query: &str,
        candidates: &[String],
    ) -> Result<Vec<f32>, ProviderError> {
        let body = SimilarityRequest {
            inputs: SimilarityInputs {
                source_sentence: query,
                sentences: candidates,
            },
        };

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        serde_json::from_str::<Vec<f32>>(&text).map_err(|e| {
            ProviderError::Malformed(format!("expected a JSON array of scores: {}", e))
        })
    }
}

/// Failures worth another attempt: network trouble, throttling, server errors.
fn is_transient(err: &ProviderError) -> bool {
    match err {
        ProviderError::Transport(_) | ProviderError::RateLimited => true,
        ProviderError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl SimilarityProvider for RemoteSimilarityProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let scores = self.call_api(query, candidates).await?;
        check_score_count(candidates.len(), scores)
    }
}
