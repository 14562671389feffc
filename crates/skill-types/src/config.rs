//! Configuration loading for skill-match.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/skill-match/config.toml.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SkillError;

/// Which similarity provider scores candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local dense embeddings (all-MiniLM-L6-v2 via Candle)
    #[default]
    Local,
    /// Hosted sentence-similarity endpoint
    Remote,
    /// Deterministic skill-overlap scoring, no model or network
    Mock,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Local => write!(f, "local"),
            ProviderKind::Remote => write!(f, "remote"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(ProviderKind::Local),
            "remote" => Ok(ProviderKind::Remote),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(SkillError::InvalidInput(format!(
                "unknown provider '{}', expected local, remote or mock",
                other
            ))),
        }
    }
}

/// What a refresh does when a requester has nobody to be compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPopulationPolicy {
    /// Overwrite any stale suggestion with an empty one
    #[default]
    PersistEmpty,
    /// Leave stored state untouched and only report the empty population
    Skip,
}

/// Local embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// HuggingFace repository of the sentence-transformer model
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Model cache directory (defaults to the platform cache dir)
    #[serde(default)]
    pub cache_dir: Option<String>,

    /// Phrases embedded per forward pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_model_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_repo: default_model_repo(),
            cache_dir: None,
            batch_size: default_batch_size(),
        }
    }
}

/// Remote similarity API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Sentence-similarity endpoint URL
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,

    /// API token (set via SKILL_MATCH_REMOTE__API_KEY, not the config file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,

    /// Retries per requester on transient failure (0 = fail fast)
    #[serde(default)]
    pub max_retries: u32,
}

fn default_remote_endpoint() -> String {
    "https://api-inference.huggingface.co/models/sentence-transformers/all-MiniLM-L6-v2"
        .to_string()
}

fn default_remote_timeout() -> u64 {
    30
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: default_remote_endpoint(),
            api_key: None,
            timeout_secs: default_remote_timeout(),
            max_retries: 0,
        }
    }
}

/// Ranking and refresh-loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// Maximum candidates kept per suggestion
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub empty_population: EmptyPopulationPolicy,

    /// Requesters processed concurrently during a full refresh
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_top_k() -> usize {
    20
}

fn default_concurrency() -> usize {
    1
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            empty_population: EmptyPopulationPolicy::default(),
            concurrency: default_concurrency(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB directory holding users and suggestions
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub matching: MatchingSettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "skill-match")
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            provider: ProviderKind::default(),
            embedding: EmbeddingSettings::default(),
            remote: RemoteSettings::default(),
            matching: MatchingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/skill-match/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SKILL_MATCH_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SkillError> {
        let config_dir = ProjectDirs::from("", "", "skill-match")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("provider", ProviderKind::default().to_string())
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("matching.top_k", default_top_k() as i64)
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("matching.concurrency", default_concurrency() as i64)
            .map_err(|e| SkillError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SKILL_MATCH_DB_PATH, SKILL_MATCH_PROVIDER, SKILL_MATCH_REMOTE__API_KEY, ...
        builder = builder.add_source(
            Environment::with_prefix("SKILL_MATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| SkillError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SkillError::Config(e.to_string()))
    }

    /// Check that the settings can drive a refresh.
    ///
    /// Runs at startup so misconfiguration aborts before any work is done.
    pub fn validate(&self) -> Result<(), SkillError> {
        if self.db_path.trim().is_empty() {
            return Err(SkillError::Config("db_path must not be empty".to_string()));
        }
        if self.matching.top_k == 0 {
            return Err(SkillError::Config("matching.top_k must be > 0".to_string()));
        }
        if self.matching.concurrency == 0 {
            return Err(SkillError::Config(
                "matching.concurrency must be > 0".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(SkillError::Config(
                "embedding.batch_size must be > 0".to_string(),
            ));
        }
        if self.provider == ProviderKind::Remote {
            if self.remote.endpoint.trim().is_empty() {
                return Err(SkillError::Config(
                    "remote.endpoint is required for the remote provider".to_string(),
                ));
            }
            let has_key = self
                .remote
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                return Err(SkillError::Config(
                    "remote.api_key is required for the remote provider (SKILL_MATCH_REMOTE__API_KEY)"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Some(base) = BaseDirs::new() {
                return base.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}
