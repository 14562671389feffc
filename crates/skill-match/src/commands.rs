//! Command implementations for skill-match.
//!
//! Handles:
//! - refresh: load config, open storage, build the provider, run a refresh
//! - admin: profile import, suggestion inspection, database statistics
//!
//! Logs go to stderr. Stdout carries only command results.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use skill_embeddings::CandleEmbedder;
use skill_matcher::{
    LocalEmbeddingProvider, MatchError, MockProvider, RefreshConfig, RefreshOrchestrator,
    RemoteProviderConfig, RemoteSimilarityProvider, SimilarityProvider,
};
use skill_storage::{Storage, StorageStats};
use skill_types::{ProviderKind, Settings, User};

use crate::cli::AdminCommands;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// CLI values that override loaded settings.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub db_path: Option<String>,
    pub log_level: Option<String>,
    pub provider: Option<ProviderKind>,
}

impl Overrides {
    /// Apply over `settings` (highest precedence).
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(db_path) = &self.db_path {
            settings.db_path = db_path.clone();
        }
        if let Some(log_level) = &self.log_level {
            settings.log_level = log_level.clone();
        }
        if let Some(provider) = self.provider {
            settings.provider = provider;
        }
    }
}

/// Load, override and validate settings.
///
/// Any problem surfaces as [`MatchError::Configuration`] before work begins.
pub fn resolve_settings(config_path: Option<&str>, overrides: &Overrides) -> Result<Settings> {
    let mut settings = Settings::load(config_path)
        .map_err(MatchError::from)
        .context("Failed to load configuration")?;
    overrides.apply(&mut settings);
    settings
        .validate()
        .map_err(MatchError::from)
        .context("Invalid configuration")?;
    Ok(settings)
}

/// Open the RocksDB store named by the settings, creating parent directories.
pub fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let db_path = settings.expanded_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let storage = Storage::open(&db_path).context("Failed to open storage")?;
    Ok(Arc::new(storage))
}

/// Construct the configured similarity provider.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn SimilarityProvider>> {
    let provider: Arc<dyn SimilarityProvider> = match settings.provider {
        ProviderKind::Local => {
            info!(model = %settings.embedding.model_repo, "Loading embedding model");
            let embedder = CandleEmbedder::from_settings(&settings.embedding)
                .context("Failed to load embedding model")?;
            Arc::new(LocalEmbeddingProvider::with_batch_size(
                Arc::new(embedder),
                settings.embedding.batch_size,
            ))
        }
        ProviderKind::Remote => {
            let config = RemoteProviderConfig::from_settings(&settings.remote);
            Arc::new(
                RemoteSimilarityProvider::new(config)
                    .context("Failed to create remote similarity client")?,
            )
        }
        ProviderKind::Mock => Arc::new(MockProvider::new()),
    };
    Ok(provider)
}

/// Run a refresh against `storage`.
///
/// Returns the matched ids in single-user mode and `None` after a full run.
pub async fn run_refresh(
    settings: &Settings,
    storage: Arc<Storage>,
    provider: Arc<dyn SimilarityProvider>,
    user_id: Option<&str>,
) -> Result<Option<Vec<String>>> {
    let orchestrator = RefreshOrchestrator::new(
        provider,
        storage.clone(),
        storage,
        RefreshConfig::from(&settings.matching),
    );

    match user_id {
        Some(id) => {
            let outcome = orchestrator
                .refresh_user(id)
                .await
                .with_context(|| format!("Refresh failed for user {}", id))?;
            Ok(Some(outcome.matches().to_vec()))
        }
        None => {
            let stats = orchestrator.refresh_all().await.context("Full refresh failed")?;
            info!(
                requesters = stats.requesters,
                persisted = stats.persisted,
                empty = stats.empty,
                provider_failures = stats.provider_failures,
                persistence_failures = stats.persistence_failures,
                rank_failures = stats.rank_failures,
                "Refresh summary"
            );
            Ok(None)
        }
    }
}

/// Handle the refresh command.
pub async fn handle_refresh(
    config_path: Option<&str>,
    user_id: Option<&str>,
    overrides: Overrides,
) -> Result<()> {
    let settings = resolve_settings(config_path, &overrides)?;
    init_logging(&settings.log_level)?;

    info!(
        db_path = %settings.db_path,
        provider = %settings.provider,
        top_k = settings.matching.top_k,
        "skill-match refresh starting"
    );

    let storage = open_storage(&settings)?;
    let provider = build_provider(&settings)?;

    if let Some(matches) = run_refresh(&settings, storage, provider, user_id).await? {
        println!("{}", serde_json::to_string(&matches)?);
    }
    Ok(())
}

/// Bulk-load profiles from a JSON array file. Returns the count written.
pub fn import_users(storage: &Storage, path: &Path) -> Result<usize> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let users: Vec<User> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse users from {}", path.display()))?;
    let written = storage.put_users(&users).context("Failed to store users")?;
    info!(count = written, "Imported users");
    Ok(written)
}

/// Stored suggestion for `user_id` as pretty JSON, `null` when absent.
///
/// With `resolve`, each match id is replaced by that user's name and offered
/// skills. Ids whose profile has since been removed are left out.
pub fn show_suggestion(storage: &Storage, user_id: &str, resolve: bool) -> Result<String> {
    let suggestion = storage
        .get_suggestion(user_id)
        .context("Failed to read suggestion")?;
    let suggestion = match suggestion {
        Some(suggestion) if resolve => suggestion,
        other => return Ok(serde_json::to_string_pretty(&other)?),
    };

    let mut matches = Vec::with_capacity(suggestion.matches.len());
    for id in &suggestion.matches {
        let user = storage
            .get_user(id)
            .with_context(|| format!("Failed to read user {}", id))?;
        if let Some(user) = user {
            matches.push(json!({
                "user_id": user.user_id,
                "name": user.display_name(),
                "skills_offered": user.skills_offered,
            }));
        }
    }
    let resolved = json!({
        "requester_id": suggestion.requester_id,
        "updated_at": suggestion.updated_at.timestamp_millis(),
        "matches": matches,
    });
    Ok(serde_json::to_string_pretty(&resolved)?)
}

pub fn format_stats(stats: &StorageStats) -> String {
    format!(
        "Users:             {}\nVisible users:     {}\nSuggestions:       {}",
        stats.user_count, stats.visible_user_count, stats.suggestion_count
    )
}

/// Handle admin commands.
pub fn handle_admin(
    config_path: Option<&str>,
    command: AdminCommands,
    overrides: Overrides,
) -> Result<()> {
    let settings = resolve_settings(config_path, &overrides)?;
    init_logging(&settings.log_level)?;
    let storage = open_storage(&settings)?;

    match command {
        AdminCommands::Import { path } => {
            let count = import_users(&storage, Path::new(&path))?;
            storage.flush().context("Failed to flush storage")?;
            println!("Imported {} users", count);
        }
        AdminCommands::Show { user_id, resolve } => {
            println!("{}", show_suggestion(&storage, &user_id, resolve)?);
        }
        AdminCommands::Stats => {
            let stats = storage.get_stats().context("Failed to read stats")?;
            println!("Database Statistics");
            println!("===================");
            println!("Path: {}", settings.db_path);
            println!("{}", format_stats(&stats));
        }
    }
    Ok(())
}
