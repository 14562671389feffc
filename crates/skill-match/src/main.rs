//! skill-match
//!
//! Refreshes skill-exchange suggestions: for each requester, scores the
//! offered skills of every other visible user against the requester's wanted
//! skills and stores the top matches.
//!
//! # Usage
//!
//! ```bash
//! skill-match refresh                      # every visible user
//! skill-match refresh <USER_ID>            # one user, prints a JSON array
//! skill-match refresh --provider remote
//! skill-match admin import users.json
//! skill-match admin show <USER_ID>
//! skill-match admin stats
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/skill-match/config.toml)
//! 3. Environment variables (SKILL_MATCH_*, nested keys joined with `__`)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use skill_match::{handle_admin, handle_refresh, Cli, Commands, Overrides};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refresh {
            user_id,
            provider,
            db_path,
        } => {
            let overrides = Overrides {
                db_path,
                log_level: cli.log_level,
                provider,
            };
            handle_refresh(cli.config.as_deref(), user_id.as_deref(), overrides).await?;
        }
        Commands::Admin { db_path, command } => {
            let overrides = Overrides {
                db_path,
                log_level: cli.log_level,
                provider: None,
            };
            handle_admin(cli.config.as_deref(), command, overrides)?;
        }
    }

    Ok(())
}
