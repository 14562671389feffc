//! CLI argument parsing for skill-match.
//!
//! CLI flags override every other config source.

use clap::{Parser, Subcommand};

use skill_types::ProviderKind;

/// Skill-exchange suggestion refresher
///
/// Scores visible users' offered skills against each requester's wanted
/// skills and stores the top matches.
#[derive(Parser, Debug)]
#[command(name = "skill-match")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/skill-match/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh suggestions for one user, or for everyone when no id is given
    Refresh {
        /// Requester to refresh; prints the matched ids as a JSON array
        user_id: Option<String>,

        /// Similarity provider (local, remote, mock)
        #[arg(short, long)]
        provider: Option<ProviderKind>,

        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Administrative commands
    Admin {
        /// Database path (default from config)
        #[arg(long)]
        db_path: Option<String>,

        #[command(subcommand)]
        command: AdminCommands,
    },
}

/// Admin subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommands {
    /// Load a JSON array of user profiles, replacing existing ids
    Import {
        /// Path to the JSON file
        path: String,
    },

    /// Print the stored suggestion for a user as JSON
    Show {
        user_id: String,

        /// Replace match ids with the stored profiles they refer to
        #[arg(long)]
        resolve: bool,
    },

    /// Show database statistics
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_refresh_all() {
        let cli = Cli::parse_from(["skill-match", "refresh"]);
        match cli.command {
            Commands::Refresh {
                user_id, provider, ..
            } => {
                assert!(user_id.is_none());
                assert!(provider.is_none());
            }
            _ => panic!("Expected Refresh command"),
        }
    }

    #[test]
    fn test_cli_refresh_single_with_provider() {
        let cli = Cli::parse_from(["skill-match", "refresh", "u42", "--provider", "remote"]);
        match cli.command {
            Commands::Refresh {
                user_id, provider, ..
            } => {
                assert_eq!(user_id, Some("u42".to_string()));
                assert_eq!(provider, Some(ProviderKind::Remote));
            }
            _ => panic!("Expected Refresh command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_provider() {
        let result = Cli::try_parse_from(["skill-match", "refresh", "--provider", "magic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_refresh_with_db_path() {
        let cli = Cli::parse_from(["skill-match", "refresh", "--db-path", "/custom/db"]);
        match cli.command {
            Commands::Refresh { db_path, .. } => {
                assert_eq!(db_path, Some("/custom/db".to_string()))
            }
            _ => panic!("Expected Refresh command"),
        }
    }

    #[test]
    fn test_cli_with_config_and_log_level() {
        let cli = Cli::parse_from([
            "skill-match",
            "--config",
            "/path/to/config.toml",
            "--log-level",
            "debug",
            "refresh",
        ]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_admin_import() {
        let cli = Cli::parse_from(["skill-match", "admin", "--db-path", "/tmp/db", "import", "users.json"]);
        match cli.command {
            Commands::Admin { db_path, command } => {
                assert_eq!(db_path, Some("/tmp/db".to_string()));
                match command {
                    AdminCommands::Import { path } => assert_eq!(path, "users.json"),
                    _ => panic!("Expected Import command"),
                }
            }
            _ => panic!("Expected Admin command"),
        }
    }

    #[test]
    fn test_cli_admin_show_and_stats() {
        let cli = Cli::parse_from(["skill-match", "admin", "show", "u1"]);
        match cli.command {
            Commands::Admin { command, .. } => {
                assert!(matches!(command, AdminCommands::Show { user_id, resolve: false } if user_id == "u1"));
            }
            _ => panic!("Expected Admin command"),
        }

        let cli = Cli::parse_from(["skill-match", "admin", "show", "u1", "--resolve"]);
        match cli.command {
            Commands::Admin { command, .. } => {
                assert!(matches!(command, AdminCommands::Show { resolve: true, .. }));
            }
            _ => panic!("Expected Admin command"),
        }

        let cli = Cli::parse_from(["skill-match", "admin", "stats"]);
        match cli.command {
            Commands::Admin { command, .. } => assert!(matches!(command, AdminCommands::Stats)),
            _ => panic!("Expected Admin command"),
        }
    }
}
