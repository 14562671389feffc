//! skill-match CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (refresh, admin)

pub mod cli;
pub mod commands;

pub use cli::{AdminCommands, Cli, Commands};
pub use commands::{
    build_provider, handle_admin, handle_refresh, import_users, init_logging, open_storage,
    resolve_settings, run_refresh, show_suggestion, Overrides,
};
