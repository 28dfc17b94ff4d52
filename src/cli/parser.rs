//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

use crate::build;

/// Scheduled publishing pipeline for social media workspaces
#[derive(Parser, Debug)]
#[command(name = "slotcast")]
#[command(about = "Scheduled publishing pipeline for social media workspaces")]
#[command(long_about = "
Slotcast turns per-workspace scheduling policies into concrete posting slots,
pairs them with content from the pool and publishes confirmed schedules when
they come due.

EXAMPLES:
    # Start the API server with default configuration
    slotcast serve

    # Start server on custom host and port
    slotcast serve --host 0.0.0.0 --port 8080

    # Use a custom configuration file
    slotcast --config /etc/slotcast/production.toml serve

    # Check configuration without starting the server
    slotcast serve --dry-run

    # Apply or preview database migrations
    slotcast migrate
    slotcast migrate --dry-run

    # Publish due schedules once and print the report
    slotcast tick --limit 10

    # Expand a workspace policy into slots
    slotcast slots generate --workspace 7d3c1f6e-5d0a-4b8e-9b7e-1f2a3b4c5d6e
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file or directory
    ///
    /// A TOML file replaces the layered lookup; a directory is used in place
    /// of `config/` for the layered lookup.
    #[arg(short, long, value_name = "PATH", value_parser = super::validation::validate_config_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (`SLOTCAST_APP_ENV`)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Examples:
    ///   slotcast serve                           # Start with defaults
    ///   slotcast serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   slotcast serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override, takes precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    ///
    /// Examples:
    ///   slotcast migrate                    # Apply all pending migrations
    ///   slotcast migrate --dry-run          # Show pending migrations without applying
    ///   slotcast migrate --rollback 3       # Rollback the last 3 migrations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to rollback (1..=100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
    /// Run one tick: publish confirmed schedules that are due
    ///
    /// Prints the tick report as JSON.
    Tick {
        /// Maximum schedules to process (clamped to 1..=50)
        #[arg(short, long, value_name = "N")]
        limit: Option<i64>,
    },
    /// Slot operations
    Slots {
        #[command(subcommand)]
        action: SlotsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SlotsAction {
    /// Expand the workspace policy into slots; existing slots are skipped
    Generate {
        /// Workspace id
        #[arg(short, long, value_name = "UUID")]
        workspace: Uuid,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Checks argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Some(Commands::Migrate { dry_run, rollback }) if *dry_run && rollback.is_some() => {
                return Err("Cannot use --dry-run and --rollback together".to_string());
            }
            Some(Commands::Tick { limit: Some(limit) }) if *limit < 1 => {
                return Err(format!("Tick limit must be at least 1, got {}", limit));
            }
            _ => {}
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["slotcast", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["slotcast"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from(["slotcast", "serve", "--host", "0.0.0.0", "--port", "8080"])
            .unwrap();
        match cli.command {
            Some(Commands::Serve {
                host, port, dry_run, ..
            }) => {
                assert_eq!(host, Some("0.0.0.0".to_string()));
                assert_eq!(port, Some(8080));
                assert!(!dry_run);
            }
            other => panic!("Expected Serve command, got {:?}", other),
        }
    }

    #[test]
    fn test_migrate_flags_conflict() {
        let err = Cli::try_parse_from(["slotcast", "migrate", "--dry-run", "--rollback", "2"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_tick_command() {
        let cli = Cli::try_parse_from(["slotcast", "tick", "--limit", "5"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Tick { limit: Some(5) })));

        let cli = Cli::try_parse_from(["slotcast", "tick", "--limit", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_slots_generate_command() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from(["slotcast", "slots", "generate", "--workspace", &id.to_string()])
            .unwrap();
        match cli.command {
            Some(Commands::Slots {
                action: SlotsAction::Generate { workspace },
            }) => assert_eq!(workspace, id),
            other => panic!("Expected slots generate, got {:?}", other),
        }

        assert!(Cli::try_parse_from(["slotcast", "slots", "generate", "--workspace", "nope"]).is_err());
    }

    #[test]
    fn test_env_aliases() {
        let cli = Cli::try_parse_from(["slotcast", "--env", "prod"]).unwrap();
        assert!(matches!(cli.env, Some(Environment::Production)));
        let cli = Cli::try_parse_from(["slotcast", "--env", "stage"]).unwrap();
        assert!(matches!(cli.env, Some(Environment::Staging)));
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["slotcast", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
