//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{
    MigrateCommandHandler, ServeCommandHandler, SlotsCommandHandler, TickCommandHandler,
};
use super::parser::{Cli, Commands, SlotsAction};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// What the caller should do once [`execute_command`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Start the HTTP server.
    Serve,
    /// The command ran to completion.
    Done,
}

/// Execute a CLI command with the given settings
///
/// Server startup is left to the caller, signalled by [`CommandOutcome::Serve`].
///
/// # Errors
/// Returns errors from command handlers or validation failures
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<CommandOutcome> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings).validate_only().await?;
            Ok(CommandOutcome::Done)
        }
        Some(Commands::Serve { .. }) | None => Ok(CommandOutcome::Serve),
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await?;
            Ok(CommandOutcome::Done)
        }
        Some(Commands::Tick { limit }) => {
            TickCommandHandler::new(settings).execute(*limit).await?;
            Ok(CommandOutcome::Done)
        }
        Some(Commands::Slots {
            action: SlotsAction::Generate { workspace },
        }) => {
            SlotsCommandHandler::new(settings).generate(*workspace).await?;
            Ok(CommandOutcome::Done)
        }
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    match &cli.command {
        Some(Commands::Serve {
            host: Some(host),
            port: Some(port),
            ..
        }) if *port < 1024 && host == "0.0.0.0" => {
            tracing::warn!(port, "Binding to 0.0.0.0 on a privileged port requires root");
        }
        Some(Commands::Migrate {
            rollback: Some(steps),
            ..
        }) if *steps > 50 => {
            tracing::warn!(steps, "Rolling back a large number of migrations");
        }
        _ => {}
    }

    Ok(())
}
