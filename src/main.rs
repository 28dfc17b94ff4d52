use clap::Parser;

use slotcast::cli::{self, Cli, CommandOutcome};
use slotcast::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    cli::init_logger_from_settings(&settings)?;

    match cli::execute_command(&cli, settings.clone()).await? {
        CommandOutcome::Serve => Server::new(settings).run().await,
        CommandOutcome::Done => Ok(()),
    }
}
