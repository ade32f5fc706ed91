use calendar_mirror::startup;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Mirror upcoming Google Calendar events into a Discord channel
#[derive(Debug, Parser)]
#[command(name = "calendar-mirror", version, about)]
struct Cli {
    /// Run a single reconciliation pass and exit
    #[arg(long)]
    once: bool,

    /// Read environment variables from this file instead of .env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = startup::load_config(cli.env_file.as_deref())?;

    // Initialize logging
    {
        let config_read = config.read().await;
        startup::init_logging(config_read.tracing_directive())?;
    }

    info!(once = cli.once, "Starting calendar mirror");

    if cli.once {
        startup::run_once(config).await
    } else {
        // Start the bot
        startup::start_bot(config).await
    }
}
