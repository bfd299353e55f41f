mod commands;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vmbot")]
#[command(about = "Start and stop cloud VMs from Telegram", long_about = None)]
struct Cli {
    /// Path to bot_config.yaml (also $VMBOT_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the service account key (also $VMBOT_KEY)
    #[arg(short, long, global = true)]
    key: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default)
    Run,
    /// Load and validate the configuration, then exit
    CheckConfig,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = commands::ConfigPaths {
        config: cli.config,
        key: cli.key,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Version => {
            println!("vmbot {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::CheckConfig => commands::check_config::handle(&paths),
        Commands::Run => {
            logging::init(cli.log_file.as_deref())?;
            commands::run::handle(&paths).await
        }
    }
}
