//! Roster CLI - allocate cohorts into balanced groups from the command line.

use clap::Parser;
use roster_cli::commands;
use roster_cli::{Cli, Command, Config, Formatter};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run() -> roster_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load the explicit config file, or the default one (created on first use)
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => match Config::path() {
            Ok(path) if path.exists() => Config::load_from(&path)?,
            _ => {
                let cfg = Config::default();
                if let Err(e) = cfg.save() {
                    debug!("Could not write default config: {}", e);
                }
                cfg
            }
        },
    };

    if let Some(db) = cli.db {
        config.database = db.into();
    }

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Allocate(args) => commands::execute_allocate(args, &config, &formatter).await?,
        Command::Reallocate(args) => commands::execute_reallocate(args, &config, &formatter)?,
        Command::Analyze(args) => commands::execute_analyze(args, &config, &formatter)?,
        Command::Runs(args) => commands::execute_runs(args, &config, &formatter)?,
        Command::Show(args) => commands::execute_show(args, &config, &formatter)?,
        Command::Import(args) => commands::execute_import(args, &config, &formatter)?,
    }

    Ok(())
}
