use clap::{Parser, Subcommand};

mod commands;

use commands::{ExpirationsArgs, ExportArgs, LevelsArgs};
use gex_lab_core::{AppConfig, ConfigLoader, GexError};

#[derive(Parser)]
#[command(name = "gex-lab")]
#[command(about = "Gamma exposure key levels for options chains", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: String,

    /// Config profile overlay, read next to the config file
    /// (config/Config.toml + weekly -> config/Config.weekly.toml)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print key levels, gamma regime and exposure summary
    Levels(LevelsArgs),
    /// Export the display-range exposure table to CSV
    Export(ExportArgs),
    /// List available expirations for a symbol
    Expirations(ExpirationsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    let result = match cli.command {
        Commands::Levels(args) => commands::run_levels(args, config).await,
        Commands::Export(args) => commands::run_export(args, config).await,
        Commands::Expirations(args) => commands::run_expirations(args, config).await,
    };

    if let Err(err) = result {
        // Malformed chain data or arguments exit with 2.
        if let Some(GexError::InvalidInput(reason)) = err.downcast_ref::<GexError>() {
            tracing::error!(reason = %reason, "Invalid input");
            std::process::exit(2);
        }
        return Err(err);
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = match &cli.profile {
        Some(profile) => ConfigLoader::load_with_profile(&cli.config, profile)?,
        None => ConfigLoader::load_from(&cli.config)?,
    };
    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}
