//! Expirations CLI command.

use anyhow::Result;
use clap::Args;

use gex_lab_chain::{ChainSource, JsonChainSource};
use gex_lab_core::AppConfig;

/// Arguments for the expirations command.
#[derive(Args, Debug, Clone)]
pub struct ExpirationsArgs {
    /// Underlying symbol (defaults to the configured symbol)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Directory holding <SYMBOL>/<expiration>.json chain files
    #[arg(long, env = "GEX_DATA_DIR")]
    pub data_dir: Option<String>,
}

/// Lists available expirations, nearest first, with their offsets.
///
/// # Errors
/// Returns an error if the symbol directory cannot be read.
pub async fn run_expirations(args: ExpirationsArgs, config: AppConfig) -> Result<()> {
    let symbol = args
        .symbol
        .unwrap_or(config.source.default_symbol)
        .to_uppercase();
    let data_dir = args.data_dir.unwrap_or(config.source.data_dir);

    let source = JsonChainSource::new(data_dir);
    let expirations = source.expirations(&symbol).await?;

    if expirations.is_empty() {
        tracing::warn!(symbol = %symbol, "No expirations found");
        return Ok(());
    }

    println!("{symbol} expirations:");
    for (offset, expiration) in expirations.iter().enumerate() {
        println!("  [{offset}] {expiration}");
    }
    Ok(())
}
