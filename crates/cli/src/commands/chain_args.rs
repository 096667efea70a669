//! Chain selection arguments shared by the analysis commands.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use tracing::warn;

use gex_lab_chain::{CachedChainSource, ChainSource, JsonChainSource};
use gex_lab_core::{analyze, AppConfig, GexReport};

/// Which chain to load. Unset values fall back to the configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// Underlying symbol (e.g., "SPY", "QQQ")
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Expiration index, 0 = nearest
    #[arg(short, long)]
    pub expiry_offset: Option<usize>,

    /// Display range as a fraction of spot (e.g., 0.05 = ±5%)
    #[arg(short, long)]
    pub range_pct: Option<Decimal>,

    /// Directory holding <SYMBOL>/<expiration>.json chain files
    #[arg(long, env = "GEX_DATA_DIR")]
    pub data_dir: Option<String>,
}

impl ChainArgs {
    /// Folds command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(symbol) = &self.symbol {
            config.source.default_symbol = symbol.to_uppercase();
        }
        if let Some(offset) = self.expiry_offset {
            config.source.expiry_offset = offset;
        }
        if let Some(range) = self.range_pct {
            config.analysis.display_range_pct = range;
        }
        if let Some(dir) = &self.data_dir {
            config.source.data_dir = dir.clone();
        }
    }
}

/// Builds the configured file source for a single fetch.
pub fn json_source(config: &AppConfig) -> JsonChainSource {
    JsonChainSource::new(&config.source.data_dir)
}

/// Builds the configured source behind the TTL cache, for callers that fetch
/// the same chain repeatedly.
pub fn cached_source(config: &AppConfig) -> CachedChainSource<JsonChainSource> {
    CachedChainSource::with_ttl(
        json_source(config),
        Duration::from_secs(config.source.cache_ttl_secs),
    )
}

/// Fetches the configured chain from `source` and runs the analysis.
///
/// # Errors
/// Returns an error if the chain cannot be loaded or the inputs are invalid.
pub async fn load_report<S: ChainSource>(source: &S, config: &AppConfig) -> Result<GexReport> {
    let snapshot = source
        .fetch(&config.source.default_symbol, config.source.expiry_offset)
        .await?;
    let report = analyze(&snapshot, &config.analysis)?;

    if report.is_empty() {
        warn!(
            chain = %snapshot.display_name(),
            rows = snapshot.row_count(),
            "No usable strikes in chain"
        );
    }
    Ok(report)
}
