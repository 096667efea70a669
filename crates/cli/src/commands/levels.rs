//! Levels CLI command.
//!
//! Loads a chain, classifies key levels and prints them with the
//! display-range summary. With `--watch` the report is reprinted on an
//! interval, fetching through the shared TTL cache.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Args;
use tracing::info;

use gex_lab_core::{AppConfig, GexReport, ReportFormatter};

use super::chain_args::{cached_source, json_source, load_report, ChainArgs};

/// Arguments for the levels command.
#[derive(Args, Debug, Clone)]
pub struct LevelsArgs {
    #[command(flatten)]
    pub chain: ChainArgs,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Reprint the report every N seconds until interrupted
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,
}

/// Output format for the levels report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!(
                "Unknown format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

/// Runs the levels command.
///
/// # Errors
/// Returns an error if the chain cannot be loaded or is invalid.
pub async fn run_levels(args: LevelsArgs, mut config: AppConfig) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    args.chain.apply(&mut config);

    let Some(secs) = args.watch else {
        let report = load_report(&json_source(&config), &config).await?;
        println!("{}", render(&report, format)?);
        return Ok(());
    };

    let source = cached_source(&config);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    info!(
        interval_secs = secs.max(1),
        cache_ttl_secs = config.source.cache_ttl_secs,
        "Watching levels"
    );
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = load_report(&source, &config).await?;
                println!("{}", render(&report, format)?);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Watch stopped");
                return Ok(());
            }
        }
    }
}

fn render(report: &GexReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(ReportFormatter::format(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonLevels::from(report))?),
    }
}

/// JSON view: levels and summary without the full table.
#[derive(serde::Serialize)]
struct JsonLevels<'a> {
    underlying: &'a str,
    expiration: &'a str,
    spot: rust_decimal::Decimal,
    no_data: bool,
    levels: &'a gex_lab_core::KeyLevels,
    summary: &'a gex_lab_core::ExposureSummary,
}

impl<'a> From<&'a GexReport> for JsonLevels<'a> {
    fn from(report: &'a GexReport) -> Self {
        Self {
            underlying: &report.underlying,
            expiration: &report.expiration,
            spot: report.spot,
            no_data: report.is_empty(),
            levels: &report.levels,
            summary: &report.summary,
        }
    }
}
