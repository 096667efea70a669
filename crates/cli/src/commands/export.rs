//! Export CLI command.
//!
//! Writes the display-range exposure table to CSV.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use csv::Writer;
use tracing::info;

use gex_lab_core::{AppConfig, ExposureRecord};

use super::chain_args::{json_source, load_report, ChainArgs};

/// Arguments for the export command.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub chain: ChainArgs,

    /// Output CSV path (default: gex_<SYMBOL>_<EXPIRATION>.csv)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Runs the export command.
///
/// # Errors
/// Returns an error if the chain cannot be loaded or the file cannot be
/// written.
pub async fn run_export(args: ExportArgs, mut config: AppConfig) -> Result<()> {
    args.chain.apply(&mut config);

    let report = load_report(&json_source(&config), &config).await?;
    let path = args
        .output
        .unwrap_or_else(|| format!("gex_{}_{}.csv", report.underlying, report.expiration));

    let records = report.display_records();
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create CSV file: {path}"))?;
    write_records(file, &records)?;

    info!(path = %path, rows = records.len(), "Exported exposure table");
    Ok(())
}

/// Writes one CSV row per record, ascending by strike, with a header.
///
/// # Errors
/// Returns an error if serialization or writing fails.
pub fn write_records<W: Write>(writer: W, records: &[&ExposureRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_lab_core::{aggregate_default, ContractRow};
    use rust_decimal_macros::dec;

    #[test]
    fn writes_header_and_rows() {
        let calls = vec![
            ContractRow::new(dec!(101), 10, 1, 0.01, 0.4, 20.0),
            ContractRow::new(dec!(99), 20, 2, 0.02, 0.6, 22.0),
        ];
        let table = aggregate_default(&calls, &[], dec!(100)).unwrap();
        let records: Vec<&ExposureRecord> = table.iter().collect();

        let mut buf = Vec::new();
        write_records(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strike,call_gex,put_gex,net_gex"));
        assert!(lines[1].starts_with("99,"));
        assert!(lines[2].starts_with("101,"));
    }

    #[test]
    fn empty_table_writes_nothing() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[]).unwrap();
        assert!(buf.is_empty());
    }
}
