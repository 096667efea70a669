//! Chain snapshots stored as vendor-style JSON files.
//!
//! Layout: `<root>/<SYMBOL>/<expiration>.json`, where each file looks like
//!
//! ```json
//! {
//!   "spot": 512.34,
//!   "data": {
//!     "Call": [{ "strikePrice": 510, "openInterest": 1200, "volume": 300,
//!                "gamma": 0.041, "delta": 0.55, "volatility": 14.2 }],
//!     "Put":  [ ... ]
//!   }
//! }
//! ```
//!
//! Numeric fields may be JSON numbers or numeric strings. Missing or null
//! values read as zero, except the strike which stays undefined and is
//! skipped downstream. A non-finite strike (`"NaN"`, `"inf"`) is treated the
//! same way.
//!
//! Groups are read in key order, so when two groups map to the same side
//! (`"Call"` and `"calls"`) the row order, and with it first-row-wins on
//! duplicate strikes, is stable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use gex_lab_core::{ChainSnapshot, ContractRow, GexError, OptionRight};

use crate::source::{select_expiration, ChainSource};

/// Reads snapshots from a directory tree of JSON chain files.
#[derive(Debug, Clone)]
pub struct JsonChainSource {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ChainFile {
    spot: Value,
    #[serde(default)]
    data: BTreeMap<String, Vec<RawContract>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    strike_price: Option<Value>,
    open_interest: Option<Value>,
    volume: Option<Value>,
    gamma: Option<Value>,
    delta: Option<Value>,
    volatility: Option<Value>,
}

impl JsonChainSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.root.join(symbol.to_uppercase())
    }
}

#[async_trait]
impl ChainSource for JsonChainSource {
    async fn expirations(&self, symbol: &str) -> Result<Vec<String>> {
        let dir = self.symbol_dir(symbol);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read chain directory: {}", dir.display()))?;

        let mut expirations = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                expirations.push(stem.to_string());
            }
        }
        expirations.sort();

        debug!(symbol, count = expirations.len(), "Listed expirations");
        Ok(expirations)
    }

    async fn fetch(&self, symbol: &str, expiry_offset: usize) -> Result<ChainSnapshot> {
        let symbol = symbol.to_uppercase();
        let expirations = self.expirations(&symbol).await?;
        let expiration = select_expiration(&expirations, expiry_offset)
            .with_context(|| format!("No expiration dates found for {symbol}"))?
            .to_string();
        if expiry_offset >= expirations.len() {
            warn!(
                symbol = %symbol,
                expiry_offset,
                available = expirations.len(),
                "Expiry offset past last expiration, using last"
            );
        }

        let path = self.symbol_dir(&symbol).join(format!("{expiration}.json"));
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read chain file: {}", path.display()))?;
        let file: ChainFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse chain file: {}", path.display()))?;

        let snapshot = parse_chain(symbol, expiration, expirations, file)?;
        info!(
            chain = %snapshot.display_name(),
            calls = snapshot.calls.len(),
            puts = snapshot.puts.len(),
            "Loaded options chain"
        );
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        "json"
    }
}

fn parse_chain(
    underlying: String,
    expiration: String,
    expirations: Vec<String>,
    file: ChainFile,
) -> Result<ChainSnapshot, GexError> {
    let spot = decimal_field(Some(&file.spot), "spot")?
        .filter(|s| *s > Decimal::ZERO)
        .ok_or_else(|| GexError::invalid_input(format!("spot must be positive, got {}", file.spot)))?;

    let mut calls = Vec::new();
    let mut puts = Vec::new();
    for (group, rows) in file.data {
        let Some(right) = parse_right(&group) else {
            warn!(group = %group, rows = rows.len(), "Skipping unknown option type group");
            continue;
        };
        let target = match right {
            OptionRight::Call => &mut calls,
            OptionRight::Put => &mut puts,
        };
        for raw in &rows {
            target.push(parse_row(raw)?);
        }
    }

    Ok(ChainSnapshot {
        underlying,
        spot,
        expiration,
        expirations,
        calls,
        puts,
    })
}

fn parse_right(group: &str) -> Option<OptionRight> {
    match group.to_ascii_lowercase().as_str() {
        "call" | "calls" | "c" => Some(OptionRight::Call),
        "put" | "puts" | "p" => Some(OptionRight::Put),
        _ => None,
    }
}

fn parse_row(raw: &RawContract) -> Result<ContractRow, GexError> {
    Ok(ContractRow {
        strike: strike_field(raw.strike_price.as_ref())?,
        open_interest: count_field(raw.open_interest.as_ref(), "openInterest")?,
        volume: count_field(raw.volume.as_ref(), "volume")?,
        gamma: float_field(raw.gamma.as_ref(), "gamma")?,
        delta: float_field(raw.delta.as_ref(), "delta")?,
        implied_volatility: float_field(raw.volatility.as_ref(), "volatility")?,
    })
}

/// Text of a numeric value, `None` for missing, null or blank.
fn numeric_text(value: Option<&Value>, field: &str) -> Result<Option<String>, GexError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(GexError::invalid_input(format!(
            "{field} must be numeric, got {other}"
        ))),
    }
}

fn decimal_field(value: Option<&Value>, field: &str) -> Result<Option<Decimal>, GexError> {
    let Some(text) = numeric_text(value, field)? else {
        return Ok(None);
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|_| GexError::invalid_input(format!("{field} is not a number: {text:?}")))
}

/// Strike price; non-finite text reads as undefined.
fn strike_field(value: Option<&Value>) -> Result<Option<Decimal>, GexError> {
    match decimal_field(value, "strikePrice") {
        Err(err) => match numeric_text(value, "strikePrice")?.map(|t| t.parse::<f64>()) {
            Some(Ok(v)) if !v.is_finite() => Ok(None),
            _ => Err(err),
        },
        parsed => parsed,
    }
}

fn float_field(value: Option<&Value>, field: &str) -> Result<f64, GexError> {
    let Some(text) = numeric_text(value, field)? else {
        return Ok(0.0);
    };
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(GexError::invalid_input(format!(
            "{field} is not a finite number: {text:?}"
        ))),
    }
}

fn count_field(value: Option<&Value>, field: &str) -> Result<u64, GexError> {
    let v = float_field(value, field)?;
    if v < 0.0 || v.fract() != 0.0 || v > u64::MAX as f64 {
        return Err(GexError::invalid_input(format!(
            "{field} must be a non-negative whole number, got {v}"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(v as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw(value: Value) -> RawContract {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_numbers_and_numeric_strings() {
        let row = parse_row(&raw(json!({
            "strikePrice": "512.5",
            "openInterest": 1200,
            "volume": "300",
            "gamma": 0.041,
            "delta": "-0.45",
            "volatility": 14.2
        })))
        .unwrap();

        assert_eq!(row.strike, Some(dec!(512.5)));
        assert_eq!(row.open_interest, 1200);
        assert_eq!(row.volume, 300);
        assert!((row.delta + 0.45).abs() < 1e-12);
    }

    #[test]
    fn missing_fields_read_as_zero_and_undefined_strike() {
        let row = parse_row(&raw(json!({ "gamma": null }))).unwrap();
        assert_eq!(row.strike, None);
        assert_eq!(row.open_interest, 0);
        assert_eq!(row.gamma, 0.0);
    }

    #[test]
    fn non_numeric_text_is_invalid_input() {
        let err = parse_row(&raw(json!({ "strikePrice": 100, "gamma": "n/a" }))).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("gamma"));
    }

    #[test]
    fn non_finite_strike_is_undefined_not_an_error() {
        let file: ChainFile = serde_json::from_value(json!({
            "spot": 100,
            "data": {
                "Call": [
                    { "strikePrice": "NaN", "openInterest": 10 },
                    { "strikePrice": "inf", "openInterest": 10 },
                    { "strikePrice": 100, "openInterest": 10 }
                ]
            }
        }))
        .unwrap();

        let snap = parse_chain("SPY".into(), "2026-10-16".into(), vec![], file).unwrap();
        let strikes: Vec<_> = snap.calls.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![None, None, Some(dec!(100))]);
    }

    #[test]
    fn non_numeric_strike_is_still_invalid_input() {
        let err = parse_row(&raw(json!({ "strikePrice": "ATM" }))).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn groups_for_the_same_side_keep_a_stable_order() {
        let file: ChainFile = serde_json::from_value(json!({
            "spot": 100,
            "data": {
                "calls": [{ "strikePrice": 100, "openInterest": 2 }],
                "Call": [{ "strikePrice": 100, "openInterest": 1 }]
            }
        }))
        .unwrap();

        let snap = parse_chain("SPY".into(), "2026-10-16".into(), vec![], file).unwrap();
        let oi: Vec<u64> = snap.calls.iter().map(|r| r.open_interest).collect();
        assert_eq!(oi, vec![1, 2]);
    }

    #[test]
    fn fractional_or_negative_counts_are_invalid_input() {
        assert!(parse_row(&raw(json!({ "openInterest": 1.5 }))).is_err());
        assert!(parse_row(&raw(json!({ "volume": -3 }))).is_err());
    }

    #[test]
    fn non_positive_spot_is_invalid_input() {
        let file: ChainFile = serde_json::from_value(json!({ "spot": 0, "data": {} })).unwrap();
        let err = parse_chain("SPY".into(), "2026-10-16".into(), vec![], file).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn groups_rows_by_option_type() {
        let file: ChainFile = serde_json::from_value(json!({
            "spot": "101.25",
            "data": {
                "Call": [{ "strikePrice": 100, "openInterest": 10 }],
                "Put": [{ "strikePrice": 100, "openInterest": 20 },
                        { "strikePrice": 95, "openInterest": 5 }],
                "Spread": [{ "strikePrice": 1 }]
            }
        }))
        .unwrap();

        let snap = parse_chain("SPY".into(), "2026-10-16".into(), vec![], file).unwrap();
        assert_eq!(snap.spot, dec!(101.25));
        assert_eq!(snap.calls.len(), 1);
        assert_eq!(snap.puts.len(), 2);
    }
}
