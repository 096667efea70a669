//! One-shot analysis of a chain snapshot: exposure table, key levels and
//! display-range summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::exposure::{aggregate, ExposureRecord, ExposureTable};
use crate::levels::{classify_with, ClassifierConfig, KeyLevels};
use crate::summary::{display_range, ExposureSummary};
use crate::types::{ChainSnapshot, DEFAULT_CONTRACT_MULTIPLIER};

/// Analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Shares per contract.
    pub contract_multiplier: Decimal,
    /// Half-width of the display range as a fraction of spot. Only affects
    /// the summary and exports, never the key levels.
    pub display_range_pct: Decimal,
    pub classifier: ClassifierConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            contract_multiplier: DEFAULT_CONTRACT_MULTIPLIER,
            display_range_pct: Decimal::new(5, 2),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Everything derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GexReport {
    pub underlying: String,
    pub expiration: String,
    pub spot: Decimal,
    pub display_range_pct: Decimal,
    pub table: ExposureTable,
    pub levels: KeyLevels,
    /// Totals over the display range.
    pub summary: ExposureSummary,
}

impl GexReport {
    /// True when the snapshot had no usable strikes. This is a normal
    /// market-data condition, not an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Records inside the display range, ascending by strike.
    #[must_use]
    pub fn display_records(&self) -> Vec<&ExposureRecord> {
        let lower = self.spot * (Decimal::ONE - self.display_range_pct);
        let upper = self.spot * (Decimal::ONE + self.display_range_pct);
        self.table
            .iter()
            .filter(|r| r.strike >= lower && r.strike <= upper)
            .collect()
    }
}

/// Runs aggregation, classification and summary for `snapshot`.
///
/// # Errors
/// Returns `InvalidInput` for a non-positive spot or multiplier, or a
/// negative display range.
pub fn analyze(snapshot: &ChainSnapshot, config: &AnalysisConfig) -> Result<GexReport> {
    let table = aggregate(
        &snapshot.calls,
        &snapshot.puts,
        snapshot.spot,
        config.contract_multiplier,
    )?;
    let levels = classify_with(&table, snapshot.spot, &config.classifier)?;
    let summary =
        ExposureSummary::from_records(display_range(&table, snapshot.spot, config.display_range_pct)?);

    info!(
        underlying = %snapshot.underlying,
        expiration = %snapshot.expiration,
        spot = %snapshot.spot,
        strikes = table.len(),
        regime = %levels.regime,
        net_gex = summary.net_gex,
        "GEX analysis complete"
    );

    Ok(GexReport {
        underlying: snapshot.underlying.clone(),
        expiration: snapshot.expiration.clone(),
        spot: snapshot.spot,
        display_range_pct: config.display_range_pct,
        table,
        levels,
        summary,
    })
}
