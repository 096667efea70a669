//! Display-range filtering and aggregate metrics.
//!
//! The display range is whatever strike band a caller wants to show or
//! export. It never feeds the level classifier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{GexError, Result};
use crate::exposure::{require_positive, ExposureRecord, ExposureTable};

/// Records whose strike lies within `spot × (1 ± range_pct)`, inclusive.
///
/// # Errors
/// Returns `InvalidInput` if `spot` is not positive or `range_pct` is
/// negative.
pub fn display_range(
    table: &ExposureTable,
    spot: Decimal,
    range_pct: Decimal,
) -> Result<Vec<&ExposureRecord>> {
    require_positive("spot", spot)?;
    if range_pct.is_sign_negative() {
        return Err(GexError::invalid_input(format!(
            "display range must not be negative, got {range_pct}"
        )));
    }

    let lower = spot * (Decimal::ONE - range_pct);
    let upper = spot * (Decimal::ONE + range_pct);
    Ok(table
        .iter()
        .filter(|r| r.strike >= lower && r.strike <= upper)
        .collect())
}

/// Totals over a set of exposure records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureSummary {
    pub strikes: usize,
    pub call_gex: f64,
    pub put_gex: f64,
    pub net_gex: f64,
    pub net_dex: f64,
    pub call_oi: u64,
    pub put_oi: u64,
    pub call_volume: u64,
    pub put_volume: u64,
    /// Put open interest over call open interest, 0 without call OI.
    pub put_call_oi_ratio: f64,
    /// Put volume over call volume, 0 without call volume.
    pub put_call_volume_ratio: f64,
}

impl ExposureSummary {
    #[must_use]
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ExposureRecord>,
    {
        let mut summary = records
            .into_iter()
            .fold(Self::default(), |mut acc, r| {
                acc.strikes += 1;
                acc.call_gex += r.call_gex;
                acc.put_gex += r.put_gex;
                acc.net_gex += r.net_gex;
                acc.net_dex += r.net_dex;
                acc.call_oi += r.call_oi;
                acc.put_oi += r.put_oi;
                acc.call_volume += r.call_volume;
                acc.put_volume += r.put_volume;
                acc
            });

        summary.put_call_oi_ratio = ratio(summary.put_oi, summary.call_oi);
        summary.put_call_volume_ratio = ratio(summary.put_volume, summary.call_volume);
        summary
    }

    #[must_use]
    pub fn total_oi(&self) -> u64 {
        self.call_oi + self.put_oi
    }

    #[must_use]
    pub fn total_volume(&self) -> u64 {
        self.call_volume + self.put_volume
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::aggregate_default;
    use crate::types::ContractRow;
    use rust_decimal_macros::dec;

    fn sample_table() -> ExposureTable {
        let calls = vec![
            ContractRow::new(dec!(90), 100, 10, 0.01, 0.9, 30.0),
            ContractRow::new(dec!(100), 400, 200, 0.05, 0.5, 20.0),
            ContractRow::new(dec!(110), 300, 50, 0.01, 0.1, 25.0),
        ];
        let puts = vec![
            ContractRow::new(dec!(95), 600, 300, 0.03, -0.3, 22.0),
            ContractRow::new(dec!(100), 200, 100, 0.05, -0.5, 21.0),
        ];
        aggregate_default(&calls, &puts, dec!(100)).unwrap()
    }

    #[test]
    fn display_range_is_inclusive() {
        let table = sample_table();
        let strikes: Vec<Decimal> = display_range(&table, dec!(100), dec!(0.05))
            .unwrap()
            .iter()
            .map(|r| r.strike)
            .collect();
        assert_eq!(strikes, vec![dec!(95), dec!(100)]);

        let wide = display_range(&table, dec!(100), dec!(0.10)).unwrap();
        assert_eq!(wide.len(), 4);
    }

    #[test]
    fn display_range_rejects_bad_inputs() {
        let table = sample_table();
        assert!(display_range(&table, dec!(0), dec!(0.05)).is_err());
        assert!(display_range(&table, dec!(100), dec!(-0.01)).is_err());
    }

    #[test]
    fn summary_totals_and_ratios() {
        let table = sample_table();
        let records = display_range(&table, dec!(100), dec!(0.05)).unwrap();
        let summary = ExposureSummary::from_records(records);

        assert_eq!(summary.strikes, 2);
        assert_eq!(summary.call_oi, 400);
        assert_eq!(summary.put_oi, 800);
        assert_eq!(summary.total_oi(), 1200);
        assert_eq!(summary.call_volume, 200);
        assert_eq!(summary.put_volume, 400);
        assert_eq!(summary.total_volume(), 600);
        assert!((summary.put_call_oi_ratio - 2.0).abs() < 1e-12);
        assert!((summary.put_call_volume_ratio - 2.0).abs() < 1e-12);
        assert!((summary.net_gex - (summary.call_gex + summary.put_gex)).abs() < 1e-6);
    }

    #[test]
    fn ratios_are_zero_without_calls() {
        let puts = vec![ContractRow::new(dec!(100), 50, 5, 0.01, -0.5, 20.0)];
        let table = aggregate_default(&[], &puts, dec!(100)).unwrap();
        let summary = ExposureSummary::from_records(&table);

        assert_eq!(summary.put_call_oi_ratio, 0.0);
        assert_eq!(summary.put_call_volume_ratio, 0.0);
    }

    #[test]
    fn empty_summary_is_default() {
        let summary = ExposureSummary::from_records(&ExposureTable::default());
        assert_eq!(summary, ExposureSummary::default());
    }
}
