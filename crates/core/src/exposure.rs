//! Exposure aggregation: folds call and put contract rows into a
//! strike-ordered gamma/delta exposure table.
//!
//! Sign convention: dealer hedging flow from calls is positive and from puts
//! is negative. A strike missing one side gets zero for every field of that
//! side.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GexError, Result};
use crate::types::{ContractRow, DEFAULT_CONTRACT_MULTIPLIER};

/// Exposure at a single strike for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub strike: Decimal,
    pub call_gex: f64,
    pub put_gex: f64,
    pub net_gex: f64,
    pub net_dex: f64,
    /// Un-scaled gamma weighted by open interest, used to rank support and
    /// resistance.
    pub total_gamma: f64,
    pub call_oi: u64,
    pub put_oi: u64,
    pub total_oi: u64,
    pub call_volume: u64,
    pub put_volume: u64,
    pub total_volume: u64,
    pub call_gamma: f64,
    pub put_gamma: f64,
    pub call_delta: f64,
    pub put_delta: f64,
    pub call_iv: f64,
    pub put_iv: f64,
    pub avg_iv: f64,
}

/// Strike-ordered exposure table. Strikes are strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureTable {
    records: Vec<ExposureRecord>,
}

impl ExposureTable {
    #[must_use]
    pub fn records(&self) -> &[ExposureRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExposureRecord> {
        self.records.iter()
    }

    /// Looks up the record for an exact strike.
    #[must_use]
    pub fn get(&self, strike: Decimal) -> Option<&ExposureRecord> {
        self.records
            .binary_search_by(|r| r.strike.cmp(&strike))
            .ok()
            .map(|i| &self.records[i])
    }

    #[must_use]
    pub fn strikes(&self) -> Vec<Decimal> {
        self.records.iter().map(|r| r.strike).collect()
    }
}

impl<'a> IntoIterator for &'a ExposureTable {
    type Item = &'a ExposureRecord;
    type IntoIter = std::slice::Iter<'a, ExposureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Call and put rows matched to one strike.
#[derive(Debug, Default)]
struct StrikeSides<'a> {
    call: Option<&'a ContractRow>,
    put: Option<&'a ContractRow>,
}

/// Per-side contribution at a strike. Zero when the side is absent.
#[derive(Debug, Default, Clone, Copy)]
struct SideInputs {
    open_interest: u64,
    volume: u64,
    gamma: f64,
    delta: f64,
    iv: f64,
}

impl SideInputs {
    fn from_row(row: Option<&ContractRow>) -> Self {
        match row {
            Some(r) => Self {
                open_interest: r.open_interest,
                volume: r.volume,
                gamma: r.gamma,
                delta: r.delta,
                iv: r.implied_volatility,
            },
            None => Self::default(),
        }
    }

    fn oi(&self) -> f64 {
        self.open_interest as f64
    }
}

/// Aggregates with the standard multiplier of 100.
///
/// # Errors
/// Returns `InvalidInput` if `spot` is not positive.
pub fn aggregate_default(
    calls: &[ContractRow],
    puts: &[ContractRow],
    spot: Decimal,
) -> Result<ExposureTable> {
    aggregate(calls, puts, spot, DEFAULT_CONTRACT_MULTIPLIER)
}

/// Builds the exposure table for one snapshot.
///
/// Rows with a missing or non-positive strike are skipped. If a side has
/// several rows at the same strike, the first one in input order is used.
///
/// # Errors
/// Returns `InvalidInput` if `spot` or `multiplier` is not positive.
pub fn aggregate(
    calls: &[ContractRow],
    puts: &[ContractRow],
    spot: Decimal,
    multiplier: Decimal,
) -> Result<ExposureTable> {
    require_positive("spot", spot)?;
    require_positive("contract multiplier", multiplier)?;

    let mut by_strike: BTreeMap<Decimal, StrikeSides<'_>> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in calls {
        match row.valid_strike() {
            Some(strike) => {
                let sides = by_strike.entry(strike).or_default();
                if sides.call.is_none() {
                    sides.call = Some(row);
                }
            }
            None => skipped += 1,
        }
    }
    for row in puts {
        match row.valid_strike() {
            Some(strike) => {
                let sides = by_strike.entry(strike).or_default();
                if sides.put.is_none() {
                    sides.put = Some(row);
                }
            }
            None => skipped += 1,
        }
    }

    let spot_f = to_f64(spot);
    let mult_f = to_f64(multiplier);

    let records: Vec<ExposureRecord> = by_strike
        .into_iter()
        .map(|(strike, sides)| build_record(strike, &sides, spot_f, mult_f))
        .collect();

    debug!(
        calls = calls.len(),
        puts = puts.len(),
        strikes = records.len(),
        skipped,
        %spot,
        "Aggregated exposure table"
    );

    Ok(ExposureTable { records })
}

fn build_record(strike: Decimal, sides: &StrikeSides<'_>, spot: f64, mult: f64) -> ExposureRecord {
    let call = SideInputs::from_row(sides.call);
    let put = SideInputs::from_row(sides.put);

    let call_gex = call.gamma * call.oi() * mult * spot;
    let put_gex = -(put.gamma * put.oi() * mult * spot);
    let net_dex = call.delta * call.oi() * mult + put.delta * put.oi() * mult;

    let iv_sum = call.iv + put.iv;
    let avg_iv = if iv_sum > 0.0 { iv_sum / 2.0 } else { 0.0 };

    ExposureRecord {
        strike,
        call_gex,
        put_gex,
        net_gex: call_gex + put_gex,
        net_dex,
        total_gamma: call.gamma * call.oi() + put.gamma * put.oi(),
        call_oi: call.open_interest,
        put_oi: put.open_interest,
        total_oi: call.open_interest + put.open_interest,
        call_volume: call.volume,
        put_volume: put.volume,
        total_volume: call.volume + put.volume,
        call_gamma: call.gamma,
        put_gamma: put.gamma,
        call_delta: call.delta,
        put_delta: put.delta,
        call_iv: call.iv,
        put_iv: put.iv,
        avg_iv,
    }
}

pub(crate) fn require_positive(name: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(GexError::invalid_input(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
