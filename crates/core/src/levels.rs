//! Key-level classification over an exposure table.
//!
//! All levels are searched inside a fixed analysis window around spot
//! (±5%). That window is separate from whatever strike range a
//! caller chooses to display, so display settings never move the levels.
//!
//! Arg-max selections scan strikes in ascending order and only replace the
//! current best on a strictly greater value, so ties resolve to the lowest
//! strike.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::exposure::{require_positive, ExposureRecord, ExposureTable};

/// Net gamma regime at the strike nearest spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GammaRegime {
    /// Dealers long gamma: hedging dampens moves, price tends to mean-revert.
    Positive,
    /// Dealers short gamma: hedging amplifies moves, price tends to trend.
    Negative,
    /// No strikes inside the analysis window.
    Unknown,
}

impl GammaRegime {
    /// Short description of the expected price behavior.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Positive => "Mean-reverting, stable",
            Self::Negative => "Trending, volatile",
            Self::Unknown => "No data near spot",
        }
    }
}

impl std::fmt::Display for GammaRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "POSITIVE"),
            Self::Negative => write!(f, "NEGATIVE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How the gamma flip is picked when several sign crossings qualify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipSearch {
    /// First qualifying crossing scanning up from the lowest window strike.
    /// A closer crossing higher up is ignored.
    #[default]
    FirstFromLowest,
    /// Qualifying crossing whose midpoint is nearest spot (lowest wins ties).
    NearestToSpot,
}

/// Half-width of the analysis window as a fraction of spot.
pub const ANALYSIS_WINDOW_PCT: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// A sign crossing only counts as a flip if one of its strikes is closer to
/// spot than this fraction of spot.
pub const FLIP_PROXIMITY_PCT: Decimal = Decimal::from_parts(3, 0, 0, false, 2);

/// Parameters of the level classifier. The window and flip proximity are
/// fixed; only the flip policy can be chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub flip_search: FlipSearch,
}

/// Key levels for one snapshot. Any level may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    /// Strike with the largest positive net GEX.
    pub magnet: Option<Decimal>,
    /// Strike above spot with the largest total gamma.
    pub resistance: Option<Decimal>,
    /// Strike below spot with the largest total gamma.
    pub support: Option<Decimal>,
    /// Midpoint of the net GEX sign crossing near spot.
    pub flip: Option<Decimal>,
    /// Strike with the largest put open interest.
    pub put_wall: Option<Decimal>,
    /// Strike with the largest call open interest.
    pub call_wall: Option<Decimal>,
    pub regime: GammaRegime,
}

impl KeyLevels {
    /// Record with every level absent and an unknown regime.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            magnet: None,
            resistance: None,
            support: None,
            flip: None,
            put_wall: None,
            call_wall: None,
            regime: GammaRegime::Unknown,
        }
    }

    /// True when there was nothing in the analysis window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regime == GammaRegime::Unknown
    }
}

/// Classifies with the default flip policy.
///
/// # Errors
/// Returns `InvalidInput` if `spot` is not positive.
pub fn classify(table: &ExposureTable, spot: Decimal) -> Result<KeyLevels> {
    classify_with(table, spot, &ClassifierConfig::default())
}

/// Classifies key levels for `table` around `spot`.
///
/// Never fails for empty or degenerate tables; those yield
/// [`KeyLevels::empty`] or a record with absent fields.
///
/// # Errors
/// Returns `InvalidInput` if `spot` is not positive.
pub fn classify_with(
    table: &ExposureTable,
    spot: Decimal,
    config: &ClassifierConfig,
) -> Result<KeyLevels> {
    require_positive("spot", spot)?;

    let lower = spot * (Decimal::ONE - ANALYSIS_WINDOW_PCT);
    let upper = spot * (Decimal::ONE + ANALYSIS_WINDOW_PCT);
    let window: Vec<&ExposureRecord> = table
        .iter()
        .filter(|r| r.strike >= lower && r.strike <= upper)
        .collect();

    if window.is_empty() {
        debug!(%spot, strikes = table.len(), "No strikes in analysis window");
        return Ok(KeyLevels::empty());
    }

    let levels = KeyLevels {
        magnet: arg_max(window.iter().copied().filter(|r| r.net_gex > 0.0), |r| {
            r.net_gex
        }),
        resistance: arg_max(window.iter().copied().filter(|r| r.strike > spot), |r| {
            r.total_gamma
        }),
        support: arg_max(window.iter().copied().filter(|r| r.strike < spot), |r| {
            r.total_gamma
        }),
        flip: find_flip(&window, spot, config),
        put_wall: wall(&window, |r| r.put_oi),
        call_wall: wall(&window, |r| r.call_oi),
        regime: regime_near(&window, spot),
    };

    debug!(
        %spot,
        window = window.len(),
        regime = %levels.regime,
        flip = ?levels.flip,
        magnet = ?levels.magnet,
        "Classified key levels"
    );

    Ok(levels)
}

/// Strike of the record with the largest `key`; lowest strike on ties.
fn arg_max<'a, I, F>(records: I, key: F) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a ExposureRecord>,
    F: Fn(&ExposureRecord) -> f64,
{
    let mut best: Option<(&ExposureRecord, f64)> = None;
    for rec in records {
        let value = key(rec);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((rec, value)),
        }
    }
    best.map(|(rec, _)| rec.strike)
}

/// Strike with the most open interest; absent when every strike has none.
fn wall<F>(window: &[&ExposureRecord], oi: F) -> Option<Decimal>
where
    F: Fn(&ExposureRecord) -> u64,
{
    let mut best: Option<(&ExposureRecord, u64)> = None;
    for &rec in window {
        let value = oi(rec);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((rec, value)),
        }
    }
    best.filter(|(_, value)| *value > 0).map(|(rec, _)| rec.strike)
}

/// Adjacent window pairs whose net GEX strictly changes sign and where at
/// least one strike sits within the flip proximity of spot.
fn qualifying_crossings<'a>(
    window: &'a [&'a ExposureRecord],
    spot: Decimal,
) -> impl Iterator<Item = Decimal> + 'a {
    let max_distance = spot * FLIP_PROXIMITY_PCT;
    window.windows(2).filter_map(move |pair| {
        let (a, b) = (pair[0], pair[1]);
        if a.net_gex * b.net_gex >= 0.0 {
            return None;
        }
        let near = (a.strike - spot).abs() < max_distance || (b.strike - spot).abs() < max_distance;
        near.then(|| (a.strike + b.strike) / Decimal::TWO)
    })
}

fn find_flip(window: &[&ExposureRecord], spot: Decimal, config: &ClassifierConfig) -> Option<Decimal> {
    let mut crossings = qualifying_crossings(window, spot);
    match config.flip_search {
        FlipSearch::FirstFromLowest => crossings.next(),
        FlipSearch::NearestToSpot => {
            crossings.fold(None, |best: Option<Decimal>, mid| match best {
                Some(b) if (mid - spot).abs() >= (b - spot).abs() => Some(b),
                _ => Some(mid),
            })
        }
    }
}

/// Regime at the window strike nearest spot. On an exact distance tie the
/// lower strike is used.
fn regime_near(window: &[&ExposureRecord], spot: Decimal) -> GammaRegime {
    let mut nearest: Option<&ExposureRecord> = None;
    for &rec in window {
        match nearest {
            Some(n) if (rec.strike - spot).abs() >= (n.strike - spot).abs() => {}
            _ => nearest = Some(rec),
        }
    }
    match nearest {
        Some(rec) if rec.net_gex > 0.0 => GammaRegime::Positive,
        Some(_) => GammaRegime::Negative,
        None => GammaRegime::Unknown,
    }
}
