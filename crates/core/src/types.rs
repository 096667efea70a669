//! Core types for options chain snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Standard US equity options contract multiplier.
pub const DEFAULT_CONTRACT_MULTIPLIER: Decimal = Decimal::ONE_HUNDRED;

/// Options contract right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

/// One call or put contract at a strike, as supplied by the chain source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRow {
    /// Strike price. `None` when the upstream row had no usable strike.
    pub strike: Option<Decimal>,
    pub open_interest: u64,
    pub volume: u64,
    /// Gamma per contract per $1 move in the underlying.
    pub gamma: f64,
    /// Delta per contract per $1 move in the underlying.
    pub delta: f64,
    /// Implied volatility in percent units (e.g. 18.5).
    pub implied_volatility: f64,
}

impl ContractRow {
    pub fn new(
        strike: Decimal,
        open_interest: u64,
        volume: u64,
        gamma: f64,
        delta: f64,
        implied_volatility: f64,
    ) -> Self {
        Self {
            strike: Some(strike),
            open_interest,
            volume,
            gamma,
            delta,
            implied_volatility,
        }
    }

    /// The strike if it is defined and strictly positive.
    #[must_use]
    pub fn valid_strike(&self) -> Option<Decimal> {
        self.strike.filter(|s| s.is_sign_positive() && !s.is_zero())
    }
}

/// Options chain for a single underlying and expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub underlying: String,
    pub spot: Decimal,
    /// Expiration label, passed through unchanged for display.
    pub expiration: String,
    /// All expirations the source offered, nearest first.
    pub expirations: Vec<String>,
    pub calls: Vec<ContractRow>,
    pub puts: Vec<ContractRow>,
}

impl ChainSnapshot {
    /// Total number of contract rows on both sides.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    /// Human-readable description (e.g. "SPY 2026-10-16 @ 512.34").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {} @ {}", self.underlying, self.expiration, self.spot)
    }
}
