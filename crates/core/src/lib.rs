//! Gamma exposure (GEX) engine for options chains.
//!
//! Folds call/put contract rows into a strike-ordered exposure table and
//! classifies dealer-positioning key levels (magnet, flip, walls, support,
//! resistance) plus the gamma regime around spot. Everything here is a pure
//! function of its inputs; fetching and caching chains lives in
//! `gex-lab-chain`.

pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod exposure;
pub mod levels;
pub mod report_formatter;
pub mod summary;
pub mod types;

pub use analysis::{analyze, AnalysisConfig, GexReport};
pub use config::{AppConfig, SourceConfig};
pub use config_loader::ConfigLoader;
pub use error::{GexError, Result};
pub use exposure::{aggregate, aggregate_default, ExposureRecord, ExposureTable};
pub use levels::{
    classify, classify_with, ClassifierConfig, FlipSearch, GammaRegime, KeyLevels,
    ANALYSIS_WINDOW_PCT, FLIP_PROXIMITY_PCT,
};
pub use report_formatter::ReportFormatter;
pub use summary::{display_range, ExposureSummary};
pub use types::{ChainSnapshot, ContractRow, OptionRight, DEFAULT_CONTRACT_MULTIPLIER};
