use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub source: SourceConfig,
}

/// Where option chains come from and how long they are cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Root directory holding `<SYMBOL>/<expiration>.json` chain files.
    pub data_dir: String,
    pub default_symbol: String,
    /// 0 = nearest expiration.
    pub expiry_offset: usize,
    pub cache_ttl_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/chains".to_string(),
            default_symbol: "SPY".to_string(),
            expiry_offset: 0,
            cache_ttl_secs: 300,
        }
    }
}
