use anyhow::{bail, Result};
use async_trait::async_trait;
use gex_lab_core::ChainSnapshot;

/// Supplies option chain snapshots for an underlying.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Available expiration labels, nearest first.
    async fn expirations(&self, symbol: &str) -> Result<Vec<String>>;

    /// Snapshot for the expiration `expiry_offset` steps out from the
    /// nearest one. Offsets past the last expiration use the last one.
    async fn fetch(&self, symbol: &str, expiry_offset: usize) -> Result<ChainSnapshot>;

    fn name(&self) -> &str;
}

/// Picks the expiration at `offset`, clamped to the last available one.
///
/// # Errors
/// Returns an error if there are no expirations at all.
pub fn select_expiration(expirations: &[String], offset: usize) -> Result<&str> {
    let Some(last) = expirations.len().checked_sub(1) else {
        bail!("no expirations available");
    };
    Ok(&expirations[offset.min(last)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec![
            "2026-10-16".to_string(),
            "2026-10-19".to_string(),
            "2026-10-23".to_string(),
        ]
    }

    #[test]
    fn selects_by_offset() {
        let exp = labels();
        assert_eq!(select_expiration(&exp, 0).unwrap(), "2026-10-16");
        assert_eq!(select_expiration(&exp, 2).unwrap(), "2026-10-23");
    }

    #[test]
    fn clamps_offset_past_the_end() {
        let exp = labels();
        assert_eq!(select_expiration(&exp, 9).unwrap(), "2026-10-23");
    }

    #[test]
    fn empty_expirations_is_an_error() {
        assert!(select_expiration(&[], 0).is_err());
    }
}
