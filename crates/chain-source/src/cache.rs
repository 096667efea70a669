//! Time-bounded memoization of chain fetches.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use gex_lab_core::ChainSnapshot;

use crate::source::ChainSource;

/// Default time a fetched snapshot stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    fetched_at: Instant,
    snapshot: ChainSnapshot,
}

/// Wraps a [`ChainSource`] and reuses snapshots younger than `ttl`.
///
/// Entries are keyed by `(symbol, expiry_offset)`. Failed fetches are not
/// cached.
pub struct CachedChainSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<(String, usize), CacheEntry>>,
}

impl<S: ChainSource> CachedChainSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops every cached snapshot so the next fetch goes to the source.
    pub async fn invalidate(&self) {
        let mut entries = self.entries.lock().await;
        debug!(evicted = entries.len(), "Chain cache cleared");
        entries.clear();
    }

    /// Number of cached snapshots, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl<S: ChainSource> ChainSource for CachedChainSource<S> {
    async fn expirations(&self, symbol: &str) -> Result<Vec<String>> {
        self.inner.expirations(symbol).await
    }

    async fn fetch(&self, symbol: &str, expiry_offset: usize) -> Result<ChainSnapshot> {
        let key = (symbol.to_uppercase(), expiry_offset);

        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    debug!(symbol = %key.0, expiry_offset, "Chain cache hit");
                    return Ok(entry.snapshot.clone());
                }
            }
        }

        debug!(symbol = %key.0, expiry_offset, source = self.inner.name(), "Chain cache miss");
        let snapshot = self.inner.fetch(symbol, expiry_offset).await?;

        self.entries.lock().await.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                snapshot: snapshot.clone(),
            },
        );
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use anyhow::bail;
    use rust_decimal_macros::dec;

    struct CountingSource {
        fetches: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingSource {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let fetches = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fetches: Arc::clone(&fetches),
                    fail: false,
                },
                fetches,
            )
        }
    }

    #[async_trait]
    impl ChainSource for CountingSource {
        async fn expirations(&self, _symbol: &str) -> Result<Vec<String>> {
            Ok(vec!["2026-10-16".to_string()])
        }

        async fn fetch(&self, symbol: &str, _expiry_offset: usize) -> Result<ChainSnapshot> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("upstream unavailable");
            }
            Ok(ChainSnapshot {
                underlying: symbol.to_uppercase(),
                spot: dec!(100),
                expiration: "2026-10-16".to_string(),
                expirations: vec!["2026-10-16".to_string()],
                calls: vec![],
                puts: vec![],
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn fresh_entries_are_reused() {
        let (source, fetches) = CountingSource::new();
        let cached = CachedChainSource::new(source);

        let a = cached.fetch("spy", 0).await.unwrap();
        let b = cached.fetch("SPY", 0).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cached.len().await, 1);
    }

    #[tokio::test]
    async fn different_offsets_are_cached_separately() {
        let (source, fetches) = CountingSource::new();
        let cached = CachedChainSource::new(source);

        cached.fetch("SPY", 0).await.unwrap();
        cached.fetch("SPY", 1).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let (source, fetches) = CountingSource::new();
        let cached = CachedChainSource::with_ttl(source, Duration::ZERO);

        cached.fetch("SPY", 0).await.unwrap();
        cached.fetch("SPY", 0).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let (source, fetches) = CountingSource::new();
        let cached = CachedChainSource::new(source);

        cached.fetch("SPY", 0).await.unwrap();
        cached.invalidate().await;
        assert!(cached.is_empty().await);
        cached.fetch("SPY", 0).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (mut source, fetches) = CountingSource::new();
        source.fail = true;
        let cached = CachedChainSource::new(source);

        assert!(cached.fetch("SPY", 0).await.is_err());
        assert!(cached.fetch("SPY", 0).await.is_err());

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert!(cached.is_empty().await);
    }
}
