//! Options chain sources for the GEX engine.
//!
//! The core never fetches anything itself. Hosts hand it snapshots obtained
//! through a [`ChainSource`], optionally wrapped in a [`CachedChainSource`]
//! for time-bounded memoization.

pub mod cache;
pub mod json_source;
pub mod source;

pub use cache::CachedChainSource;
pub use json_source::JsonChainSource;
pub use source::{select_expiration, ChainSource};
