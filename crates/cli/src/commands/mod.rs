//! CLI commands for the GEX key-level engine.

pub mod chain_args;
pub mod expirations;
pub mod export;
pub mod levels;

pub use chain_args::ChainArgs;
pub use expirations::{run_expirations, ExpirationsArgs};
pub use export::{run_export, ExportArgs};
pub use levels::{run_levels, LevelsArgs};
