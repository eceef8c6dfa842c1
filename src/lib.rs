//! quarry library crate — the repository history scenario miner.
//!
//! The primary interface is the `quarry` binary, but the whole pipeline is
//! exposed as a library so integration tests (and embedding orchestrators)
//! can run scans directly: open a [`quarry_git::GixStore`], build a
//! [`config::MinerConfig`], pick a [`sink::Sink`], and call [`scan::scan`].

pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod reconstruct;
pub mod scan;
pub mod signal;
pub mod sink;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::MinerConfig;
pub use error::ScanError;
pub use scan::{CancelFlag, ScanOutcome, scan, scan_with_cancel};
pub use sink::{JsonLinesSink, Sink, VecSink};
