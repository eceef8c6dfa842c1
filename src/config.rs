//! Miner configuration (`quarry.toml`).
//!
//! Defines the typed configuration for a repository scan. Missing fields use
//! sensible defaults; a missing file means all defaults (no error).

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Configuration for one repository scan.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinerConfig {
    /// References to scan. Empty means all local branches (plus `HEAD`,
    /// whose log carries the step-by-step trace of interactive operations).
    #[serde(default)]
    pub refs: Vec<String>,

    /// Extraction worker threads. `0` sizes the pool to the machine.
    #[serde(default)]
    pub workers: usize,

    /// Two same-kind log entries further apart than this many seconds are
    /// treated as separate invocations.
    #[serde(default = "default_group_gap_secs")]
    pub group_gap_secs: u64,

    /// Accept rebase invocations that were aborted or left unfinished.
    #[serde(default)]
    pub allow_incomplete: bool,

    /// Minimum run length for a file-chain scenario.
    #[serde(default = "default_chain_window")]
    pub chain_window: usize,

    /// Upper bound on cherry-picks mined via patch identity per scan.
    #[serde(default = "default_max_extra_cherry_picks")]
    pub max_extra_cherry_picks: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            refs: Vec::new(),
            workers: 0,
            group_gap_secs: default_group_gap_secs(),
            allow_incomplete: false,
            chain_window: default_chain_window(),
            max_extra_cherry_picks: default_max_extra_cherry_picks(),
        }
    }
}

const fn default_group_gap_secs() -> u64 {
    // Half an hour: comfortably spans one interactive session while
    // splitting separate sessions on the same day.
    1800
}

const fn default_chain_window() -> usize {
    3
}

const fn default_max_extra_cherry_picks() -> usize {
    50
}

impl MinerConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError {
                    path: path.display().to_string(),
                    detail: e.to_string(),
                });
            }
        };
        toml::from_str(&text).map_err(|e| ConfigError {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// The worker count to actually use.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(1, std::num::NonZero::get)
    }
}

/// A configuration file could not be loaded or parsed.
#[derive(Debug, Error)]
#[error("config error in {path}: {detail}")]
pub struct ConfigError {
    /// Path to the configuration file.
    pub path: String,
    /// Human-readable description of the problem.
    pub detail: String,
}
