//! Event signal detection — turning operation logs and marker files into
//! scenario candidates.
//!
//! The detector is the sequential, single-pass front of the mining pipeline:
//! it scans one reference's operation log at a time, classifies entries
//! against the phrase table, groups multi-step runs, and surfaces any
//! operation currently stopped mid-flight. Everything downstream (extraction,
//! reconstruction, validation) consumes its [`ScenarioCandidate`]s.

pub mod classify;
pub mod group;
pub mod markers;

pub use classify::{PhraseTable, RebasePhase, rebase_phase};
pub use markers::{SequencerStep, parse_sequencer_todo};

use quarry_git::{RefName, RevisionStore, StoreError};

use crate::model::ScenarioCandidate;

/// Scans operation logs for candidate operation boundaries.
#[derive(Clone, Debug)]
pub struct SignalDetector {
    table: PhraseTable,
    gap_secs: u64,
}

impl SignalDetector {
    /// Create a detector with the default phrase table and the given
    /// grouping gap.
    #[must_use]
    pub fn new(gap_secs: u64) -> Self {
        Self {
            table: PhraseTable::default(),
            gap_secs,
        }
    }

    /// Replace the phrase table (extension point for additional operation
    /// kinds).
    #[must_use]
    pub fn with_table(mut self, table: PhraseTable) -> Self {
        self.table = table;
        self
    }

    /// Detect candidates in one reference's operation log, oldest first.
    pub fn detect(
        &self,
        store: &dyn RevisionStore,
        ref_name: &RefName,
    ) -> Result<Vec<ScenarioCandidate>, StoreError> {
        let entries = store.operation_log(ref_name)?;
        let candidates = group::group_entries(ref_name, &entries, &self.table, self.gap_secs);
        tracing::debug!(
            reference = %ref_name,
            entries = entries.len(),
            candidates = candidates.len(),
            "scanned operation log"
        );
        Ok(candidates)
    }

    /// Detect an operation currently stopped mid-flight, if any.
    pub fn detect_in_progress(
        &self,
        store: &dyn RevisionStore,
    ) -> Result<Vec<ScenarioCandidate>, StoreError> {
        markers::detect_in_progress(store)
    }
}
