//! Scenario extraction — one extractor per operation kind behind a shared
//! contract.
//!
//! An extractor consumes a [`ScenarioCandidate`], reads revision data through
//! the store, requests reconstructions, and produces a [`ScenarioDraft`] for
//! the record builder. Extractors never mutate the store.
//!
//! [`ExtractError::Skipped`] is not an error: it signals the candidate did
//! not yield a usable benchmark instance (a fast-forward merge, a cherry-pick
//! with no traceable source) and is dropped silently downstream. Each
//! extractor decides its own minimum-signal thresholds.

pub mod cherry_pick;
pub mod conflict;
pub mod merge;
pub mod patch_id;
pub mod rebase;
pub mod revert;
pub mod walk;

use std::fmt;

use thiserror::Error;

use quarry_git::{RevisionId, RevisionStore, StoreError};

use crate::model::{ScenarioCandidate, ScenarioDraft, ScenarioKind};
use crate::reconstruct::{ReconstructError, Reconstructor};

pub use cherry_pick::CherryPickExtractor;
pub use conflict::ConflictExtractor;
pub use merge::MergeExtractor;
pub use rebase::RebaseExtractor;
pub use revert::RevertExtractor;
pub use walk::HistoryWalk;

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The shared extraction contract.
pub trait Extractor: Send + Sync {
    /// The operation kind this extractor handles.
    fn kind(&self) -> ScenarioKind;

    /// Turn a candidate into a scenario draft, or explain why it doesn't
    /// qualify.
    fn extract(
        &self,
        candidate: &ScenarioCandidate,
        store: &dyn RevisionStore,
        reconstructor: &Reconstructor,
    ) -> Result<ScenarioDraft, ExtractError>;
}

/// Why extraction did not produce a draft.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Expected filtering outcome — the candidate is not a usable benchmark
    /// instance. Dropped silently.
    #[error("candidate skipped: {reason}")]
    Skipped {
        /// Why the candidate was filtered.
        reason: String,
    },

    /// Reconstruction hit a case outside the deterministic rule set. The
    /// candidate is skipped; the scan continues.
    #[error(transparent)]
    Reconstruction(#[from] ReconstructError),

    /// Reading revision data failed. Isolated per candidate by the
    /// orchestrator.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExtractError {
    /// Shorthand for [`ExtractError::Skipped`].
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// `true` for the expected (non-error) filtering outcomes.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        matches!(
            self,
            Self::Skipped { .. } | Self::Reconstruction(ReconstructError::Ambiguous { .. })
        )
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The fixed set of extractors, selected by the detector's classification.
pub struct ExtractorSet {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorSet {
    /// The standard set covering every log-driven kind.
    ///
    /// `allow_incomplete` opts the rebase extractor into accepting aborted or
    /// unfinished invocations (default policy is to reject them).
    #[must_use]
    pub fn standard(allow_incomplete: bool) -> Self {
        Self {
            extractors: vec![
                Box::new(MergeExtractor),
                Box::new(RebaseExtractor::new(allow_incomplete)),
                Box::new(CherryPickExtractor),
                Box::new(RevertExtractor),
                Box::new(ConflictExtractor),
            ],
        }
    }

    /// Find the extractor for a kind. `None` for kinds that are not
    /// candidate-driven (file chains come from the history walk).
    #[must_use]
    pub fn for_kind(&self, kind: ScenarioKind) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.kind() == kind)
            .map(AsRef::as_ref)
    }
}

// ---------------------------------------------------------------------------
// Shared description helpers
// ---------------------------------------------------------------------------

/// Line-level statistics for a diff between two revisions.
pub(crate) struct DiffStats {
    pub files: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) changed, +{}/-{}",
            self.files, self.insertions, self.deletions
        )
    }
}

/// Compute file and line counts for a diff. Binary blobs count as a changed
/// file with no line totals.
pub(crate) fn diff_stats(
    store: &dyn RevisionStore,
    old: Option<RevisionId>,
    new: RevisionId,
) -> Result<DiffStats, StoreError> {
    let entries = store.diff(old, new)?;
    let mut stats = DiffStats {
        files: entries.len(),
        insertions: 0,
        deletions: 0,
    };
    for entry in &entries {
        let old_text = read_side(store, entry.old_id)?;
        let new_text = read_side(store, entry.new_id)?;
        let (Some(old_text), Some(new_text)) = (old_text, new_text) else {
            continue;
        };
        let diff = similar::TextDiff::from_lines(old_text.as_str(), new_text.as_str());
        for change in diff.iter_all_changes() {
            match change.tag() {
                similar::ChangeTag::Insert => stats.insertions += 1,
                similar::ChangeTag::Delete => stats.deletions += 1,
                similar::ChangeTag::Equal => {}
            }
        }
    }
    Ok(stats)
}

/// Blob text for one side of a diff entry; zero id reads as empty, binary as
/// `None`.
fn read_side(store: &dyn RevisionStore, id: RevisionId) -> Result<Option<String>, StoreError> {
    if id.is_zero() {
        return Ok(Some(String::new()));
    }
    let bytes = store.blob(id)?;
    if bytes.contains(&0) {
        return Ok(None);
    }
    Ok(String::from_utf8(bytes).ok())
}

/// Abbreviated id for human-readable descriptions.
pub(crate) fn short_id(id: RevisionId) -> String {
    let hex = id.to_string();
    hex[..8].to_owned()
}
