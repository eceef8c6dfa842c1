//! Pure three-way reconstruction of transient merge states.
//!
//! Given a common ancestor and two sides about to be combined, recompute the
//! file-level result a naive three-way merge would produce — including
//! conflict markers wherever both sides changed overlapping lines differently
//! from the ancestor. Everything is derived from immutable tree content: no
//! working copy, no external processes, no historical replay. The same three
//! inputs always produce the same output, so reconstructions are safe to
//! re-run and trivially parallelizable.
//!
//! Resolution rules per path touched by either side relative to the base:
//!
//! 1. **Hash equality**: both sides produced the same blob — take it.
//! 2. **One-sided change**: only one side touched the path — take that side.
//! 3. **Delete/delete**: the path is gone; it does not appear in the result.
//! 4. **Modify/delete**: outside the line-merge rule set —
//!    [`ReconstructError::Ambiguous`].
//! 5. **Line merge**: both sides changed text content — three-way line merge;
//!    overlapping divergent hunks become standard
//!    `<<<<<<<`/`=======`/`>>>>>>>` blocks with ancestor content omitted.
//!    Binary content cannot be line-merged and is ambiguous.

use std::collections::BTreeMap;

use thiserror::Error;

use quarry_git::{ChangeKind, RevisionId, RevisionStore, StoreError};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The reconstructed content of one file after a naive three-way merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergedFile {
    /// The merge resolved cleanly; content has no markers.
    Clean(String),
    /// Overlapping divergent edits; content contains conflict markers.
    Conflicted(String),
}

impl MergedFile {
    /// The file content, markers included for conflicted files.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Clean(text) | Self::Conflicted(text) => text,
        }
    }

    /// `true` for [`MergedFile::Conflicted`].
    #[must_use]
    pub const fn is_conflicted(&self) -> bool {
        matches!(self, Self::Conflicted(_))
    }
}

/// The file-level outcome of reconstructing one combination of revisions.
///
/// Paths deleted on both sides are absent; untouched paths are not listed
/// (they keep their base content by definition).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconstruction {
    /// Path → merged content for every path touched by either side.
    pub files: BTreeMap<String, MergedFile>,
}

impl Reconstruction {
    /// The conflicted subset as a path → marked-text mapping, ready for a
    /// scenario record.
    #[must_use]
    pub fn conflicts(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .filter(|(_, merged)| merged.is_conflicted())
            .map(|(path, merged)| (path.clone(), merged.content().to_owned()))
            .collect()
    }

    /// `true` if any reconstructed file carries conflict markers.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        self.files.values().any(MergedFile::is_conflicted)
    }
}

/// Errors from reconstruction.
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// The combination falls outside the deterministic rule set (binary
    /// content, modify/delete). The candidate is skipped, not fatal.
    #[error("ambiguous reconstruction for '{path}': {reason}")]
    Ambiguous {
        /// The path that could not be deterministically merged.
        path: String,
        /// Why the rule set does not cover it.
        reason: String,
    },

    /// Reading tree content from the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Reconstructor
// ---------------------------------------------------------------------------

/// Recomputes transient merge results from immutable tree content.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reconstructor;

impl Reconstructor {
    /// Create a reconstructor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Three-way merge the trees of `ours` and `theirs` against `base`.
    pub fn merge_revisions(
        &self,
        store: &dyn RevisionStore,
        base: RevisionId,
        ours: RevisionId,
        theirs: RevisionId,
    ) -> Result<Reconstruction, ReconstructError> {
        let our_changes = side_changes(store, base, ours)?;
        let their_changes = side_changes(store, base, theirs)?;

        let mut paths: Vec<&String> = our_changes.keys().chain(their_changes.keys()).collect();
        paths.sort();
        paths.dedup();

        let mut files = BTreeMap::new();
        for path in paths {
            let outcome = match (our_changes.get(path), their_changes.get(path)) {
                // One-sided change: take that side verbatim.
                (Some(one_sided), None) | (None, Some(one_sided)) => match one_sided {
                    Some(blob) => text_blob(store, *blob)?.map(MergedFile::Clean),
                    None => None,
                },
                (Some(our_blob), Some(their_blob)) => {
                    self.merge_path(store, base, path, *our_blob, *their_blob)?
                }
                (None, None) => None,
            };
            if let Some(merged) = outcome {
                files.insert(path.clone(), merged);
            }
        }
        Ok(Reconstruction { files })
    }

    fn merge_path(
        &self,
        store: &dyn RevisionStore,
        base: RevisionId,
        path: &str,
        ours: Option<RevisionId>,
        theirs: Option<RevisionId>,
    ) -> Result<Option<MergedFile>, ReconstructError> {
        match (ours, theirs) {
            // Deleted on both sides: resolved deletion.
            (None, None) => Ok(None),
            // One side rewrote what the other deleted.
            (Some(_), None) | (None, Some(_)) => Err(ReconstructError::Ambiguous {
                path: path.to_owned(),
                reason: "modified on one side, deleted on the other".to_owned(),
            }),
            (Some(our_blob), Some(their_blob)) => {
                // Hash equality short-circuit: both sides agree.
                if our_blob == their_blob {
                    return Ok(text_blob(store, our_blob)?.map(MergedFile::Clean));
                }

                let ours_text =
                    text_blob(store, our_blob)?.ok_or_else(|| binary(path, "ours"))?;
                let theirs_text =
                    text_blob(store, their_blob)?.ok_or_else(|| binary(path, "theirs"))?;
                let base_text = match store.tree_entry(base, path) {
                    Ok(bytes) => as_text(&bytes).ok_or_else(|| binary(path, "base"))?,
                    Err(StoreError::PathNotFound { .. }) => String::new(),
                    Err(e) => return Err(e.into()),
                };

                Ok(Some(self.merge_file(&base_text, &ours_text, &theirs_text)))
            }
        }
    }

    /// Three-way merge of one file's text content.
    ///
    /// Hunks changed identically on both sides auto-resolve, hunks changed on
    /// one side are taken from that side, and divergent overlapping hunks are
    /// emitted as a conflict block in the conventional marker format.
    #[must_use]
    pub fn merge_file(&self, base: &str, ours: &str, theirs: &str) -> MergedFile {
        match diffy::merge(base, ours, theirs) {
            Ok(clean) => MergedFile::Clean(clean),
            Err(conflicted) => MergedFile::Conflicted(conflicted),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// One side's changes relative to the base: path → new blob (`None` =
/// deleted). A rename contributes a deletion at the source path and content
/// at the destination.
fn side_changes(
    store: &dyn RevisionStore,
    base: RevisionId,
    side: RevisionId,
) -> Result<BTreeMap<String, Option<RevisionId>>, StoreError> {
    let mut changes = BTreeMap::new();
    for entry in store.diff(Some(base), side)? {
        match entry.kind {
            ChangeKind::Added | ChangeKind::Modified => {
                changes.insert(entry.path, Some(entry.new_id));
            }
            ChangeKind::Deleted => {
                changes.insert(entry.path, None);
            }
            ChangeKind::Renamed { from } => {
                changes.insert(from, None);
                changes.insert(entry.path, Some(entry.new_id));
            }
        }
    }
    Ok(changes)
}

/// Read a blob as text. `None` means binary (NUL bytes or invalid UTF-8).
fn text_blob(
    store: &dyn RevisionStore,
    id: RevisionId,
) -> Result<Option<String>, StoreError> {
    let bytes = store.blob(id)?;
    Ok(as_text(&bytes))
}

fn as_text(bytes: &[u8]) -> Option<String> {
    if bytes.contains(&0) {
        return None;
    }
    String::from_utf8(bytes.to_vec()).ok()
}

fn binary(path: &str, which: &str) -> ReconstructError {
    ReconstructError::Ambiguous {
        path: path.to_owned(),
        reason: format!("binary content on {which} side"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
