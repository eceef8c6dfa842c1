//! Normalized patch identity for duplicate-change detection.
//!
//! Two commits that introduce the same change (a cherry and its pick without
//! the `-x` trailer) have different ids but identical patches once the
//! position-dependent parts are stripped. The patch id hashes only the
//! changed lines of each touched file — no blob ids, no hunk offsets, no
//! context — so a commit replayed at a different position still matches.

use sha2::{Digest, Sha256};

use quarry_git::{RevisionId, RevisionStore, StoreError};

/// A normalized patch digest.
pub type PatchId = [u8; 32];

/// Compute the patch id of a revision against its first parent (or the empty
/// tree for roots).
///
/// Returns `None` when the patch touches binary content — such patches are
/// not comparable line-wise and never match anything.
pub fn patch_id(
    store: &dyn RevisionStore,
    revision: RevisionId,
) -> Result<Option<PatchId>, StoreError> {
    let rev = store.revision(revision)?;
    let parent = rev.parents.first().copied();
    let entries = store.diff(parent, revision)?;

    let mut hasher = Sha256::new();
    for entry in &entries {
        let Some(old_text) = side_text(store, entry.old_id)? else {
            return Ok(None);
        };
        let Some(new_text) = side_text(store, entry.new_id)? else {
            return Ok(None);
        };

        hasher.update(entry.path.as_bytes());
        hasher.update([0]);
        let diff = similar::TextDiff::from_lines(old_text.as_str(), new_text.as_str());
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                similar::ChangeTag::Insert => b'+',
                similar::ChangeTag::Delete => b'-',
                similar::ChangeTag::Equal => continue,
            };
            // Whitespace-only lines are dropped from the identity, mirroring
            // blank-line-insensitive patch comparison.
            if change.value().trim().is_empty() {
                continue;
            }
            hasher.update([sign]);
            hasher.update(change.value().as_bytes());
        }
    }
    Ok(Some(hasher.finalize().into()))
}

fn side_text(store: &dyn RevisionStore, id: RevisionId) -> Result<Option<String>, StoreError> {
    if id.is_zero() {
        return Ok(Some(String::new()));
    }
    let bytes = store.blob(id)?;
    if bytes.contains(&0) {
        return Ok(None);
    }
    Ok(String::from_utf8(bytes).ok())
}
