//! gix-backed tree-to-tree diff.

use crate::error::StoreError;
use crate::gix_store::GixStore;
use crate::refs_impl::{from_gix_oid, to_gix_oid};
use crate::types::*;

pub fn diff(
    store: &GixStore,
    old: Option<RevisionId>,
    new: RevisionId,
) -> Result<Vec<DiffEntry>, StoreError> {
    let repo = store.local();

    let old_tree = match old {
        Some(id) => Some(tree_of(&repo, id)?),
        None => None,
    };
    let new_tree = tree_of(&repo, new)?;

    let changes = repo
        .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)
        .map_err(|e| StoreError::backend(format!("diff trees: {e}")))?;

    let mut entries = Vec::with_capacity(changes.len());
    for change in changes {
        use gix::diff::tree_with_rewrites::Change;
        match change {
            Change::Addition {
                location,
                entry_mode,
                id,
                ..
            } => {
                if entry_mode.is_blob_or_symlink() {
                    entries.push(DiffEntry {
                        path: location.to_string(),
                        kind: ChangeKind::Added,
                        old_id: RevisionId::ZERO,
                        new_id: from_gix_oid(id.as_ref()),
                    });
                }
            }
            Change::Deletion {
                location,
                entry_mode,
                id,
                ..
            } => {
                if entry_mode.is_blob_or_symlink() {
                    entries.push(DiffEntry {
                        path: location.to_string(),
                        kind: ChangeKind::Deleted,
                        old_id: from_gix_oid(id.as_ref()),
                        new_id: RevisionId::ZERO,
                    });
                }
            }
            Change::Modification {
                location,
                previous_id,
                id,
                entry_mode,
                ..
            } => {
                if entry_mode.is_blob_or_symlink() {
                    entries.push(DiffEntry {
                        path: location.to_string(),
                        kind: ChangeKind::Modified,
                        old_id: from_gix_oid(previous_id.as_ref()),
                        new_id: from_gix_oid(id.as_ref()),
                    });
                }
            }
            Change::Rewrite {
                source_location,
                source_id,
                location,
                id,
                entry_mode,
                ..
            } => {
                if entry_mode.is_blob_or_symlink() {
                    entries.push(DiffEntry {
                        path: location.to_string(),
                        kind: ChangeKind::Renamed {
                            from: source_location.to_string(),
                        },
                        old_id: from_gix_oid(source_id.as_ref()),
                        new_id: from_gix_oid(id.as_ref()),
                    });
                }
            }
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn tree_of(repo: &gix::Repository, id: RevisionId) -> Result<gix::Tree<'_>, StoreError> {
    let commit = repo
        .find_commit(to_gix_oid(id))
        .map_err(|e| StoreError::RevisionNotFound {
            message: format!("revision {id}: {e}"),
        })?;
    commit
        .tree()
        .map_err(|e| StoreError::backend(format!("tree of revision {id}: {e}")))
}
