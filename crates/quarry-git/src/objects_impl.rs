//! gix-backed revision metadata and tree content reads.

use crate::error::StoreError;
use crate::gix_store::GixStore;
use crate::refs_impl::{from_gix_oid, to_gix_oid};
use crate::types::*;

pub fn revision(store: &GixStore, id: RevisionId) -> Result<Revision, StoreError> {
    let repo = store.local();
    let gix_oid = to_gix_oid(id);
    let commit = repo
        .find_commit(gix_oid)
        .map_err(|e| StoreError::RevisionNotFound {
            message: format!("revision {id}: {e}"),
        })?;

    let decoded = commit
        .decode()
        .map_err(|e| StoreError::backend(format!("failed to decode revision {id}: {e}")))?;

    let tree_id = from_gix_oid(decoded.tree().as_ref());
    let parents = decoded.parents().map(|p| from_gix_oid(p.as_ref())).collect();
    let message = decoded.message.to_string();

    let author_sig = decoded.author();
    let committer_sig = decoded.committer();

    let author = format!("{} <{}>", author_sig.name, author_sig.email);
    let committer = format!("{} <{}>", committer_sig.name, committer_sig.email);
    let author_time = author_sig.time().map(|t| t.seconds).unwrap_or_default();
    let commit_time = committer_sig.time().map(|t| t.seconds).unwrap_or_default();

    Ok(Revision {
        id,
        tree_id,
        parents,
        message,
        author,
        committer,
        author_time,
        commit_time,
    })
}

pub fn tree_entry(store: &GixStore, id: RevisionId, path: &str) -> Result<Vec<u8>, StoreError> {
    let repo = store.local();
    let gix_oid = to_gix_oid(id);
    let commit = repo
        .find_commit(gix_oid)
        .map_err(|e| StoreError::RevisionNotFound {
            message: format!("revision {id}: {e}"),
        })?;
    let tree = commit
        .tree()
        .map_err(|e| StoreError::backend(format!("tree of revision {id}: {e}")))?;

    let entry = tree
        .lookup_entry_by_path(path)
        .map_err(|e| StoreError::backend(format!("lookup '{path}' in {id}: {e}")))?
        .ok_or_else(|| StoreError::PathNotFound {
            revision: id.to_string(),
            path: path.to_owned(),
        })?;

    if entry.mode().is_tree() {
        return Err(StoreError::PathNotFound {
            revision: id.to_string(),
            path: format!("{path} (is a directory)"),
        });
    }

    let mut blob = repo
        .find_blob(entry.object_id())
        .map_err(|e| StoreError::backend(format!("blob at '{path}' in {id}: {e}")))?;
    Ok(blob.take_data())
}

/// Read blob content by id. Used by the diff path to hand callers both sides
/// of a change without a second tree walk.
pub fn blob(store: &GixStore, id: RevisionId) -> Result<Vec<u8>, StoreError> {
    let repo = store.local();
    let mut blob = repo
        .find_blob(to_gix_oid(id))
        .map_err(|e| StoreError::RevisionNotFound {
            message: format!("blob {id}: {e}"),
        })?;
    Ok(blob.take_data())
}
