//! gix-backed operation-log (reflog) reads and admin-area state files.

use std::io::ErrorKind;

use crate::error::StoreError;
use crate::gix_store::GixStore;
use crate::refs_impl::from_gix_oid;
use crate::types::*;

pub fn operation_log(
    store: &GixStore,
    name: &RefName,
) -> Result<Vec<OperationLogEntry>, StoreError> {
    let repo = store.local();
    let Some(reference) = repo
        .try_find_reference(name.as_str())
        .map_err(|e| StoreError::backend(e.to_string()))?
    else {
        return Err(StoreError::RevisionNotFound {
            message: format!("ref '{name}' does not exist"),
        });
    };

    let mut platform = reference.log_iter();
    let Some(iter) = platform
        .all()
        .map_err(|e| StoreError::backend(format!("open log for '{name}': {e}")))?
    else {
        // The ref exists but has no log. Treat as an empty history rather
        // than an error; bare mirrors commonly disable reflogs.
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    for line in iter {
        let line = line.map_err(|e| StoreError::backend(format!("decode log line: {e}")))?;
        let time_secs = line.signature.time().map(|t| t.seconds).unwrap_or_default();
        entries.push(OperationLogEntry {
            old_id: from_gix_oid(line.previous_oid().as_ref()),
            new_id: from_gix_oid(line.new_oid().as_ref()),
            time_secs,
            message: line.message.to_string(),
        });
    }
    Ok(entries)
}

pub fn state_file(store: &GixStore, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
    let path = store.local().git_dir().join(name);
    match std::fs::read(&path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io(e)),
    }
}
