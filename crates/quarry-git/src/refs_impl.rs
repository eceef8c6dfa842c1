//! gix-backed ref resolution, ref listing, and ancestry queries.

use crate::error::StoreError;
use crate::gix_store::GixStore;
use crate::types::*;

/// Convert a `RevisionId` to a `gix::ObjectId`.
pub(crate) fn to_gix_oid(id: RevisionId) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(id.as_bytes())
}

/// Convert a `gix::ObjectId` (or `&gix::oid`) to a `RevisionId`.
pub(crate) fn from_gix_oid(oid: &gix::oid) -> RevisionId {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(oid.as_bytes());
    RevisionId::from_bytes(bytes)
}

pub fn resolve(store: &GixStore, name: &RefName) -> Result<RevisionId, StoreError> {
    let repo = store.local();
    match repo.try_find_reference(name.as_str()) {
        Ok(Some(mut r)) => {
            let id = r
                .peel_to_id_in_place()
                .map_err(|e| StoreError::backend(e.to_string()))?;
            Ok(from_gix_oid(id.as_ref()))
        }
        Ok(None) => Err(StoreError::RevisionNotFound {
            message: format!("ref '{name}' does not exist"),
        }),
        Err(e) => Err(StoreError::backend(e.to_string())),
    }
}

pub fn list_refs(store: &GixStore, prefix: &str) -> Result<Vec<(RefName, RevisionId)>, StoreError> {
    let repo = store.local();
    let platform = repo
        .references()
        .map_err(|e| StoreError::backend(e.to_string()))?;
    let refs_iter = platform
        .prefixed(prefix)
        .map_err(|e| StoreError::backend(e.to_string()))?;

    let mut result = Vec::new();
    for r in refs_iter {
        let mut r = r.map_err(|e| StoreError::backend(e.to_string()))?;
        let name_str = r.name().as_bstr().to_string();
        let id = r
            .peel_to_id_in_place()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let id = from_gix_oid(id.as_ref());
        if let Ok(ref_name) = RefName::new(&name_str) {
            result.push((ref_name, id));
        }
    }
    result.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    Ok(result)
}

pub fn is_ancestor(
    store: &GixStore,
    ancestor: RevisionId,
    descendant: RevisionId,
) -> Result<bool, StoreError> {
    if ancestor == descendant {
        return Ok(true);
    }

    let repo = store.local();
    let ancestor_gix = to_gix_oid(ancestor);
    let descendant_gix = to_gix_oid(descendant);

    // Walk from descendant back through history, looking for ancestor
    let walk = repo
        .rev_walk([descendant_gix])
        .all()
        .map_err(|e| StoreError::backend(e.to_string()))?;

    for info in walk {
        let info = info.map_err(|e| StoreError::backend(e.to_string()))?;
        if info.id == ancestor_gix {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn merge_base(
    store: &GixStore,
    a: RevisionId,
    b: RevisionId,
) -> Result<Option<RevisionId>, StoreError> {
    let repo = store.local();
    let a_gix = to_gix_oid(a);
    let b_gix = to_gix_oid(b);

    match repo.merge_base(a_gix, b_gix) {
        Ok(id) => Ok(Some(from_gix_oid(id.as_ref()))),
        Err(gix::repository::merge_base::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(StoreError::backend(e.to_string())),
    }
}
