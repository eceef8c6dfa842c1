//! In-memory [`RevisionStore`] test double.
//!
//! Builds small commit graphs without touching disk so detector, extractor,
//! reconstructor, and builder tests stay fast and deterministic. Trees are
//! plain path → bytes maps; blob ids are content-derived so hash-equality
//! short-circuits behave like the real backend.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use sha2::{Digest, Sha256};

use quarry_git::{
    ChangeKind, DiffEntry, OperationLogEntry, RefName, Revision, RevisionId, RevisionStore,
    StoreError,
};

#[derive(Clone, Debug)]
struct MemoryRevision {
    parents: Vec<RevisionId>,
    tree: BTreeMap<String, RevisionId>,
    message: String,
    time: i64,
}

/// An in-memory revision store for tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    identity: String,
    revisions: HashMap<RevisionId, MemoryRevision>,
    blobs: HashMap<RevisionId, Vec<u8>>,
    refs: BTreeMap<String, RevisionId>,
    logs: HashMap<String, Vec<OperationLogEntry>>,
    state_files: HashMap<String, Vec<u8>>,
    clock: i64,
    serial: u64,
}

impl MemoryStore {
    /// Create an empty store with the given repository identity.
    #[must_use]
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_owned(),
            clock: 1_700_000_000,
            ..Self::default()
        }
    }

    /// Add a commit whose tree is parent zero's tree with `files` written
    /// (UTF-8 content) and `removals` deleted. Returns the new revision id.
    pub fn commit(
        &mut self,
        parents: &[RevisionId],
        message: &str,
        files: &[(&str, &str)],
        removals: &[&str],
    ) -> RevisionId {
        let byte_files: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(path, content)| (*path, content.as_bytes()))
            .collect();
        self.commit_bytes(parents, message, &byte_files, removals)
    }

    /// Like [`MemoryStore::commit`] but with raw byte content.
    pub fn commit_bytes(
        &mut self,
        parents: &[RevisionId],
        message: &str,
        files: &[(&str, &[u8])],
        removals: &[&str],
    ) -> RevisionId {
        let mut tree = parents
            .first()
            .and_then(|p| self.revisions.get(p))
            .map(|r| r.tree.clone())
            .unwrap_or_default();
        for (path, content) in files {
            let blob_id = blob_id(content);
            self.blobs.insert(blob_id, content.to_vec());
            tree.insert((*path).to_owned(), blob_id);
        }
        for path in removals {
            tree.remove(*path);
        }

        self.serial += 1;
        self.clock += 60;
        let id = revision_id(self.serial);
        self.revisions.insert(
            id,
            MemoryRevision {
                parents: parents.to_vec(),
                tree,
                message: message.to_owned(),
                time: self.clock,
            },
        );
        id
    }

    /// Point a ref at a revision.
    pub fn set_ref(&mut self, name: &str, id: RevisionId) {
        self.refs.insert(name.to_owned(), id);
    }

    /// Append an operation log entry for a ref.
    pub fn push_log(&mut self, name: &str, entry: OperationLogEntry) {
        self.logs.entry(name.to_owned()).or_default().push(entry);
    }

    /// Place a state/marker file in the admin area.
    pub fn set_state_file(&mut self, name: &str, bytes: &[u8]) {
        self.state_files.insert(name.to_owned(), bytes.to_vec());
    }

    fn get_revision(&self, id: RevisionId) -> Result<&MemoryRevision, StoreError> {
        self.revisions
            .get(&id)
            .ok_or_else(|| StoreError::RevisionNotFound {
                message: format!("revision {id} not in memory store"),
            })
    }
}

/// Deterministic synthetic revision id: serial number in the leading bytes.
fn revision_id(serial: u64) -> RevisionId {
    let mut bytes = [0u8; 20];
    bytes[..8].copy_from_slice(&serial.to_be_bytes());
    bytes[19] = 0xc0;
    RevisionId::from_bytes(bytes)
}

/// Content-derived blob id, like a real content-addressed store.
fn blob_id(content: &[u8]) -> RevisionId {
    let digest = Sha256::digest(content);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    RevisionId::from_bytes(bytes)
}

impl RevisionStore for MemoryStore {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn resolve(&self, name: &RefName) -> Result<RevisionId, StoreError> {
        self.refs
            .get(name.as_str())
            .copied()
            .ok_or_else(|| StoreError::RevisionNotFound {
                message: format!("ref '{name}' not in memory store"),
            })
    }

    fn revision(&self, id: RevisionId) -> Result<Revision, StoreError> {
        let rev = self.get_revision(id)?;
        Ok(Revision {
            id,
            tree_id: id,
            parents: rev.parents.clone(),
            message: rev.message.clone(),
            author: "Test <test@example.com>".to_owned(),
            committer: "Test <test@example.com>".to_owned(),
            author_time: rev.time,
            commit_time: rev.time,
        })
    }

    fn diff(&self, old: Option<RevisionId>, new: RevisionId) -> Result<Vec<DiffEntry>, StoreError> {
        let empty = BTreeMap::new();
        let old_tree = match old {
            Some(id) => &self.get_revision(id)?.tree,
            None => &empty,
        };
        let new_tree = &self.get_revision(new)?.tree;

        let mut entries = Vec::new();
        for (path, new_blob) in new_tree {
            match old_tree.get(path) {
                None => entries.push(DiffEntry {
                    path: path.clone(),
                    kind: ChangeKind::Added,
                    old_id: RevisionId::ZERO,
                    new_id: *new_blob,
                }),
                Some(old_blob) if old_blob != new_blob => entries.push(DiffEntry {
                    path: path.clone(),
                    kind: ChangeKind::Modified,
                    old_id: *old_blob,
                    new_id: *new_blob,
                }),
                Some(_) => {}
            }
        }
        for (path, old_blob) in old_tree {
            if !new_tree.contains_key(path) {
                entries.push(DiffEntry {
                    path: path.clone(),
                    kind: ChangeKind::Deleted,
                    old_id: *old_blob,
                    new_id: RevisionId::ZERO,
                });
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn tree_entry(&self, id: RevisionId, path: &str) -> Result<Vec<u8>, StoreError> {
        let rev = self.get_revision(id)?;
        let blob = rev.tree.get(path).ok_or_else(|| StoreError::PathNotFound {
            revision: id.to_string(),
            path: path.to_owned(),
        })?;
        self.blob(*blob)
    }

    fn blob(&self, id: RevisionId) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::RevisionNotFound {
                message: format!("blob {id} not in memory store"),
            })
    }

    fn operation_log(&self, name: &RefName) -> Result<Vec<OperationLogEntry>, StoreError> {
        Ok(self.logs.get(name.as_str()).cloned().unwrap_or_default())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, RevisionId)>, StoreError> {
        let mut out = Vec::new();
        for (name, id) in &self.refs {
            if name.starts_with(prefix) {
                if let Ok(ref_name) = RefName::new(name) {
                    out.push((ref_name, *id));
                }
            }
        }
        Ok(out)
    }

    fn is_ancestor(
        &self,
        ancestor: RevisionId,
        descendant: RevisionId,
    ) -> Result<bool, StoreError> {
        if ancestor == descendant {
            return Ok(true);
        }
        let mut queue = VecDeque::from([descendant]);
        let mut seen = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let rev = self.get_revision(id)?;
            for parent in &rev.parents {
                if *parent == ancestor {
                    return Ok(true);
                }
                queue.push_back(*parent);
            }
        }
        Ok(false)
    }

    fn merge_base(&self, a: RevisionId, b: RevisionId) -> Result<Option<RevisionId>, StoreError> {
        let mut ancestors_of_a = HashSet::new();
        let mut queue = VecDeque::from([a]);
        while let Some(id) = queue.pop_front() {
            if !ancestors_of_a.insert(id) {
                continue;
            }
            queue.extend(self.get_revision(id)?.parents.iter().copied());
        }

        // First ancestor of `b` (BFS, nearest first) that `a` also reaches.
        let mut queue = VecDeque::from([b]);
        let mut seen = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if ancestors_of_a.contains(&id) {
                return Ok(Some(id));
            }
            queue.extend(self.get_revision(id)?.parents.iter().copied());
        }
        Ok(None)
    }

    fn state_file(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.state_files.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commits_inherit_parent_tree() {
        let mut store = MemoryStore::new("t");
        let a = store.commit(&[], "a", &[("x.txt", "x\n"), ("y.txt", "y\n")], &[]);
        let b = store.commit(&[a], "b", &[("x.txt", "x2\n")], &[]);
        assert_eq!(store.tree_entry(b, "y.txt").unwrap(), b"y\n");
        assert_eq!(store.tree_entry(b, "x.txt").unwrap(), b"x2\n");
    }

    #[test]
    fn diff_reports_all_change_kinds() {
        let mut store = MemoryStore::new("t");
        let a = store.commit(&[], "a", &[("keep", "1\n"), ("gone", "2\n")], &[]);
        let b = store.commit(&[a], "b", &[("keep", "1!\n"), ("new", "3\n")], &["gone"]);
        let entries = store.diff(Some(a), b).unwrap();
        let kinds: Vec<_> = entries.iter().map(|e| (e.path.as_str(), &e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("gone", &ChangeKind::Deleted),
                ("keep", &ChangeKind::Modified),
                ("new", &ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn ancestry_and_merge_base() {
        let mut store = MemoryStore::new("t");
        let a = store.commit(&[], "a", &[], &[]);
        let b = store.commit(&[a], "b", &[], &[]);
        let c = store.commit(&[a], "c", &[], &[]);
        let m = store.commit(&[b, c], "m", &[], &[]);

        assert!(store.is_ancestor(a, m).unwrap());
        assert!(store.is_ancestor(b, m).unwrap());
        assert!(!store.is_ancestor(m, a).unwrap());
        assert_eq!(store.merge_base(b, c).unwrap(), Some(a));
    }
}
