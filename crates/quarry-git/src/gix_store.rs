//! The gix-backed implementation of [`RevisionStore`].

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::store::RevisionStore;
use crate::types::*;

/// A [`RevisionStore`] implementation backed by
/// [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixStore::open`] or [`GixStore::open_at`]. The store is
/// opened for reading only; no method writes to the repository.
///
/// `gix::Repository` is not `Sync`, so the store holds a
/// [`gix::ThreadSafeRepository`] and materializes a thread-local repository
/// per call. Object caches stay per-thread, which is exactly what a pool of
/// stateless extraction workers wants.
pub struct GixStore {
    pub(crate) repo: gix::ThreadSafeRepository,
    pub(crate) workdir: Option<PathBuf>,
}

impl GixStore {
    /// Open the repository at or above `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let repo = gix::ThreadSafeRepository::open(path)
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let workdir = repo.to_thread_local().workdir().map(Path::to_path_buf);
        tracing::debug!(path = %path.display(), "opened revision store read-only");
        Ok(Self { repo, workdir })
    }

    /// Open a repository at exactly `path` (no parent discovery).
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let repo = gix::ThreadSafeRepository::open_opts(path, gix::open::Options::isolated())
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let workdir = repo.to_thread_local().workdir().map(Path::to_path_buf);
        Ok(Self { repo, workdir })
    }

    pub(crate) fn local(&self) -> gix::Repository {
        self.repo.to_thread_local()
    }
}

impl RevisionStore for GixStore {
    fn identity(&self) -> String {
        let dir = self
            .workdir
            .clone()
            .unwrap_or_else(|| self.local().git_dir().to_path_buf());
        dir.file_name()
            .map_or_else(|| "repository".to_owned(), |n| n.to_string_lossy().into_owned())
    }

    fn resolve(&self, name: &RefName) -> Result<RevisionId, StoreError> {
        crate::refs_impl::resolve(self, name)
    }

    fn revision(&self, id: RevisionId) -> Result<Revision, StoreError> {
        crate::objects_impl::revision(self, id)
    }

    fn diff(&self, old: Option<RevisionId>, new: RevisionId) -> Result<Vec<DiffEntry>, StoreError> {
        crate::diff_impl::diff(self, old, new)
    }

    fn tree_entry(&self, id: RevisionId, path: &str) -> Result<Vec<u8>, StoreError> {
        crate::objects_impl::tree_entry(self, id, path)
    }

    fn blob(&self, id: RevisionId) -> Result<Vec<u8>, StoreError> {
        crate::objects_impl::blob(self, id)
    }

    fn operation_log(&self, name: &RefName) -> Result<Vec<OperationLogEntry>, StoreError> {
        crate::log_impl::operation_log(self, name)
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, RevisionId)>, StoreError> {
        crate::refs_impl::list_refs(self, prefix)
    }

    fn is_ancestor(
        &self,
        ancestor: RevisionId,
        descendant: RevisionId,
    ) -> Result<bool, StoreError> {
        crate::refs_impl::is_ancestor(self, ancestor, descendant)
    }

    fn merge_base(&self, a: RevisionId, b: RevisionId) -> Result<Option<RevisionId>, StoreError> {
        crate::refs_impl::merge_base(self, a, b)
    }

    fn state_file(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        crate::log_impl::state_file(self, name)
    }
}
