//! The [`RevisionStore`] trait — the single abstraction boundary between the
//! miner and the version-control backend.
//!
//! The mining crate interacts with the commit graph exclusively through this
//! trait. The trait is object-safe so callers can use `&dyn RevisionStore`,
//! and `Send + Sync` so one open store can serve a pool of extraction workers
//! concurrently (multiple readers, no writers).
//!
//! Every method is read-only and side-effect-free on the canonical store: no
//! implementation may write refs, objects, the index, or the working tree.

use crate::error::StoreError;
use crate::types::{DiffEntry, OperationLogEntry, RefName, Revision, RevisionId};

/// Read-only query surface over a repository's commit graph.
///
/// Implementations may be backed by gix (the preferred backend) or a test
/// double. Methods fail with [`StoreError::RevisionNotFound`] or
/// [`StoreError::PathNotFound`] on invalid identifiers; they never silently
/// return partial data.
pub trait RevisionStore: Send + Sync {
    /// A stable identity for the repository (used in scenario ids).
    ///
    /// Deterministic for a given repository so repeated scans of the same
    /// history produce identical scenario identifiers.
    fn identity(&self) -> String;

    /// Resolve a reference to the revision it points at.
    fn resolve(&self, name: &RefName) -> Result<RevisionId, StoreError>;

    /// Read a revision's metadata.
    fn revision(&self, id: RevisionId) -> Result<Revision, StoreError>;

    /// Diff the trees of two revisions, returning path-level changes ordered
    /// by path.
    ///
    /// If `old` is `None`, the diff is against the empty tree (i.e., all
    /// files in `new` appear as additions).
    fn diff(&self, old: Option<RevisionId>, new: RevisionId) -> Result<Vec<DiffEntry>, StoreError>;

    /// Read the content of the blob at `path` inside a revision's tree.
    ///
    /// `path` is slash-separated and relative to the tree root. Fails with
    /// [`StoreError::PathNotFound`] if no blob exists there.
    fn tree_entry(&self, id: RevisionId, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Read the content of a blob by its id (as carried in a
    /// [`DiffEntry`]).
    fn blob(&self, id: RevisionId) -> Result<Vec<u8>, StoreError>;

    /// The ordered history of a reference's pointer moves, oldest first.
    ///
    /// Returns an empty vector when the reference has no recorded log.
    fn operation_log(&self, name: &RefName) -> Result<Vec<OperationLogEntry>, StoreError>;

    /// List refs matching a prefix (e.g., `"refs/heads/"`).
    ///
    /// Returns `(ref_name, revision_id)` pairs sorted by ref name. The
    /// prefix is matched literally.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(RefName, RevisionId)>, StoreError>;

    /// Check if `ancestor` is reachable from `descendant` via parent links.
    ///
    /// Returns `true` when `ancestor == descendant`.
    fn is_ancestor(
        &self,
        ancestor: RevisionId,
        descendant: RevisionId,
    ) -> Result<bool, StoreError>;

    /// Find the best common ancestor (merge base) of two revisions.
    ///
    /// Returns `None` if the revisions share no history.
    fn merge_base(&self, a: RevisionId, b: RevisionId) -> Result<Option<RevisionId>, StoreError>;

    /// Read a transient state or marker file from the repository's admin
    /// area (e.g., `MERGE_HEAD`, `rebase-merge/git-rebase-todo`,
    /// `sequencer/todo`).
    ///
    /// Returns `None` when the file does not exist — the common case for a
    /// repository with no operation in progress.
    fn state_file(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;
}
