//! Core types for the quarry revision store abstraction.
//!
//! These types form the vocabulary shared between the [`RevisionStore`](crate::RevisionStore)
//! trait and the mining crate. They intentionally contain no gix (or libgit2,
//! or CLI) types — the backend is an implementation detail.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// RevisionId
// ---------------------------------------------------------------------------

/// A content-addressed revision identifier (SHA-1, 20 bytes).
///
/// Stored as raw bytes for efficient comparison, hashing, and Copy semantics.
/// Displays as 40 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionId([u8; 20]);

impl RevisionId {
    /// The zero id (`0000...0000`), used by operation logs as the sentinel
    /// for "pointer did not exist before this move."
    pub const ZERO: Self = Self([0; 20]);

    /// Create a `RevisionId` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Return `true` if this is the zero id.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({self})")
    }
}

impl FromStr for RevisionId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 {
            return Err(IdParseError {
                value: s.to_owned(),
                reason: format!("expected 40 hex characters, got {}", s.len()),
            });
        }
        let mut bytes = [0u8; 20];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = hex_digit(chunk[0]).ok_or_else(|| IdParseError {
                value: s.to_owned(),
                reason: format!("invalid hex digit '{}'", chunk[0] as char),
            })?;
            let lo = hex_digit(chunk[1]).ok_or_else(|| IdParseError {
                value: s.to_owned(),
                reason: format!("invalid hex digit '{}'", chunk[1] as char),
            })?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

/// Error from parsing a hex string into a [`RevisionId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdParseError {
    /// The raw value that failed.
    pub value: String,
    /// Why it failed.
    pub reason: String,
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid revision id {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for IdParseError {}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        // Accept uppercase for leniency during parsing
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// RefName
// ---------------------------------------------------------------------------

/// A validated reference name.
///
/// Must start with `refs/` or be one of the well-known bare names (`HEAD`,
/// `MERGE_HEAD`, etc.). Operation-in-progress markers are included because
/// the miner reads them to detect unfinished operations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefName(String);

/// Well-known bare ref names that don't start with `refs/`.
const BARE_REFS: &[&str] = &[
    "HEAD",
    "ORIG_HEAD",
    "FETCH_HEAD",
    "MERGE_HEAD",
    "CHERRY_PICK_HEAD",
    "REVERT_HEAD",
    "REBASE_HEAD",
];

impl RefName {
    /// Create a new `RefName`, validating that it looks like a git ref.
    ///
    /// # Errors
    /// Returns an error if the name is empty, doesn't start with `refs/`,
    /// and isn't a well-known bare ref.
    pub fn new(name: &str) -> Result<Self, RefNameError> {
        Self::validate(name)?;
        Ok(Self(name.to_owned()))
    }

    /// Return the ref name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The short branch name, with any `refs/heads/` prefix removed.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.strip_prefix("refs/heads/").unwrap_or(&self.0)
    }

    fn validate(name: &str) -> Result<(), RefNameError> {
        if name.is_empty() {
            return Err(RefNameError {
                value: name.to_owned(),
                reason: "ref name must not be empty".to_owned(),
            });
        }
        if name.starts_with("refs/") || BARE_REFS.contains(&name) {
            Ok(())
        } else {
            Err(RefNameError {
                value: name.to_owned(),
                reason: "ref name must start with 'refs/' or be a well-known ref (HEAD, etc.)"
                    .to_owned(),
            })
        }
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RefName {
    type Err = RefNameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Error from validating a [`RefName`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefNameError {
    /// The invalid value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl fmt::Display for RefNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ref name {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for RefNameError {}

// ---------------------------------------------------------------------------
// Revision metadata
// ---------------------------------------------------------------------------

/// Metadata for a single revision (commit) in the store.
///
/// Returned by [`RevisionStore::revision`](crate::RevisionStore::revision).
/// Immutable once created; the store owns the underlying object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision {
    /// The revision's own identifier.
    pub id: RevisionId,
    /// Identifier of the tree this revision snapshots.
    pub tree_id: RevisionId,
    /// Parent revision ids (empty = root, one = ordinary, two+ = merge).
    pub parents: Vec<RevisionId>,
    /// The commit message.
    pub message: String,
    /// Author identity string (e.g., `"Alice <alice@example.com>"`).
    pub author: String,
    /// Committer identity string.
    pub committer: String,
    /// Author timestamp, seconds since the unix epoch.
    pub author_time: i64,
    /// Committer timestamp, seconds since the unix epoch.
    pub commit_time: i64,
}

impl Revision {
    /// Return `true` if this revision has two or more parents.
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// The first line of the commit message, trimmed.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}

// ---------------------------------------------------------------------------
// Diff types
// ---------------------------------------------------------------------------

/// The kind of change detected between two trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// File was added.
    Added,
    /// File content or mode was modified.
    Modified,
    /// File was deleted.
    Deleted,
    /// File was renamed (may also be modified).
    Renamed {
        /// The original path before the rename.
        from: String,
    },
}

/// A single file-level change between two trees.
///
/// Produced by [`RevisionStore::diff`](crate::RevisionStore::diff). Line-level
/// hunks are computed downstream from the blob contents; the accessor only
/// reports which paths changed and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffEntry {
    /// Path of the file (in the new tree, or the old tree for deletions).
    pub path: String,
    /// What kind of change occurred.
    pub kind: ChangeKind,
    /// Id of the old blob (zero id for additions).
    pub old_id: RevisionId,
    /// Id of the new blob (zero id for deletions).
    pub new_id: RevisionId,
}

// ---------------------------------------------------------------------------
// Operation log
// ---------------------------------------------------------------------------

/// One recorded move of a reference's pointer.
///
/// Produced externally by the version-control tool (git's reflog); the miner
/// only reads these. Entries are returned oldest first by
/// [`RevisionStore::operation_log`](crate::RevisionStore::operation_log).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationLogEntry {
    /// The pointer's value before the move (zero id if it did not exist).
    pub old_id: RevisionId,
    /// The pointer's value after the move.
    pub new_id: RevisionId,
    /// When the move happened, seconds since the unix epoch.
    pub time_secs: i64,
    /// Free-text cause description (e.g., `"merge topic: Merge made by ..."`).
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
