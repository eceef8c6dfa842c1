//! Scenario types — kinds, candidates, and the emitted record schema.
//!
//! A [`ScenarioCandidate`] is the transient output of the signal detector: an
//! operation boundary spotted in one reference's operation log, bracketed by
//! the revisions before and after the operation. An extractor consumes the
//! candidate and produces a [`ScenarioDraft`]; the record builder assigns the
//! stable identifier and emits the final [`ScenarioRecord`].
//!
//! # Serialization
//!
//! Records use snake_case JSON with a plain string tag for the kind, one
//! object per output line:
//!
//! ```json
//! {
//!   "scenario_id": "9f1c4b...",
//!   "repository": "acme-api",
//!   "kind": "merge",
//!   "pre_state": { "refs": [{ "name": "refs/heads/main", "id": "..." }], "mainline": "..." },
//!   "post_state": { "refs": [{ "name": "refs/heads/main", "id": "..." }], "mainline": "..." },
//!   "conflicts": { "src/lib.rs": "<<<<<<< ours\n...\n>>>>>>> theirs\n" },
//!   "description": "merge of 'topic' into 'main': 1 conflicted file of 3 changed"
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use quarry_git::{OperationLogEntry, RefName, RevisionId};

// ---------------------------------------------------------------------------
// RevId — serde-able revision identifier
// ---------------------------------------------------------------------------

/// A [`RevisionId`] wrapper that serializes as 40 lowercase hex characters.
///
/// The accessor crate keeps its id type serde-free; records carry this
/// wrapper instead so the output schema stays self-describing JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevId(RevisionId);

impl RevId {
    /// Return the underlying store identifier.
    #[must_use]
    pub const fn id(&self) -> RevisionId {
        self.0
    }
}

impl From<RevisionId> for RevId {
    fn from(id: RevisionId) -> Self {
        Self(id)
    }
}

impl fmt::Display for RevId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for RevId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevId({})", self.0)
    }
}

impl Serialize for RevId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RevId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        RevisionId::from_str(&hex)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ScenarioKind
// ---------------------------------------------------------------------------

/// The category of version-control operation a scenario replays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// A merge of two divergent branches with overlapping edits.
    Merge,
    /// One invocation of a (possibly interactive) rebase, spanning all steps.
    RebaseStep,
    /// One cherry-pick run applying commits from elsewhere in the graph.
    CherryPick,
    /// A revert of an earlier commit.
    Revert,
    /// An operation caught mid-flight with unresolved conflict state.
    Conflict,
    /// A run of consecutive commits all touching the same file.
    FileChain,
}

impl ScenarioKind {
    /// Return the kind name as used in serialized records.
    #[must_use]
    pub const fn variant_name(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::RebaseStep => "rebase_step",
            Self::CherryPick => "cherry_pick",
            Self::Revert => "revert",
            Self::Conflict => "conflict",
            Self::FileChain => "file_chain",
        }
    }

    /// Kinds that are meaningless without conflict content.
    ///
    /// The record builder rejects a record of such a kind whose conflict
    /// mapping is empty.
    #[must_use]
    pub const fn requires_conflicts(self) -> bool {
        matches!(self, Self::Merge | Self::Conflict)
    }

    /// Kinds whose records denote a *resolved* operation.
    ///
    /// For these, the post-state must be a strict graph descendant of the
    /// pre-state's mainline position. [`Self::Conflict`] records capture an
    /// unfinished operation and are exempt.
    #[must_use]
    pub const fn denotes_resolved(self) -> bool {
        !matches!(self, Self::Conflict)
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variant_name())
    }
}

// ---------------------------------------------------------------------------
// Repository state
// ---------------------------------------------------------------------------

/// A named reference position inside a [`RepoState`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefPosition {
    /// Reference name, or a role label (`"MERGE_HEAD"`, `"merge-base"`) when
    /// the position is not an actual ref.
    pub name: String,
    /// The revision the reference points at.
    pub id: RevId,
}

impl RefPosition {
    /// Create a position from a name and a store id.
    #[must_use]
    pub fn new(name: impl Into<String>, id: RevisionId) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A snapshot of the repository positions relevant to a scenario.
///
/// `mainline` is the position the scenario's replay builds on: for a record
/// denoting a resolved operation, the post-state must be a strict descendant
/// of the pre-state's mainline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    /// All named positions that bracket the scenario.
    pub refs: Vec<RefPosition>,
    /// The mainline position (see type docs).
    pub mainline: RevId,
}

impl RepoState {
    /// Construct a state from positions and a mainline id.
    #[must_use]
    pub fn new(refs: Vec<RefPosition>, mainline: RevisionId) -> Self {
        Self {
            refs,
            mainline: mainline.into(),
        }
    }

    /// A state consisting of a single named position, which doubles as the
    /// mainline.
    #[must_use]
    pub fn single(name: impl Into<String>, id: RevisionId) -> Self {
        Self {
            refs: vec![RefPosition::new(name, id)],
            mainline: id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ScenarioCandidate
// ---------------------------------------------------------------------------

/// A detected operation boundary, pending extraction.
///
/// Transient and in-memory only: created by the signal detector, consumed and
/// discarded by an extractor. Candidates reference revisions and log entries
/// by value — the same revision may participate in multiple candidates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioCandidate {
    /// The operation kind the detector classified this boundary as.
    pub kind: ScenarioKind,
    /// The reference whose operation log evidenced the boundary.
    pub ref_name: RefName,
    /// The span of log entries belonging to the operation, oldest first.
    pub entries: Vec<OperationLogEntry>,
    /// The pointer's value before the operation began.
    pub start_id: RevisionId,
    /// The pointer's value after the last entry of the span.
    pub end_id: RevisionId,
    /// `true` when the operation began but never recorded a completion
    /// (aborted, or still unfinished at the end of the log).
    pub incomplete: bool,
}

impl fmt::Display for ScenarioCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} candidate on {} ({} entr{}{})",
            self.kind,
            self.ref_name,
            self.entries.len(),
            if self.entries.len() == 1 { "y" } else { "ies" },
            if self.incomplete { ", incomplete" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// ScenarioDraft and ScenarioRecord
// ---------------------------------------------------------------------------

/// Extractor output: a record minus its identity.
///
/// The builder derives the stable `scenario_id`, attaches the repository
/// identity, validates invariants, and turns the draft into a
/// [`ScenarioRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioDraft {
    /// The scenario kind.
    pub kind: ScenarioKind,
    /// Repository positions before the operation.
    pub pre_state: RepoState,
    /// Expected repository positions after the operation.
    pub post_state: RepoState,
    /// Path → conflicted content with standard three-way markers. Possibly
    /// empty for kinds that allow it.
    pub conflicts: BTreeMap<String, String>,
    /// Natural-language description generated from commit messages and diff
    /// statistics.
    pub description: String,
}

/// The final emitted artifact — one benchmark scenario.
///
/// Immutable once emitted; owned by the output sink. The same scenario mined
/// twice produces an identical `scenario_id` (it is derived from repository
/// identity, kind, and the bracketing revision ids), so re-scans deduplicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Stable, deterministic identifier.
    pub scenario_id: String,
    /// Identity of the repository the scenario was mined from.
    pub repository: String,
    /// The scenario kind.
    pub kind: ScenarioKind,
    /// Repository positions before the operation.
    pub pre_state: RepoState,
    /// Expected repository positions after the operation.
    pub post_state: RepoState,
    /// Path → conflicted content with standard three-way markers.
    pub conflicts: BTreeMap<String, String>,
    /// Natural-language description of the episode.
    pub description: String,
}

impl fmt::Display for ScenarioRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scenario {} in {} ({} conflicted file(s))",
            self.kind,
            self.scenario_id,
            self.repository,
            self.conflicts.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(c: char) -> RevisionId {
        c.to_string().repeat(40).parse().unwrap()
    }

    fn sample_record() -> ScenarioRecord {
        let mut conflicts = BTreeMap::new();
        conflicts.insert(
            "f.txt".to_owned(),
            "<<<<<<< ours\nleft\n=======\nright\n>>>>>>> theirs\n".to_owned(),
        );
        ScenarioRecord {
            scenario_id: "ab".repeat(16),
            repository: "acme-api".to_owned(),
            kind: ScenarioKind::Merge,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new("refs/heads/main", rid('b')),
                    RefPosition::new("MERGE_HEAD", rid('c')),
                    RefPosition::new("merge-base", rid('a')),
                ],
                rid('b'),
            ),
            post_state: RepoState::single("refs/heads/main", rid('d')),
            conflicts,
            description: "merge of 'topic' into 'main'".to_owned(),
        }
    }

    #[test]
    fn kind_variant_names_match_serde_tags() {
        for kind in [
            ScenarioKind::Merge,
            ScenarioKind::RebaseStep,
            ScenarioKind::CherryPick,
            ScenarioKind::Revert,
            ScenarioKind::Conflict,
            ScenarioKind::FileChain,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.variant_name()));
        }
    }

    #[test]
    fn conflict_requirements_per_kind() {
        assert!(ScenarioKind::Merge.requires_conflicts());
        assert!(ScenarioKind::Conflict.requires_conflicts());
        assert!(!ScenarioKind::RebaseStep.requires_conflicts());
        assert!(!ScenarioKind::CherryPick.requires_conflicts());
        assert!(!ScenarioKind::Revert.requires_conflicts());
        assert!(!ScenarioKind::FileChain.requires_conflicts());
    }

    #[test]
    fn only_conflict_kind_is_unresolved() {
        assert!(!ScenarioKind::Conflict.denotes_resolved());
        assert!(ScenarioKind::Merge.denotes_resolved());
        assert!(ScenarioKind::RebaseStep.denotes_resolved());
    }

    #[test]
    fn rev_id_serializes_as_hex_string() {
        let id = RevId::from(rid('a'));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "a".repeat(40)));
        let back: RevId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn rev_id_rejects_bad_hex() {
        assert!(serde_json::from_str::<RevId>("\"nope\"").is_err());
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"merge\""));
        assert!(json.contains("\"scenario_id\""));
        assert!(json.contains("\"pre_state\""));
        let decoded: ScenarioRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn record_json_keys_are_snake_case() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"post_state\""));
        assert!(!json.contains("\"postState\""));
    }

    #[test]
    fn candidate_display_mentions_kind_and_incompleteness() {
        let candidate = ScenarioCandidate {
            kind: ScenarioKind::RebaseStep,
            ref_name: "refs/heads/main".parse().unwrap(),
            entries: vec![],
            start_id: rid('a'),
            end_id: rid('b'),
            incomplete: true,
        };
        let text = candidate.to_string();
        assert!(text.contains("rebase_step"));
        assert!(text.contains("incomplete"));
    }

    #[test]
    fn repo_state_single_sets_mainline() {
        let state = RepoState::single("refs/heads/main", rid('e'));
        assert_eq!(state.refs.len(), 1);
        assert_eq!(state.mainline, RevId::from(rid('e')));
    }
}
