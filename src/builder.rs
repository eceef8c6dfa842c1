//! Scenario record assembly, deduplication, and invariant validation.
//!
//! The builder is the last gate before emission. It derives the stable
//! scenario identifier, drops duplicates within a scan, and enforces the
//! structural invariants: conflict content where the kind demands it, and a
//! post-state that is a strict graph descendant of the pre-state's mainline
//! for records denoting a resolved operation.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use thiserror::Error;

use quarry_git::{RevisionStore, StoreError};

use crate::model::{ScenarioDraft, ScenarioRecord};

/// A record failed an invariant. Logged and dropped; the scan continues.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The draft violates a structural invariant from the record schema.
    #[error("invalid scenario ({kind}): {reason}")]
    InvalidScenario {
        /// The kind of the rejected draft.
        kind: String,
        /// Which invariant failed.
        reason: String,
    },

    /// The ancestry query needed for validation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds validated [`ScenarioRecord`]s out of extractor drafts.
pub struct RecordBuilder<'a> {
    store: &'a dyn RevisionStore,
    repository: String,
    seen: HashSet<String>,
}

impl<'a> RecordBuilder<'a> {
    /// Create a builder for one repository scan.
    #[must_use]
    pub fn new(store: &'a dyn RevisionStore) -> Self {
        Self {
            repository: store.identity(),
            store,
            seen: HashSet::new(),
        }
    }

    /// Validate a draft and assign its identity.
    ///
    /// Returns `Ok(None)` when the same scenario was already built in this
    /// scan (dedup), `Err(BuildError::InvalidScenario)` when an invariant
    /// fails.
    pub fn build(&mut self, draft: ScenarioDraft) -> Result<Option<ScenarioRecord>, BuildError> {
        self.validate(&draft)?;

        let scenario_id = self.scenario_id(&draft);
        if !self.seen.insert(scenario_id.clone()) {
            tracing::debug!(scenario_id, "duplicate scenario dropped");
            return Ok(None);
        }

        Ok(Some(ScenarioRecord {
            scenario_id,
            repository: self.repository.clone(),
            kind: draft.kind,
            pre_state: draft.pre_state,
            post_state: draft.post_state,
            conflicts: draft.conflicts,
            description: draft.description,
        }))
    }

    fn validate(&self, draft: &ScenarioDraft) -> Result<(), BuildError> {
        if draft.kind.requires_conflicts() && draft.conflicts.is_empty() {
            return Err(invalid(draft, "kind requires conflict content, mapping is empty"));
        }

        let pre = draft.pre_state.mainline.id();
        let post = draft.post_state.mainline.id();
        if draft.kind.denotes_resolved() {
            if pre == post {
                return Err(invalid(draft, "post-state equals the pre-state mainline"));
            }
            if !self.store.is_ancestor(pre, post)? {
                return Err(invalid(
                    draft,
                    "post-state is not a descendant of the pre-state mainline",
                ));
            }
        }
        Ok(())
    }

    /// Derive the stable identifier.
    ///
    /// Hashes the repository identity, the kind, the *sorted set* of
    /// pre-state revision ids, and the post-state mainline. Position names
    /// are deliberately excluded: the same operation surfaced through two
    /// different evidence paths (operation log vs. history walk) must
    /// collapse to one id.
    fn scenario_id(&self, draft: &ScenarioDraft) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.repository.as_bytes());
        hasher.update([0]);
        hasher.update(draft.kind.variant_name().as_bytes());
        hasher.update([0]);

        let mut pre_ids: Vec<String> = draft
            .pre_state
            .refs
            .iter()
            .map(|r| r.id.to_string())
            .collect();
        pre_ids.push(draft.pre_state.mainline.to_string());
        pre_ids.sort();
        pre_ids.dedup();
        for id in &pre_ids {
            hasher.update(id.as_bytes());
            hasher.update([0]);
        }
        hasher.update(draft.post_state.mainline.to_string().as_bytes());

        let digest = hasher.finalize();
        let mut id = String::with_capacity(32);
        for byte in &digest[..16] {
            use std::fmt::Write as _;
            let _ = write!(id, "{byte:02x}");
        }
        id
    }
}

fn invalid(draft: &ScenarioDraft, reason: &str) -> BuildError {
    BuildError::InvalidScenario {
        kind: draft.kind.variant_name().to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{RefPosition, RepoState, ScenarioKind};
    use crate::testutil::MemoryStore;
    use quarry_git::RevisionId;

    struct Fixture {
        store: MemoryStore,
        a: RevisionId,
        b: RevisionId,
        c: RevisionId,
        m: RevisionId,
    }

    fn fixture() -> Fixture {
        let mut store = MemoryStore::new("repo");
        let a = store.commit(&[], "a", &[], &[]);
        let b = store.commit(&[a], "b", &[("b", "b\n")], &[]);
        let c = store.commit(&[a], "c", &[("c", "c\n")], &[]);
        let m = store.commit(&[b, c], "m", &[], &[]);
        Fixture { store, a, b, c, m }
    }

    fn merge_draft(f: &Fixture) -> ScenarioDraft {
        let mut conflicts = BTreeMap::new();
        conflicts.insert("f.txt".to_owned(), "<<<<<<< ours\n>>>>>>> theirs\n".to_owned());
        ScenarioDraft {
            kind: ScenarioKind::Merge,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new("refs/heads/main", f.b),
                    RefPosition::new("MERGE_HEAD", f.c),
                    RefPosition::new("merge-base", f.a),
                ],
                f.b,
            ),
            post_state: RepoState::single("refs/heads/main", f.m),
            conflicts,
            description: "a merge".to_owned(),
        }
    }

    #[test]
    fn valid_draft_becomes_record_with_stable_id() {
        let f = fixture();
        let mut builder = RecordBuilder::new(&f.store);
        let record = builder.build(merge_draft(&f)).unwrap().unwrap();

        assert_eq!(record.repository, "repo");
        assert_eq!(record.scenario_id.len(), 32);
        assert!(record.scenario_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_draft_twice_is_deduplicated() {
        let f = fixture();
        let mut builder = RecordBuilder::new(&f.store);
        assert!(builder.build(merge_draft(&f)).unwrap().is_some());
        assert!(builder.build(merge_draft(&f)).unwrap().is_none());
    }

    #[test]
    fn id_ignores_position_names() {
        let f = fixture();
        let mut builder = RecordBuilder::new(&f.store);
        let first = builder.build(merge_draft(&f)).unwrap().unwrap();

        // Same revisions surfaced with different role names.
        let mut renamed = merge_draft(&f);
        renamed.pre_state.refs[0].name = "parent".to_owned();
        let mut fresh = RecordBuilder::new(&f.store);
        let second = fresh.build(renamed).unwrap().unwrap();
        assert_eq!(first.scenario_id, second.scenario_id);
    }

    #[test]
    fn id_differs_across_kinds() {
        let f = fixture();
        let mut builder = RecordBuilder::new(&f.store);
        let merge = builder.build(merge_draft(&f)).unwrap().unwrap();

        let mut revert = merge_draft(&f);
        revert.kind = ScenarioKind::Revert;
        revert.conflicts.clear();
        let record = builder.build(revert).unwrap().unwrap();
        assert_ne!(merge.scenario_id, record.scenario_id);
    }

    #[test]
    fn merge_without_conflicts_is_invalid() {
        let f = fixture();
        let mut draft = merge_draft(&f);
        draft.conflicts.clear();
        let err = RecordBuilder::new(&f.store).build(draft).unwrap_err();
        assert!(matches!(err, BuildError::InvalidScenario { .. }));
    }

    #[test]
    fn post_state_must_descend_from_pre_mainline() {
        let f = fixture();
        let mut draft = merge_draft(&f);
        // c does not descend from b.
        draft.post_state = RepoState::single("refs/heads/main", f.c);
        let err = RecordBuilder::new(&f.store).build(draft).unwrap_err();
        assert!(matches!(err, BuildError::InvalidScenario { .. }));
    }

    #[test]
    fn post_state_equal_to_pre_mainline_is_invalid_for_resolved_kinds() {
        let f = fixture();
        let mut draft = merge_draft(&f);
        draft.post_state = RepoState::single("refs/heads/main", f.b);
        let err = RecordBuilder::new(&f.store).build(draft).unwrap_err();
        assert!(matches!(err, BuildError::InvalidScenario { .. }));
    }

    #[test]
    fn conflict_kind_is_exempt_from_descendant_check() {
        let f = fixture();
        let mut conflicts = BTreeMap::new();
        conflicts.insert("f.txt".to_owned(), "<<<<<<< ours\n>>>>>>> theirs\n".to_owned());
        let draft = ScenarioDraft {
            kind: ScenarioKind::Conflict,
            pre_state: RepoState::single("HEAD", f.b),
            post_state: RepoState::single("HEAD", f.b),
            conflicts,
            description: "stuck merge".to_owned(),
        };
        assert!(RecordBuilder::new(&f.store).build(draft).unwrap().is_some());
    }
}
