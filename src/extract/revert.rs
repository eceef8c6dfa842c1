//! Extraction of revert scenarios.

use std::str::FromStr;

use quarry_git::{RevisionId, RevisionStore, StoreError};

use crate::model::{RefPosition, RepoState, ScenarioCandidate, ScenarioDraft, ScenarioKind};
use crate::reconstruct::Reconstructor;

use super::{ExtractError, Extractor, short_id};

/// The line `git revert` writes into the new commit's message body.
const REVERTED_MARKER: &str = "This reverts commit ";

/// Find the reverted revision recorded in a revert commit's message.
#[must_use]
pub fn reverted_from_message(message: &str) -> Option<RevisionId> {
    let start = message.find(REVERTED_MARKER)? + REVERTED_MARKER.len();
    let hex = message.get(start..start + 40)?;
    RevisionId::from_str(hex).ok()
}

/// Extracts a revert of an earlier commit.
///
/// Requires the standard "This reverts commit ..." message line to identify
/// the reverted revision, and requires the revert to actually change files.
/// Conflict content is reconstructed for applying the reverse patch onto the
/// pre-revert head; a clean revert still qualifies.
pub struct RevertExtractor;

impl Extractor for RevertExtractor {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Revert
    }

    fn extract(
        &self,
        candidate: &ScenarioCandidate,
        store: &dyn RevisionStore,
        reconstructor: &Reconstructor,
    ) -> Result<ScenarioDraft, ExtractError> {
        if candidate.incomplete {
            return Err(ExtractError::skipped("incomplete revert operation"));
        }

        let revert_rev = store.revision(candidate.end_id)?;
        let reverted = reverted_from_message(&revert_rev.message)
            .ok_or_else(|| ExtractError::skipped("no reverted-commit line in message"))?;
        let reverted_rev = match store.revision(reverted) {
            Ok(rev) => rev,
            Err(StoreError::RevisionNotFound { .. }) => {
                return Err(ExtractError::skipped(
                    "reverted revision not present in this store",
                ));
            }
            Err(e) => return Err(e.into()),
        };
        let Some(&reverted_parent) = reverted_rev.parents.first() else {
            return Err(ExtractError::skipped("cannot revert a root revision"));
        };

        if store.diff(Some(candidate.start_id), candidate.end_id)?.is_empty() {
            return Err(ExtractError::skipped("revert changed nothing"));
        }

        let head_before = candidate.start_id;
        // Applying the reverse patch of `reverted` is a three-way merge that
        // treats the reverted revision as the ancestor and its parent as the
        // side to move toward.
        let reconstruction =
            reconstructor.merge_revisions(store, reverted, head_before, reverted_parent)?;
        let conflicts = reconstruction.conflicts();

        let description = format!(
            "Revert '{}' ({}) on '{}'; {} file(s) conflict while backing the change out.",
            reverted_rev.summary(),
            short_id(reverted),
            candidate.ref_name.short(),
            conflicts.len(),
        );

        Ok(ScenarioDraft {
            kind: ScenarioKind::Revert,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new(candidate.ref_name.as_str(), head_before),
                    RefPosition::new("reverted", reverted),
                ],
                head_before,
            ),
            post_state: RepoState::single(candidate.ref_name.as_str(), candidate.end_id),
            conflicts,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryStore;
    use quarry_git::OperationLogEntry;

    #[test]
    fn reverted_marker_parses() {
        let sha = "b".repeat(40);
        let message = format!("Revert \"fix\"\n\nThis reverts commit {sha}.\n");
        assert_eq!(reverted_from_message(&message).unwrap().to_string(), sha);
        assert_eq!(reverted_from_message("plain message"), None);
    }

    struct Fixture {
        store: MemoryStore,
        head: RevisionId,
        reverted: RevisionId,
        revert: RevisionId,
    }

    fn fixture(diverged: bool) -> Fixture {
        let mut store = MemoryStore::new("repo");
        let root = store.commit(&[], "root", &[("f.txt", "original\n")], &[]);
        let reverted = store.commit(&[root], "bad change", &[("f.txt", "broken\n")], &[]);
        let head = if diverged {
            // Someone edited the same content after the bad change, so the
            // reverse patch no longer applies cleanly.
            store.commit(&[reverted], "later edit", &[("f.txt", "broken but tweaked\n")], &[])
        } else {
            store.commit(&[reverted], "later edit", &[("g.txt", "g\n")], &[])
        };
        let message = format!("Revert \"bad change\"\n\nThis reverts commit {reverted}.");
        let revert = store.commit(&[head], &message, &[("f.txt", "original\n")], &[]);
        Fixture {
            store,
            head,
            reverted,
            revert,
        }
    }

    fn candidate(f: &Fixture) -> ScenarioCandidate {
        ScenarioCandidate {
            kind: ScenarioKind::Revert,
            ref_name: "refs/heads/main".parse().unwrap(),
            entries: vec![OperationLogEntry {
                old_id: f.head,
                new_id: f.revert,
                time_secs: 1_700_000_000,
                message: "revert: Revert \"bad change\"".to_owned(),
            }],
            start_id: f.head,
            end_id: f.revert,
            incomplete: false,
        }
    }

    #[test]
    fn clean_revert_yields_draft() {
        let f = fixture(false);
        let draft = RevertExtractor
            .extract(&candidate(&f), &f.store, &Reconstructor::new())
            .unwrap();
        assert_eq!(draft.kind, ScenarioKind::Revert);
        assert!(draft.conflicts.is_empty());
        assert_eq!(draft.post_state.mainline.id(), f.revert);
        assert!(
            draft
                .pre_state
                .refs
                .iter()
                .any(|r| r.name == "reverted" && r.id.id() == f.reverted)
        );
    }

    #[test]
    fn diverged_revert_reconstructs_conflicts() {
        let f = fixture(true);
        let draft = RevertExtractor
            .extract(&candidate(&f), &f.store, &Reconstructor::new())
            .unwrap();
        assert_eq!(draft.conflicts.len(), 1);
        assert!(draft.conflicts.get("f.txt").unwrap().contains("<<<<<<<"));
    }

    #[test]
    fn revert_without_marker_is_skipped() {
        let mut store = MemoryStore::new("repo");
        let root = store.commit(&[], "root", &[("f.txt", "x\n")], &[]);
        let head = store.commit(&[root], "work", &[("f.txt", "y\n")], &[]);
        let revert = store.commit(&[head], "undo things", &[("f.txt", "x\n")], &[]);

        let candidate = ScenarioCandidate {
            kind: ScenarioKind::Revert,
            ref_name: "refs/heads/main".parse().unwrap(),
            entries: vec![OperationLogEntry {
                old_id: head,
                new_id: revert,
                time_secs: 1_700_000_000,
                message: "revert: undo things".to_owned(),
            }],
            start_id: head,
            end_id: revert,
            incomplete: false,
        };
        let err = RevertExtractor
            .extract(&candidate, &store, &Reconstructor::new())
            .unwrap_err();
        assert!(matches!(err, ExtractError::Skipped { .. }));
    }
}
