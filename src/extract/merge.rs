//! Extraction of merge-with-conflicts scenarios.

use quarry_git::RevisionStore;

use crate::model::{RefPosition, RepoState, ScenarioCandidate, ScenarioDraft, ScenarioKind};
use crate::reconstruct::Reconstructor;

use super::{ExtractError, Extractor, diff_stats, short_id};

/// Extracts merges whose sides made overlapping divergent edits.
///
/// Threshold: at least one file must reconstruct with a conflict block.
/// Fast-forwards, octopus merges, and merges that a naive three-way merge
/// resolves cleanly are all skipped — replaying them requires no decisions,
/// so they make poor benchmark episodes.
pub struct MergeExtractor;

impl Extractor for MergeExtractor {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Merge
    }

    fn extract(
        &self,
        candidate: &ScenarioCandidate,
        store: &dyn RevisionStore,
        reconstructor: &Reconstructor,
    ) -> Result<ScenarioDraft, ExtractError> {
        if candidate.incomplete {
            return Err(ExtractError::skipped("incomplete merge operation"));
        }

        let merge_rev = store.revision(candidate.end_id)?;
        match merge_rev.parents.len() {
            0 | 1 => {
                // A fast-forward moves the pointer without creating a merge
                // revision; the log entry then points at an ordinary commit.
                return Err(ExtractError::skipped(
                    "fast-forward or ordinary commit, nothing to replay",
                ));
            }
            2 => {}
            _ => return Err(ExtractError::skipped("octopus merge not supported")),
        }
        let ours = merge_rev.parents[0];
        let theirs = merge_rev.parents[1];

        let base = store
            .merge_base(ours, theirs)?
            .ok_or_else(|| ExtractError::skipped("merge sides share no history"))?;
        if base == ours || base == theirs {
            return Err(ExtractError::skipped("one side already contains the other"));
        }

        let reconstruction = reconstructor.merge_revisions(store, base, ours, theirs)?;
        let conflicts = reconstruction.conflicts();
        if conflicts.is_empty() {
            return Err(ExtractError::skipped(
                "merge resolves cleanly, no overlapping changes",
            ));
        }

        let theirs_rev = store.revision(theirs)?;
        let stats = diff_stats(store, Some(base), candidate.end_id)?;
        let description = format!(
            "Merge '{}' into '{}' from common ancestor {}: {} of the changed files conflict ({}). \
             Resolve the conflicts and commit the merge.",
            theirs_rev.summary(),
            candidate.ref_name.short(),
            short_id(base),
            conflicts.len(),
            stats,
        );

        Ok(ScenarioDraft {
            kind: ScenarioKind::Merge,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new(candidate.ref_name.as_str(), ours),
                    RefPosition::new("MERGE_HEAD", theirs),
                    RefPosition::new("merge-base", base),
                ],
                ours,
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
    use quarry_git::{OperationLogEntry, RevisionId};

    fn candidate(ref_name: &str, start: RevisionId, end: RevisionId) -> ScenarioCandidate {
        ScenarioCandidate {
            kind: ScenarioKind::Merge,
            ref_name: ref_name.parse().unwrap(),
            entries: vec![OperationLogEntry {
                old_id: start,
                new_id: end,
                time_secs: 1_700_000_000,
                message: "merge topic: Merge made by the 'ort' strategy.".to_owned(),
            }],
            start_id: start,
            end_id: end,
            incomplete: false,
        }
    }

    /// Commits A; B and C diverge from A editing the same line; M merges.
    fn conflicting_merge() -> (MemoryStore, RevisionId, RevisionId) {
        let mut store = MemoryStore::new("repo");
        let a = store.commit(&[], "root", &[("f.txt", "1\n2\n3\n4\n5\n")], &[]);
        let b = store.commit(&[a], "ours edit", &[("f.txt", "1\n2\n3\n4\nfive-b\n")], &[]);
        let c = store.commit(&[a], "theirs edit", &[("f.txt", "1\n2\n3\n4\nfive-c\n")], &[]);
        let m = store.commit(&[b, c], "merge", &[("f.txt", "1\n2\n3\n4\nfive\n")], &[]);
        (store, b, m)
    }

    #[test]
    fn conflicting_merge_yields_draft() {
        let (store, b, m) = conflicting_merge();
        let draft = MergeExtractor
            .extract(
                &candidate("refs/heads/main", b, m),
                &store,
                &Reconstructor::new(),
            )
            .unwrap();

        assert_eq!(draft.kind, ScenarioKind::Merge);
        assert_eq!(draft.conflicts.len(), 1);
        let text = draft.conflicts.get("f.txt").unwrap();
        assert!(text.contains("five-b"));
        assert!(text.contains("five-c"));
        assert_eq!(draft.pre_state.refs.len(), 3);
        assert_eq!(draft.post_state.mainline.id(), m);
    }

    #[test]
    fn ordinary_commit_is_skipped_as_fast_forward() {
        let mut store = MemoryStore::new("repo");
        let a = store.commit(&[], "root", &[("f.txt", "x\n")], &[]);
        let b = store.commit(&[a], "next", &[("f.txt", "y\n")], &[]);
        let err = MergeExtractor
            .extract(
                &candidate("refs/heads/main", a, b),
                &store,
                &Reconstructor::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::Skipped { .. }));
    }

    #[test]
    fn clean_merge_is_skipped() {
        let mut store = MemoryStore::new("repo");
        let a = store.commit(&[], "root", &[("f.txt", "x\n"), ("g.txt", "y\n")], &[]);
        let b = store.commit(&[a], "edit f", &[("f.txt", "x2\n")], &[]);
        let c = store.commit(&[a], "edit g", &[("g.txt", "y2\n")], &[]);
        let m = store.commit(&[b, c], "merge", &[("f.txt", "x2\n"), ("g.txt", "y2\n")], &[]);

        let err = MergeExtractor
            .extract(
                &candidate("refs/heads/main", b, m),
                &store,
                &Reconstructor::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::Skipped { .. }));
    }

    #[test]
    fn octopus_merge_is_skipped() {
        let mut store = MemoryStore::new("repo");
        let a = store.commit(&[], "root", &[], &[]);
        let b = store.commit(&[a], "b", &[("b", "b\n")], &[]);
        let c = store.commit(&[a], "c", &[("c", "c\n")], &[]);
        let d = store.commit(&[a], "d", &[("d", "d\n")], &[]);
        let m = store.commit(&[b, c, d], "octopus", &[], &[]);

        let err = MergeExtractor
            .extract(
                &candidate("refs/heads/main", b, m),
                &store,
                &Reconstructor::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::Skipped { .. }));
    }

    #[test]
    fn description_names_the_branch_and_conflict_count() {
        let (store, b, m) = conflicting_merge();
        let draft = MergeExtractor
            .extract(
                &candidate("refs/heads/main", b, m),
                &store,
                &Reconstructor::new(),
            )
            .unwrap();
        assert!(draft.description.contains("main"));
        assert!(draft.description.contains("1 of the changed files conflict"));
    }
}
