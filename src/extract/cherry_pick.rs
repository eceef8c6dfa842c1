//! Extraction of cherry-pick scenarios.

use std::str::FromStr;

use quarry_git::{RevisionId, RevisionStore, StoreError};

use crate::model::{RefPosition, RepoState, ScenarioCandidate, ScenarioDraft, ScenarioKind};
use crate::reconstruct::Reconstructor;

use super::{ExtractError, Extractor, short_id};

/// The string `git cherry-pick -x` appends to the picked commit's message.
const SOURCE_TRAILER: &str = "cherry picked from commit ";

/// Find the cherry source recorded in a picked commit's message.
#[must_use]
pub fn source_from_message(message: &str) -> Option<RevisionId> {
    let start = message.find(SOURCE_TRAILER)? + SOURCE_TRAILER.len();
    let hex = message.get(start..start + 40)?;
    RevisionId::from_str(hex).ok()
}

/// Extracts one cherry-pick run (one or more picks in a single invocation).
///
/// Requires the first picked commit to carry the `-x` source trailer — the
/// only way to tie the pick back to its cherry from the log alone. Picks of
/// commits missing from the store (picked across repositories) are skipped.
/// Conflict content is reconstructed for applying the cherry onto the
/// pre-pick head; a clean pick still stands as a scenario.
pub struct CherryPickExtractor;

impl Extractor for CherryPickExtractor {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::CherryPick
    }

    fn extract(
        &self,
        candidate: &ScenarioCandidate,
        store: &dyn RevisionStore,
        reconstructor: &Reconstructor,
    ) -> Result<ScenarioDraft, ExtractError> {
        if candidate.incomplete {
            return Err(ExtractError::skipped("incomplete cherry-pick operation"));
        }
        let Some(first_pick) = candidate.entries.first() else {
            return Err(ExtractError::skipped("empty cherry-pick span"));
        };

        let pick_rev = store.revision(first_pick.new_id)?;
        let source = source_from_message(&pick_rev.message)
            .ok_or_else(|| ExtractError::skipped("no source trailer in picked commit"))?;
        let source_rev = match store.revision(source) {
            Ok(rev) => rev,
            Err(StoreError::RevisionNotFound { .. }) => {
                return Err(ExtractError::skipped(
                    "cherry source not present in this store",
                ));
            }
            Err(e) => return Err(e.into()),
        };
        let Some(&source_parent) = source_rev.parents.first() else {
            return Err(ExtractError::skipped("cherry source is a root revision"));
        };

        let head_before = candidate.start_id;
        let reconstruction =
            reconstructor.merge_revisions(store, source_parent, head_before, source)?;
        let conflicts = reconstruction.conflicts();

        let description = format!(
            "Cherry-pick '{}' ({}) onto '{}' at {}; {} pick(s) in the invocation, {} file(s) \
             conflict on apply.",
            source_rev.summary(),
            short_id(source),
            candidate.ref_name.short(),
            short_id(head_before),
            candidate.entries.len(),
            conflicts.len(),
        );

        Ok(ScenarioDraft {
            kind: ScenarioKind::CherryPick,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new(candidate.ref_name.as_str(), head_before),
                    RefPosition::new("cherry", source),
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
    fn source_trailer_parses() {
        let sha = "a".repeat(40);
        let message = format!("fix crash\n\n(cherry picked from commit {sha})\n");
        assert_eq!(source_from_message(&message).unwrap().to_string(), sha);
    }

    #[test]
    fn source_trailer_absent_or_mangled() {
        assert_eq!(source_from_message("fix crash"), None);
        assert_eq!(
            source_from_message("(cherry picked from commit tooshort)"),
            None
        );
    }

    struct Fixture {
        store: MemoryStore,
        head: RevisionId,
        source: RevisionId,
        pick: RevisionId,
    }

    /// A cherry on a topic branch picked onto main with `-x`.
    fn fixture() -> Fixture {
        let mut store = MemoryStore::new("repo");
        let root = store.commit(&[], "root", &[("f.txt", "base\n"), ("g.txt", "g\n")], &[]);
        let source = store.commit(&[root], "fix crash", &[("f.txt", "fixed\n")], &[]);
        let head = store.commit(&[root], "main work", &[("g.txt", "g2\n")], &[]);
        let message = format!("fix crash\n\n(cherry picked from commit {source})");
        let pick = store.commit(&[head], &message, &[("f.txt", "fixed\n")], &[]);
        Fixture {
            store,
            head,
            source,
            pick,
        }
    }

    fn candidate(f: &Fixture) -> ScenarioCandidate {
        ScenarioCandidate {
            kind: ScenarioKind::CherryPick,
            ref_name: "refs/heads/main".parse().unwrap(),
            entries: vec![OperationLogEntry {
                old_id: f.head,
                new_id: f.pick,
                time_secs: 1_700_000_000,
                message: "cherry-pick: fix crash".to_owned(),
            }],
            start_id: f.head,
            end_id: f.pick,
            incomplete: false,
        }
    }

    #[test]
    fn pick_with_trailer_yields_draft() {
        let f = fixture();
        let draft = CherryPickExtractor
            .extract(&candidate(&f), &f.store, &Reconstructor::new())
            .unwrap();

        assert_eq!(draft.kind, ScenarioKind::CherryPick);
        assert!(draft.conflicts.is_empty());
        assert_eq!(draft.pre_state.mainline.id(), f.head);
        assert_eq!(draft.post_state.mainline.id(), f.pick);
        assert!(
            draft
                .pre_state
                .refs
                .iter()
                .any(|r| r.name == "cherry" && r.id.id() == f.source)
        );
    }

    #[test]
    fn pick_without_trailer_is_skipped() {
        let mut store = MemoryStore::new("repo");
        let root = store.commit(&[], "root", &[("f.txt", "base\n")], &[]);
        let head = store.commit(&[root], "work", &[("f.txt", "w\n")], &[]);
        let pick = store.commit(&[head], "untraceable pick", &[("f.txt", "p\n")], &[]);

        let candidate = ScenarioCandidate {
            kind: ScenarioKind::CherryPick,
            ref_name: "refs/heads/main".parse().unwrap(),
            entries: vec![OperationLogEntry {
                old_id: head,
                new_id: pick,
                time_secs: 1_700_000_000,
                message: "cherry-pick: untraceable pick".to_owned(),
            }],
            start_id: head,
            end_id: pick,
            incomplete: false,
        };
        let err = CherryPickExtractor
            .extract(&candidate, &store, &Reconstructor::new())
            .unwrap_err();
        assert!(matches!(err, ExtractError::Skipped { .. }));
    }

    #[test]
    fn conflicting_pick_reconstructs_markers() {
        let mut store = MemoryStore::new("repo");
        let root = store.commit(&[], "root", &[("f.txt", "base\n")], &[]);
        let source = store.commit(&[root], "fix", &[("f.txt", "theirs\n")], &[]);
        let head = store.commit(&[root], "work", &[("f.txt", "ours\n")], &[]);
        let message = format!("fix\n\n(cherry picked from commit {source})");
        let pick = store.commit(&[head], &message, &[("f.txt", "resolved\n")], &[]);

        let candidate = ScenarioCandidate {
            kind: ScenarioKind::CherryPick,
            ref_name: "refs/heads/main".parse().unwrap(),
            entries: vec![OperationLogEntry {
                old_id: head,
                new_id: pick,
                time_secs: 1_700_000_000,
                message: "cherry-pick: fix".to_owned(),
            }],
            start_id: head,
            end_id: pick,
            incomplete: false,
        };
        let draft = CherryPickExtractor
            .extract(&candidate, &store, &Reconstructor::new())
            .unwrap();
        assert_eq!(draft.conflicts.len(), 1);
        let text = draft.conflicts.get("f.txt").unwrap();
        assert!(text.contains("ours"));
        assert!(text.contains("theirs"));
    }
}
