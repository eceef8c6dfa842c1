//! Extraction of in-progress conflict-state scenarios.

use quarry_git::{RevisionStore, StoreError};

use crate::model::{RefPosition, RepoState, ScenarioCandidate, ScenarioDraft, ScenarioKind};
use crate::reconstruct::Reconstructor;
use crate::signal::parse_sequencer_todo;

use super::{ExtractError, Extractor, short_id};

/// Sequencer todo files, checked in the order the tool writes them
/// (interactive rebase first, then multi-pick cherry-pick/revert runs).
const TODO_FILES: &[&str] = &["rebase-merge/git-rebase-todo", "sequencer/todo"];

/// Count the steps still queued in the sequencer, if one is active.
///
/// The pause hook guarantees the full planned step list is on disk before any
/// step executes, so this sees the whole plan when capture happens up front.
fn queued_steps(store: &dyn RevisionStore) -> Result<Option<usize>, StoreError> {
    for name in TODO_FILES {
        if let Some(bytes) = store.state_file(name)? {
            let steps = parse_sequencer_todo(&bytes);
            return Ok(Some(steps.iter().filter(|s| s.revision.is_some()).count()));
        }
    }
    Ok(None)
}

/// Extracts a repository caught mid-operation with unresolved conflicts.
///
/// The detector produces these candidates from admin-area marker files
/// (`MERGE_HEAD` and friends), so the candidate is `incomplete` by
/// construction — this extractor accepts that, since the unfinished
/// operation *is* the scenario. Threshold: the two heads must actually
/// diverge and reconstruct with at least one conflicted file.
pub struct ConflictExtractor;

impl Extractor for ConflictExtractor {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Conflict
    }

    fn extract(
        &self,
        candidate: &ScenarioCandidate,
        store: &dyn RevisionStore,
        reconstructor: &Reconstructor,
    ) -> Result<ScenarioDraft, ExtractError> {
        let head = candidate.start_id;
        let other = candidate.end_id;

        let base = store
            .merge_base(head, other)?
            .ok_or_else(|| ExtractError::skipped("operation heads share no history"))?;
        if base == head || base == other {
            return Err(ExtractError::skipped("operation heads do not diverge"));
        }

        let reconstruction = reconstructor.merge_revisions(store, base, head, other)?;
        let conflicts = reconstruction.conflicts();
        if conflicts.is_empty() {
            return Err(ExtractError::skipped(
                "in-progress operation has no overlapping changes",
            ));
        }

        let other_rev = store.revision(other)?;
        let mut description = format!(
            "Unfinished operation combining '{}' ({}) into the current head ({}); {} file(s) are \
             left with conflict markers to resolve.",
            other_rev.summary(),
            short_id(other),
            short_id(head),
            conflicts.len(),
        );
        if let Some(queued) = queued_steps(store)? {
            description.push_str(&format!(" {queued} step(s) remain queued in the sequencer."));
        }

        Ok(ScenarioDraft {
            kind: ScenarioKind::Conflict,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new(candidate.ref_name.as_str(), head),
                    RefPosition::new("operation-head", other),
                    RefPosition::new("merge-base", base),
                ],
                head,
            ),
            // The operation never finished; there is no resolved revision to
            // point at. The record's post-state stays at the current head.
            post_state: RepoState::single(candidate.ref_name.as_str(), head),
            conflicts,
            description,
        })
    }
}
