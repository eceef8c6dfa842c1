//! Extraction of rebase-sequence scenarios.

use quarry_git::{RevisionId, RevisionStore};

use crate::model::{RefPosition, RepoState, ScenarioCandidate, ScenarioDraft, ScenarioKind};
use crate::reconstruct::{Reconstruction, Reconstructor};
use crate::signal::{RebasePhase, rebase_phase};

use super::{ExtractError, Extractor, short_id};

/// Extracts one rebase invocation (all of its steps) as a scenario.
///
/// Incomplete invocations — aborted, or still unfinished at the end of the
/// log — are rejected unless the extractor was constructed with
/// `allow_incomplete`. Requires at least one replayed step. Conflicts are
/// reconstructed for replaying the original commits onto the new base; a
/// cleanly-replaying rebase still stands as a scenario (the sequence itself
/// is the task).
pub struct RebaseExtractor {
    allow_incomplete: bool,
}

impl RebaseExtractor {
    /// Create the extractor with the given incomplete-candidate policy.
    #[must_use]
    pub const fn new(allow_incomplete: bool) -> Self {
        Self { allow_incomplete }
    }
}

impl Extractor for RebaseExtractor {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::RebaseStep
    }

    fn extract(
        &self,
        candidate: &ScenarioCandidate,
        store: &dyn RevisionStore,
        reconstructor: &Reconstructor,
    ) -> Result<ScenarioDraft, ExtractError> {
        if candidate.incomplete && !self.allow_incomplete {
            return Err(ExtractError::skipped(
                "incomplete rebase rejected by policy",
            ));
        }

        let steps: Vec<_> = candidate
            .entries
            .iter()
            .filter(|e| rebase_phase(&e.message) == RebasePhase::Step)
            .collect();
        if steps.is_empty() {
            return Err(ExtractError::skipped("rebase with no replayed steps"));
        }

        // The start entry checks out the new base; without one (truncated
        // log) the first step's pre-value is the best available stand-in.
        let onto = candidate
            .entries
            .iter()
            .find(|e| rebase_phase(&e.message) == RebasePhase::Start)
            .map_or(steps[0].old_id, |e| e.new_id);
        let original = candidate.start_id;
        if original.is_zero() || onto.is_zero() {
            return Err(ExtractError::skipped("truncated operation log"));
        }

        let base = store
            .merge_base(onto, original)?
            .ok_or_else(|| ExtractError::skipped("rebase sides share no history"))?;

        // base == original would mean the branch had nothing of its own to
        // replay; base == onto is the everyday `rebase -i HEAD~n` case where
        // replaying is clean by construction.
        let reconstruction = if base == original {
            Reconstruction::default()
        } else {
            reconstructor.merge_revisions(store, base, onto, original)?
        };
        let conflicts = reconstruction.conflicts();

        let new_tip = if candidate.incomplete {
            // The partially rebased head: the last step that completed.
            steps.last().map_or(candidate.end_id, |e| e.new_id)
        } else {
            candidate.end_id
        };
        if new_tip == onto {
            return Err(ExtractError::skipped("rebase replayed nothing"));
        }

        let description = format!(
            "Rebase {} step(s) from {} onto {}; {} file(s) conflict during replay{}.",
            steps.len(),
            short_id(original),
            short_id(onto),
            conflicts.len(),
            if candidate.incomplete {
                " (invocation was left unfinished)"
            } else {
                ""
            },
        );

        Ok(ScenarioDraft {
            kind: ScenarioKind::RebaseStep,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new(candidate.ref_name.as_str(), original),
                    RefPosition::new("onto", onto),
                    RefPosition::new("merge-base", base),
                ],
                onto,
            ),
            post_state: RepoState::single(candidate.ref_name.as_str(), new_tip),
            conflicts,
            description,
        })
    }
}
