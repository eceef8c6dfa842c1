//! Grouping of classified operation-log entries into scenario candidates.
//!
//! A single interactive operation leaves several adjacent entries in the log
//! (one per rebase step, one per picked commit in a range cherry-pick). The
//! grouping key is a maximal run of entries of the same kind with no
//! intervening unrelated entry and a gap between entries smaller than the
//! configured threshold. Merges complete in a single pointer move and are
//! never grouped.

use quarry_git::{OperationLogEntry, RefName};

use crate::model::{ScenarioCandidate, ScenarioKind};

use super::classify::{PhraseTable, RebasePhase, rebase_phase};

/// Group one reference's log entries into candidates, in chronological order.
///
/// `gap_secs` is the tunable session boundary: two same-kind entries further
/// apart than this belong to separate invocations even with nothing recorded
/// in between.
#[must_use]
pub fn group_entries(
    ref_name: &RefName,
    entries: &[OperationLogEntry],
    table: &PhraseTable,
    gap_secs: u64,
) -> Vec<ScenarioCandidate> {
    let mut candidates = Vec::new();
    let mut run: Option<Run> = None;

    for entry in entries {
        let Some(kind) = table.classify(&entry.message) else {
            // Ordinary commit/checkout/reset — closes any open run.
            if let Some(open) = run.take() {
                candidates.push(open.into_candidate(ref_name));
            }
            continue;
        };

        if kind == ScenarioKind::Merge {
            // Single-entry operation: never grouped with neighbours.
            if let Some(open) = run.take() {
                candidates.push(open.into_candidate(ref_name));
            }
            candidates.push(ScenarioCandidate {
                kind,
                ref_name: ref_name.clone(),
                entries: vec![entry.clone()],
                start_id: entry.old_id,
                end_id: entry.new_id,
                incomplete: false,
            });
            continue;
        }

        let starts_new_invocation = kind == ScenarioKind::RebaseStep
            && rebase_phase(&entry.message) == RebasePhase::Start;

        let continues_run = match &mut run {
            Some(open) => {
                let within_gap = entry.time_secs.saturating_sub(open.last_time)
                    < i64::try_from(gap_secs).unwrap_or(i64::MAX);
                if open.kind == kind && within_gap && !starts_new_invocation && !open.closed {
                    open.push(entry);
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if continues_run {
            continue;
        }

        if let Some(open) = run.take() {
            candidates.push(open.into_candidate(ref_name));
        }
        run = Some(Run::begin(kind, entry));
    }

    if let Some(open) = run.take() {
        candidates.push(open.into_candidate(ref_name));
    }

    candidates
}

/// An in-progress same-kind run of log entries.
struct Run {
    kind: ScenarioKind,
    entries: Vec<OperationLogEntry>,
    last_time: i64,
    /// A finish or abort entry was seen; later same-kind entries belong to a
    /// new invocation.
    closed: bool,
    finished: bool,
}

impl Run {
    fn begin(kind: ScenarioKind, entry: &OperationLogEntry) -> Self {
        let mut run = Self {
            kind,
            entries: Vec::new(),
            last_time: entry.time_secs,
            closed: false,
            finished: kind != ScenarioKind::RebaseStep,
        };
        run.push(entry);
        run
    }

    fn push(&mut self, entry: &OperationLogEntry) {
        if self.kind == ScenarioKind::RebaseStep {
            match rebase_phase(&entry.message) {
                RebasePhase::Finish => {
                    self.finished = true;
                    self.closed = true;
                }
                RebasePhase::Abort => {
                    self.finished = false;
                    self.closed = true;
                }
                RebasePhase::Start | RebasePhase::Step => {}
            }
        }
        self.last_time = entry.time_secs;
        self.entries.push(entry.clone());
    }

    fn into_candidate(self, ref_name: &RefName) -> ScenarioCandidate {
        // `entries` is non-empty: `begin` always pushes the first entry.
        let start_id = self
            .entries
            .first()
            .map_or(quarry_git::RevisionId::ZERO, |e| e.old_id);
        let end_id = self
            .entries
            .last()
            .map_or(quarry_git::RevisionId::ZERO, |e| e.new_id);
        ScenarioCandidate {
            kind: self.kind,
            ref_name: ref_name.clone(),
            entries: self.entries,
            start_id,
            end_id,
            incomplete: !self.finished,
        }
    }
}
