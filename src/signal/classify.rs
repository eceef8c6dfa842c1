//! Operation-log phrase classification.
//!
//! Operation log messages are free text written by the version-control tool,
//! but each operation family stamps a recognizable prefix ("merge topic:
//! ...", "rebase (pick): ...", "cherry-pick: ..."). Classification is a
//! lookup table rather than control flow so new operation kinds can be added
//! by extending the table without touching the detector's traversal.

use crate::model::ScenarioKind;

/// Maps operation-log phrase prefixes to scenario kinds.
///
/// Rules are checked in order; the first prefix match wins. Messages that
/// match no rule are ordinary commits (or checkouts, resets, clones) and are
/// skipped by the detector.
#[derive(Clone, Debug)]
pub struct PhraseTable {
    rules: Vec<(&'static str, ScenarioKind)>,
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self {
            rules: vec![
                // "merge topic: Merge made by the 'ort' strategy." /
                // "merge topic: Fast-forward"
                ("merge ", ScenarioKind::Merge),
                // A conflicted merge concludes with a plain commit whose log
                // entry is stamped "commit (merge): <subject>".
                ("commit (merge)", ScenarioKind::Merge),
                // "rebase (start)", "rebase (pick)", "rebase (finish)",
                // "rebase -i (start)", "rebase finished: ..." — all one family.
                ("rebase", ScenarioKind::RebaseStep),
                ("cherry-pick:", ScenarioKind::CherryPick),
                ("revert:", ScenarioKind::Revert),
            ],
        }
    }
}

impl PhraseTable {
    /// Classify one operation-log message.
    #[must_use]
    pub fn classify(&self, message: &str) -> Option<ScenarioKind> {
        self.rules
            .iter()
            .find(|(prefix, _)| message.starts_with(prefix))
            .map(|&(_, kind)| kind)
    }

    /// Extend the table with an additional prefix rule.
    ///
    /// Later rules lose to earlier ones on overlapping prefixes.
    #[must_use]
    pub fn with_rule(mut self, prefix: &'static str, kind: ScenarioKind) -> Self {
        self.rules.push((prefix, kind));
        self
    }
}

// ---------------------------------------------------------------------------
// Rebase phases
// ---------------------------------------------------------------------------

/// Where within a rebase invocation a log entry falls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebasePhase {
    /// The checkout of the new base (`"rebase (start): ..."`).
    Start,
    /// One replayed step (`pick`, `reword`, `edit`, `squash`, `fixup`,
    /// `continue`, `skip`).
    Step,
    /// The invocation completed (`"rebase (finish): ..."` or the older
    /// `"rebase finished: ..."` form).
    Finish,
    /// The invocation was abandoned (`"rebase (abort): ..."`).
    Abort,
}

/// Determine the rebase phase of a message already classified as
/// [`ScenarioKind::RebaseStep`].
#[must_use]
pub fn rebase_phase(message: &str) -> RebasePhase {
    if message.contains("(start)") {
        RebasePhase::Start
    } else if message.contains("(finish)") || message.starts_with("rebase finished") {
        RebasePhase::Finish
    } else if message.contains("(abort)") {
        RebasePhase::Abort
    } else {
        // pick/reword/edit/squash/fixup/continue/skip, and the bare
        // "rebase: ..." form written by older tool versions.
        RebasePhase::Step
    }
}
