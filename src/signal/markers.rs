//! In-progress operation markers and sequencer state.
//!
//! A version-control tool mid-operation leaves marker files in the
//! repository's admin area: `MERGE_HEAD` during a conflicted merge,
//! `CHERRY_PICK_HEAD` / `REVERT_HEAD` while the sequencer is stopped, and a
//! `rebase-merge/` directory with the remaining todo list during an
//! interactive rebase. These capture transient state the canonical history
//! never records, so the detector turns them into `CONFLICT` candidates.
//!
//! The external pause hook (see `hooks/pause-sequence-editor`) guarantees
//! that during an interactive rebase the full planned step list is present
//! in `rebase-merge/git-rebase-todo` before any step executes; this module
//! only relies on that file's documented line format.

use std::str::FromStr;

use quarry_git::{RefName, RevisionId, RevisionStore, StoreError};

use crate::model::{ScenarioCandidate, ScenarioKind};

/// Marker files that name the "other side" of a stopped operation.
const OPERATION_HEADS: &[&str] = &["MERGE_HEAD", "CHERRY_PICK_HEAD", "REVERT_HEAD", "REBASE_HEAD"];

/// One parsed line of a sequencer todo list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencerStep {
    /// The step command (`pick`, `reword`, `squash`, `break`, ...).
    pub command: String,
    /// The (possibly abbreviated) revision the step applies, if the command
    /// takes one.
    pub revision: Option<String>,
    /// The human-readable remainder of the line.
    pub summary: String,
}

/// Parse a `git-rebase-todo` / `sequencer/todo` file.
///
/// Comment lines and blank lines are skipped. Commands without a revision
/// operand (`break`, `exec`, `noop`) yield `revision: None`.
#[must_use]
pub fn parse_sequencer_todo(bytes: &[u8]) -> Vec<SequencerStep> {
    let text = String::from_utf8_lossy(bytes);
    let mut steps = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(3, ' ');
        let Some(command) = parts.next() else { continue };
        let operand = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("");

        let takes_revision = matches!(
            command,
            "pick" | "p" | "reword" | "r" | "edit" | "e" | "squash" | "s" | "fixup" | "f"
                | "drop" | "d"
        );
        if takes_revision {
            steps.push(SequencerStep {
                command: command.to_owned(),
                revision: (!operand.is_empty()).then(|| operand.to_owned()),
                summary: rest.to_owned(),
            });
        } else {
            let summary = [operand, rest].join(" ").trim().to_owned();
            steps.push(SequencerStep {
                command: command.to_owned(),
                revision: None,
                summary,
            });
        }
    }
    steps
}

/// Scan the admin area for a stopped operation and produce `CONFLICT`
/// candidates bracketing `HEAD` and the recorded operation head.
///
/// Returns an empty vector for a quiescent repository (the common case), or
/// when `HEAD` is unborn.
pub fn detect_in_progress(
    store: &dyn RevisionStore,
) -> Result<Vec<ScenarioCandidate>, StoreError> {
    let head_ref = head_ref();
    let head = match store.resolve(&head_ref) {
        Ok(id) => id,
        Err(StoreError::RevisionNotFound { .. }) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut candidates = Vec::new();
    for marker in OPERATION_HEADS {
        let Some(bytes) = store.state_file(marker)? else {
            continue;
        };
        let Some(other) = parse_head_file(&bytes) else {
            tracing::debug!(marker, "unparseable operation head marker");
            continue;
        };
        candidates.push(ScenarioCandidate {
            kind: ScenarioKind::Conflict,
            ref_name: head_ref.clone(),
            entries: Vec::new(),
            start_id: head,
            end_id: other,
            incomplete: true,
        });
    }
    Ok(candidates)
}

fn head_ref() -> RefName {
    // "HEAD" is a well-known ref name; construction cannot fail.
    RefName::new("HEAD").unwrap_or_else(|_| unreachable!())
}

/// Operation head files hold one full hex id on the first line.
fn parse_head_file(bytes: &[u8]) -> Option<RevisionId> {
    let text = String::from_utf8_lossy(bytes);
    let first = text.lines().next()?.trim();
    RevisionId::from_str(first).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_todo_list() {
        let todo = b"pick 1a2b3c4 add feature\npick 5d6e7f8 fix bug\n";
        let steps = parse_sequencer_todo(todo);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].command, "pick");
        assert_eq!(steps[0].revision.as_deref(), Some("1a2b3c4"));
        assert_eq!(steps[0].summary, "add feature");
    }

    #[test]
    fn skips_comments_and_blanks() {
        let todo = b"# Rebase 1a2b..3c4d onto 5e6f\n\npick 1a2b3c4 add feature\n";
        let steps = parse_sequencer_todo(todo);
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn break_has_no_revision() {
        // The pause hook prepends exactly this line.
        let todo = b"break\npick 1a2b3c4 add feature\n";
        let steps = parse_sequencer_todo(todo);
        assert_eq!(steps[0].command, "break");
        assert_eq!(steps[0].revision, None);
        assert_eq!(steps[1].command, "pick");
    }

    #[test]
    fn exec_keeps_command_line_as_summary() {
        let todo = b"exec cargo test\n";
        let steps = parse_sequencer_todo(todo);
        assert_eq!(steps[0].command, "exec");
        assert_eq!(steps[0].revision, None);
        assert_eq!(steps[0].summary, "cargo test");
    }

    #[test]
    fn head_file_parses_first_line() {
        let bytes = format!("{}\n", "a".repeat(40));
        let id = parse_head_file(bytes.as_bytes()).unwrap();
        assert_eq!(id.to_string(), "a".repeat(40));
        assert_eq!(parse_head_file(b"garbage\n"), None);
    }
}
