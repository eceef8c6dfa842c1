//! Supplemental history-walk mining.
//!
//! Not everything leaves an operation log behind — a freshly cloned
//! repository has no reflog at all. This walker traverses first-parent
//! history per branch and mines what the commit graph alone can prove:
//!
//! - **File chains**: runs of ≥ N consecutive commits on one branch all
//!   modifying the same file (raw material for interactive-rebase tasks).
//! - **Cherry-picks by trailer**: commits carrying the `-x` "cherry picked
//!   from commit" line.
//! - **Cherry-picks by patch identity**: pairs of commits with identical
//!   messages and identical normalized patches; the chronologically older
//!   one is the cherry.
//!
//! Commits already visited through another branch are not reprocessed,
//! except for a short keep-alive overlap so chains crossing a branch origin
//! are still caught.

use std::collections::{BTreeMap, HashMap, HashSet};

use quarry_git::{ChangeKind, RefName, RevisionId, RevisionStore, StoreError};

use crate::model::{RefPosition, RepoState, ScenarioDraft, ScenarioKind};
use crate::reconstruct::{ReconstructError, Reconstructor};

use super::cherry_pick::source_from_message;
use super::patch_id::{PatchId, patch_id};
use super::short_id;

/// Mines scenarios that need no operation log, from the commit graph alone.
pub struct HistoryWalk {
    chain_window: usize,
    max_extra_cherry_picks: usize,
}

impl HistoryWalk {
    /// Create a walker.
    ///
    /// `chain_window` is the minimum run length for a file chain;
    /// `max_extra_cherry_picks` bounds the patch-identity search per scan.
    #[must_use]
    pub const fn new(chain_window: usize, max_extra_cherry_picks: usize) -> Self {
        Self {
            chain_window,
            max_extra_cherry_picks,
        }
    }

    /// Walk the given branch heads and return mined drafts.
    pub fn mine(
        &self,
        store: &dyn RevisionStore,
        heads: &[(RefName, RevisionId)],
        reconstructor: &Reconstructor,
    ) -> Result<Vec<ScenarioDraft>, StoreError> {
        let mut drafts = Vec::new();
        let mut visited: HashSet<RevisionId> = HashSet::new();
        let mut messages: HashMap<String, Vec<MessageEntry>> = HashMap::new();
        let mut trailer_picks: Vec<TrailerPick> = Vec::new();

        for (ref_name, tip) in heads {
            self.walk_branch(
                store,
                ref_name,
                *tip,
                &mut visited,
                &mut messages,
                &mut trailer_picks,
                &mut drafts,
            )?;
        }

        for pick in trailer_picks {
            let draft = cherry_draft(
                store,
                reconstructor,
                pick.id,
                pick.parent,
                pick.source,
                "the -x trailer",
            )?;
            drafts.extend(draft);
        }

        drafts.extend(self.mine_duplicate_messages(store, reconstructor, &messages)?);
        Ok(drafts)
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_branch(
        &self,
        store: &dyn RevisionStore,
        ref_name: &RefName,
        tip: RevisionId,
        visited: &mut HashSet<RevisionId>,
        messages: &mut HashMap<String, Vec<MessageEntry>>,
        trailer_picks: &mut Vec<TrailerPick>,
        drafts: &mut Vec<ScenarioDraft>,
    ) -> Result<(), StoreError> {
        let mut chains: HashMap<String, OpenChain> = HashMap::new();
        // Continue a little past commits another branch already covered so
        // chains overlapping the branch origin still close properly.
        let mut keepalive = self.chain_window.saturating_sub(1);
        let mut current = Some(tip);

        while let Some(id) = current {
            let first_visit = visited.insert(id);
            if !first_visit {
                if keepalive == 0 {
                    break;
                }
                keepalive -= 1;
            }

            let rev = store.revision(id)?;
            let first_parent = rev.parents.first().copied();

            let changed: HashSet<String> = store
                .diff(first_parent, id)?
                .into_iter()
                .filter(|e| matches!(e.kind, ChangeKind::Added | ChangeKind::Modified))
                .map(|e| e.path)
                .collect();

            // Message and trailer tracking happens once per commit; chain
            // state below intentionally reprocesses the keep-alive overlap.
            if first_visit && !rev.is_merge() && !changed.is_empty() {
                if let Some(parent) = first_parent {
                    if let Some(source) = source_from_message(&rev.message) {
                        trailer_picks.push(TrailerPick {
                            id,
                            parent,
                            source,
                        });
                    }
                    messages.entry(rev.message.clone()).or_default().push(
                        MessageEntry {
                            id,
                            parent,
                            time: rev.commit_time,
                        },
                    );
                }
            }

            // Close chains the current commit does not continue. Sorted so
            // draft order is deterministic run to run.
            let mut stale: Vec<String> = chains
                .keys()
                .filter(|path| !changed.contains(*path))
                .cloned()
                .collect();
            stale.sort();
            for path in stale {
                if let Some(chain) = chains.remove(&path) {
                    self.flush_chain(ref_name, &path, &chain, drafts);
                }
            }

            for path in changed {
                chains
                    .entry(path)
                    .and_modify(|chain| {
                        chain.count += 1;
                        chain.oldest = id;
                    })
                    .or_insert(OpenChain {
                        newest: id,
                        oldest: id,
                        count: 1,
                    });
            }

            current = first_parent;
        }

        // Chains still open when the walk ends (they reach the root or the
        // keep-alive boundary) are flushed as-is, in path order.
        let mut remaining: Vec<(String, OpenChain)> = chains.into_iter().collect();
        remaining.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, chain) in remaining {
            self.flush_chain(ref_name, &path, &chain, drafts);
        }
        Ok(())
    }

    fn flush_chain(
        &self,
        ref_name: &RefName,
        path: &str,
        chain: &OpenChain,
        drafts: &mut Vec<ScenarioDraft>,
    ) {
        if chain.count < self.chain_window {
            return;
        }
        drafts.push(ScenarioDraft {
            kind: ScenarioKind::FileChain,
            pre_state: RepoState::new(
                vec![
                    RefPosition::new(ref_name.as_str(), chain.newest),
                    RefPosition::new("chain-start", chain.oldest),
                ],
                chain.oldest,
            ),
            post_state: RepoState::single(ref_name.as_str(), chain.newest),
            conflicts: BTreeMap::new(),
            description: format!(
                "'{}' is modified in {} consecutive commits on '{}' ({}..{}). Rework the run \
                 with an interactive rebase.",
                path,
                chain.count,
                ref_name.short(),
                short_id(chain.oldest),
                short_id(chain.newest),
            ),
        });
    }

    /// Commits sharing a message and a normalized patch are cherry/pick
    /// pairs even without the `-x` trailer.
    fn mine_duplicate_messages(
        &self,
        store: &dyn RevisionStore,
        reconstructor: &Reconstructor,
        messages: &HashMap<String, Vec<MessageEntry>>,
    ) -> Result<Vec<ScenarioDraft>, StoreError> {
        let mut groups: Vec<(&String, &Vec<MessageEntry>)> = messages
            .iter()
            .filter(|(message, entries)| entries.len() > 1 && !message.trim().is_empty())
            .collect();
        // Smallest groups first: the broadest coverage before the cap bites.
        groups.sort_by(|a, b| (a.1.len(), a.0).cmp(&(b.1.len(), b.0)));

        let mut ids: HashMap<RevisionId, Option<PatchId>> = HashMap::new();
        let mut drafts = Vec::new();

        'groups: for (_, entries) in groups {
            for (i, pivot) in entries.iter().enumerate() {
                for target in &entries[i + 1..] {
                    if drafts.len() >= self.max_extra_cherry_picks {
                        tracing::debug!(
                            limit = self.max_extra_cherry_picks,
                            "patch-identity cherry-pick cap reached"
                        );
                        break 'groups;
                    }
                    if !patch_ids_match(store, &mut ids, pivot.id, target.id)? {
                        continue;
                    }
                    // The chronologically younger commit picked the older
                    // one; identical timestamps are unattributable.
                    let (cherry, pick) = if pivot.time < target.time {
                        (pivot, target)
                    } else if pivot.time > target.time {
                        (target, pivot)
                    } else {
                        continue;
                    };
                    let draft = cherry_draft(
                        store,
                        reconstructor,
                        pick.id,
                        pick.parent,
                        cherry.id,
                        "matching patch identity",
                    )?;
                    drafts.extend(draft);
                    // One cherry per pivot avoids duplicating multi-pick
                    // chains as pairwise scenarios.
                    break;
                }
            }
        }
        Ok(drafts)
    }
}

struct OpenChain {
    newest: RevisionId,
    oldest: RevisionId,
    count: usize,
}

struct MessageEntry {
    id: RevisionId,
    parent: RevisionId,
    time: i64,
}

struct TrailerPick {
    id: RevisionId,
    parent: RevisionId,
    source: RevisionId,
}

fn patch_ids_match(
    store: &dyn RevisionStore,
    cache: &mut HashMap<RevisionId, Option<PatchId>>,
    a: RevisionId,
    b: RevisionId,
) -> Result<bool, StoreError> {
    let id_a = cached_patch_id(store, cache, a)?;
    let id_b = cached_patch_id(store, cache, b)?;
    Ok(matches!((id_a, id_b), (Some(x), Some(y)) if x == y))
}

fn cached_patch_id(
    store: &dyn RevisionStore,
    cache: &mut HashMap<RevisionId, Option<PatchId>>,
    id: RevisionId,
) -> Result<Option<PatchId>, StoreError> {
    if let Some(known) = cache.get(&id) {
        return Ok(*known);
    }
    let computed = patch_id(store, id)?;
    cache.insert(id, computed);
    Ok(computed)
}

/// Build a cherry-pick draft for a pick whose cherry is known.
///
/// Returns `None` when the cherry can't anchor a reconstruction (missing
/// from the store, or a root revision).
fn cherry_draft(
    store: &dyn RevisionStore,
    reconstructor: &Reconstructor,
    pick: RevisionId,
    pick_parent: RevisionId,
    cherry: RevisionId,
    evidence: &str,
) -> Result<Option<ScenarioDraft>, StoreError> {
    let cherry_rev = match store.revision(cherry) {
        Ok(rev) => rev,
        Err(StoreError::RevisionNotFound { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    let Some(&cherry_parent) = cherry_rev.parents.first() else {
        return Ok(None);
    };

    let conflicts =
        match reconstructor.merge_revisions(store, cherry_parent, pick_parent, cherry) {
            Ok(reconstruction) => reconstruction.conflicts(),
            Err(ReconstructError::Ambiguous { .. }) => return Ok(None),
            Err(ReconstructError::Store(e)) => return Err(e),
        };

    Ok(Some(ScenarioDraft {
        kind: ScenarioKind::CherryPick,
        pre_state: RepoState::new(
            vec![
                RefPosition::new("parent", pick_parent),
                RefPosition::new("cherry", cherry),
            ],
            pick_parent,
        ),
        post_state: RepoState::single("cherry-pick", pick),
        conflicts,
        description: format!(
            "Cherry-pick '{}' ({}) onto {} (identified via {}).",
            cherry_rev.summary(),
            short_id(cherry),
            short_id(pick_parent),
            evidence,
        ),
    }))
}
