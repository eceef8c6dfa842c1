//! Single-repository scan orchestration.
//!
//! Sequences the pipeline over one repository's history: the (inherently
//! sequential) signal detector walks each selected reference's operation
//! log, candidates fan out to a bounded pool of stateless extraction
//! workers, and validated records are emitted to the sink in discovery
//! order. The store is shared read-only across workers; no locking is
//! needed because nothing mutates it during a scan.
//!
//! Per-candidate failures are isolated inside the workers — one bad commit
//! never aborts the rest of the walk. Only storage-level corruption,
//! configuration problems, or a failing sink end the scan.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel as channel;

use quarry_git::{RefName, RevisionId, RevisionStore};

use crate::builder::{BuildError, RecordBuilder};
use crate::config::MinerConfig;
use crate::error::ScanError;
use crate::extract::{ExtractError, Extractor, ExtractorSet, HistoryWalk};
use crate::model::{ScenarioCandidate, ScenarioDraft};
use crate::reconstruct::Reconstructor;
use crate::signal::SignalDetector;
use crate::sink::Sink;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation for a running scan.
///
/// Checked at the top of each worker iteration and between pipeline phases;
/// a cancelled scan stops enqueueing work and returns what it has emitted so
/// far. No mid-candidate cancellation — extraction cost is bounded by diff
/// size.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A fresh, uncancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Outcome counters
// ---------------------------------------------------------------------------

/// Summary counters for one scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// References whose operation logs were scanned.
    pub refs_scanned: usize,
    /// Candidates the detector produced.
    pub candidates: usize,
    /// Records emitted to the sink.
    pub records: usize,
    /// Candidates filtered as expected (skips, ambiguous reconstructions).
    pub filtered: usize,
    /// Per-candidate failures that were isolated.
    pub failed: usize,
    /// Records dropped for violating an invariant.
    pub invalid: usize,
    /// Records dropped as duplicates of an already-emitted scenario.
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Run a full scan of one repository.
pub fn scan(
    store: &dyn RevisionStore,
    config: &MinerConfig,
    sink: &mut dyn Sink,
) -> Result<ScanOutcome, ScanError> {
    scan_with_cancel(store, config, sink, &CancelFlag::new())
}

/// Run a full scan, checking `cancel` between candidates.
pub fn scan_with_cancel(
    store: &dyn RevisionStore,
    config: &MinerConfig,
    sink: &mut dyn Sink,
    cancel: &CancelFlag,
) -> Result<ScanOutcome, ScanError> {
    let span = tracing::info_span!("scan", repository = %store.identity());
    let _guard = span.enter();

    let mut outcome = ScanOutcome::default();
    let detector = SignalDetector::new(config.group_gap_secs);
    let heads = select_refs(store, config)?;

    // Phase 1: sequential detection across all selected refs.
    let mut candidates: Vec<ScenarioCandidate> = Vec::new();
    for (ref_name, _) in &heads {
        candidates.extend(detector.detect(store, ref_name)?);
        outcome.refs_scanned += 1;
    }
    candidates.extend(detector.detect_in_progress(store)?);
    outcome.candidates = candidates.len();

    // Phase 2: parallel extraction over a bounded worker pool, results
    // validated and emitted on this thread in arrival order.
    let extractors = ExtractorSet::standard(config.allow_incomplete);
    let reconstructor = Reconstructor::new();
    let mut builder = RecordBuilder::new(store);
    let workers = config.effective_workers();

    let (candidate_tx, candidate_rx) = channel::bounded::<ScenarioCandidate>(workers * 2);
    let (draft_tx, draft_rx) = channel::unbounded::<Result<ScenarioDraft, ExtractError>>();

    let mut sink_error: Option<std::io::Error> = None;
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let candidate_rx = candidate_rx.clone();
            let draft_tx = draft_tx.clone();
            let extractors = &extractors;
            let reconstructor = &reconstructor;
            let cancel = cancel.clone();
            scope.spawn(move || {
                while !cancel.is_cancelled() {
                    let Ok(candidate) = candidate_rx.recv() else {
                        break;
                    };
                    let result = extract_one(extractors, store, reconstructor, &candidate);
                    if draft_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(draft_tx);
        drop(candidate_rx);

        // Bounded send with a cancellation check: if workers wind down while
        // the queue is full, the feeder must not block forever.
        'feed: for candidate in candidates {
            if cancel.is_cancelled() {
                break;
            }
            let mut pending = candidate;
            loop {
                match candidate_tx
                    .send_timeout(pending, std::time::Duration::from_millis(50))
                {
                    Ok(()) => break,
                    Err(channel::SendTimeoutError::Timeout(returned)) => {
                        if cancel.is_cancelled() {
                            break 'feed;
                        }
                        pending = returned;
                    }
                    Err(channel::SendTimeoutError::Disconnected(_)) => break 'feed,
                }
            }
        }
        drop(candidate_tx);

        for result in &draft_rx {
            if let Err(e) = consume(result, &mut builder, sink, &mut outcome) {
                sink_error = Some(e);
                break;
            }
        }
    });
    if let Some(e) = sink_error {
        return Err(ScanError::Sink(e));
    }

    // Phase 3: supplemental history-walk mining (no operation log needed).
    if !cancel.is_cancelled() {
        let walk = HistoryWalk::new(config.chain_window, config.max_extra_cherry_picks);
        for draft in walk.mine(store, &heads, &reconstructor)? {
            consume(Ok(draft), &mut builder, sink, &mut outcome).map_err(ScanError::Sink)?;
        }
    }

    tracing::info!(
        refs = outcome.refs_scanned,
        candidates = outcome.candidates,
        records = outcome.records,
        filtered = outcome.filtered,
        failed = outcome.failed,
        invalid = outcome.invalid,
        duplicates = outcome.duplicates,
        "scan complete"
    );
    Ok(outcome)
}

/// The references to scan: the configured list, or all local branches plus
/// `HEAD` (whose log carries the step-by-step trace of interactive
/// operations).
fn select_refs(
    store: &dyn RevisionStore,
    config: &MinerConfig,
) -> Result<Vec<(RefName, RevisionId)>, ScanError> {
    if config.refs.is_empty() {
        let mut heads = store.list_refs("refs/heads/")?;
        if let Ok(head_ref) = RefName::new("HEAD") {
            if let Ok(id) = store.resolve(&head_ref) {
                heads.push((head_ref, id));
            }
        }
        return Ok(heads);
    }

    let mut selected = Vec::new();
    for name in &config.refs {
        let Ok(ref_name) = RefName::new(name) else {
            tracing::warn!(name = %name, "ignoring invalid ref name in configuration");
            continue;
        };
        match store.resolve(&ref_name) {
            Ok(id) => selected.push((ref_name, id)),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(selected)
}

fn extract_one(
    extractors: &ExtractorSet,
    store: &dyn RevisionStore,
    reconstructor: &Reconstructor,
    candidate: &ScenarioCandidate,
) -> Result<ScenarioDraft, ExtractError> {
    let extractor: &dyn Extractor = extractors
        .for_kind(candidate.kind)
        .ok_or_else(|| ExtractError::skipped("no extractor registered for kind"))?;
    extractor.extract(candidate, store, reconstructor)
}

/// Route one extraction result through the builder to the sink, updating
/// counters. Only a sink failure is returned; everything else is absorbed.
fn consume(
    result: Result<ScenarioDraft, ExtractError>,
    builder: &mut RecordBuilder<'_>,
    sink: &mut dyn Sink,
    outcome: &mut ScanOutcome,
) -> Result<(), std::io::Error> {
    let draft = match result {
        Ok(draft) => draft,
        Err(e) if e.is_filtered() => {
            tracing::debug!(error = %e, "candidate filtered");
            outcome.filtered += 1;
            return Ok(());
        }
        Err(e) => {
            tracing::warn!(error = %e, "candidate extraction failed");
            outcome.failed += 1;
            return Ok(());
        }
    };

    match builder.build(draft) {
        Ok(Some(record)) => {
            sink.emit(&record)?;
            outcome.records += 1;
        }
        Ok(None) => outcome.duplicates += 1,
        Err(BuildError::InvalidScenario { kind, reason }) => {
            tracing::warn!(kind, reason, "invalid scenario dropped");
            outcome.invalid += 1;
        }
        Err(BuildError::Store(e)) => {
            tracing::warn!(error = %e, "validation query failed, record dropped");
            outcome.failed += 1;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
