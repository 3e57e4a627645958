//! Batch coordinator - owns one run end to end
//!
//! The coordinator is responsible for:
//! - Enumerating work and submitting one task per item to the pool
//! - Tracking per-item outcomes in the run's `BatchState`
//! - Detecting completion exactly once, from whichever worker finishes last
//! - Publishing item and batch events through the sink
//!
//! Aggregation runs on worker threads, so every mutation goes through
//! atomics; the `completed == total` check is a single `fetch_add`, which
//! makes the completion transition race-free without a monitor thread.

use crate::batch::enumerate::enumerate;
use crate::batch::pool::WorkerPool;
use crate::batch::task::{self, WorkItem};
use crate::config::BatchConfig;
use crate::error::{BatchError, Result};
use crate::events::{BatchEvent, BatchSummary, EventSink};
use crate::metadata::{MetadataGenerator, MetadataWriter};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatchPhase {
    /// No batch started, or the previous batch was reset
    Idle = 0,
    /// Tasks submitted, outcomes arriving
    Running = 1,
    /// Last outcome arrived, completion event being published
    Completing = 2,
    /// Terminal until `reset` or the next `start`
    Completed = 3,
}

impl BatchPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => BatchPhase::Idle,
            1 => BatchPhase::Running,
            2 => BatchPhase::Completing,
            _ => BatchPhase::Completed,
        }
    }
}

/// Aggregate counters for one run
///
/// Mutated only through atomic increments from worker completions.
/// Invariants: `completed <= total`; `completed == total` iff the terminal
/// flag is set; at quiescence `succeeded + failed == completed`.
#[derive(Debug)]
pub struct BatchState {
    generation: u64,
    total: u64,
    completed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    done: AtomicBool,
    started: Instant,
    completion: Mutex<Option<Sender<BatchSummary>>>,
}

impl BatchState {
    fn new(generation: u64, total: u64, completion: Sender<BatchSummary>) -> Self {
        Self {
            generation,
            total,
            completed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            done: AtomicBool::new(false),
            started: Instant::now(),
            completion: Mutex::new(Some(completion)),
        }
    }

    /// Which run these counters belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Items the batch started with
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Items finished so far (either way)
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Items finished successfully so far
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Items failed so far
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// True once every item has reported
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Record one outcome; returns true for exactly the final one
    ///
    /// The outcome counter is bumped before `completed`, so when the last
    /// increment lands every per-outcome count is already visible.
    fn record_outcome(&self, success: bool) -> bool {
        if success {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }

        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug_assert!(completed <= self.total, "completed exceeded total");

        if completed == self.total {
            self.done.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.total,
            succeeded: self.succeeded(),
            failed: self.failed(),
            duration: self.started.elapsed(),
        }
    }

    /// Deliver the summary to the handle; the sender is taken so a second
    /// `wait` observes the channel as closed instead of blocking
    fn resolve(&self, summary: BatchSummary) {
        if let Some(tx) = self.completion.lock().take() {
            let _ = tx.send(summary);
        }
    }
}

/// Caller's view of one started batch
///
/// Returned by `start`/`run_batch` immediately; the run proceeds on worker
/// threads. Counters are live; `wait` blocks until the completion event.
#[derive(Debug)]
pub struct BatchHandle {
    state: Arc<BatchState>,
    completion: Receiver<BatchSummary>,
}

impl BatchHandle {
    /// Which run this handle observes
    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    /// Items the batch started with
    pub fn total(&self) -> u64 {
        self.state.total()
    }

    /// Live completed count
    pub fn completed(&self) -> u64 {
        self.state.completed()
    }

    /// Live success count
    pub fn succeeded(&self) -> u64 {
        self.state.succeeded()
    }

    /// Live failure count
    pub fn failed(&self) -> u64 {
        self.state.failed()
    }

    /// True once the batch reached its terminal state
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Block until the batch completes; None if the engine went away first
    /// or the summary was already taken by an earlier `wait`
    pub fn wait(&self) -> Option<BatchSummary> {
        self.completion.recv().ok()
    }

    /// Like `wait`, bounded by `timeout`
    pub fn wait_timeout(&self, timeout: Duration) -> Option<BatchSummary> {
        self.completion.recv_timeout(timeout).ok()
    }
}

/// One pool task: an item tagged with its batch generation
struct BatchTask {
    item: WorkItem,
    generation: u64,
}

/// State shared between the coordinator handle and the pool runner
struct Shared {
    phase: AtomicU8,
    /// Counters of the batch currently running; None outside a run
    current: Mutex<Option<Arc<BatchState>>>,
    /// Monotonic run counter; outcomes from older generations are discarded
    generation: AtomicU64,
    generator: Arc<dyn MetadataGenerator>,
    writer: Arc<dyn MetadataWriter>,
    sink: Arc<dyn EventSink>,
}

impl Shared {
    fn phase(&self) -> BatchPhase {
        BatchPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    fn cas_phase(&self, from: BatchPhase, to: BatchPhase) -> bool {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn store_phase(&self, to: BatchPhase) {
        self.phase.store(to as u8, Ordering::SeqCst);
    }
}

/// Coordinates one batch at a time over a shared worker pool
///
/// The pool is opened at construction and lives across runs; `shutdown`
/// closes it for good. Batches never interleave: starting while a run is
/// in flight fails with `BatchError::BatchInProgress`.
pub struct BatchCoordinator {
    shared: Arc<Shared>,
    pool: WorkerPool<BatchTask>,
    config: BatchConfig,
}

impl BatchCoordinator {
    /// Create a coordinator with its worker pool
    pub fn new(
        config: BatchConfig,
        generator: Arc<dyn MetadataGenerator>,
        writer: Arc<dyn MetadataWriter>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            phase: AtomicU8::new(BatchPhase::Idle as u8),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
            generator,
            writer,
            sink,
        });

        let runner_shared = Arc::clone(&shared);
        let pool = WorkerPool::new(config.worker_count, move |task: BatchTask| {
            run_task(&runner_shared, &task);
        })?;

        Ok(Self {
            shared,
            pool,
            config,
        })
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> BatchPhase {
        self.shared.phase()
    }

    /// Enumerate `root` and start a batch over the result
    ///
    /// Fails synchronously on a bad root; otherwise returns immediately
    /// while the run proceeds on the pool.
    pub fn run_batch(&self, root: &Path) -> Result<BatchHandle> {
        let items = enumerate(root, &self.config.extensions)?;
        self.start(items)
    }

    /// Start a batch over pre-enumerated items
    ///
    /// An empty list is a valid no-op batch: it goes straight to
    /// `Completed` with zero counts and still fires the completion event
    /// exactly once.
    pub fn start(&self, items: Vec<WorkItem>) -> Result<BatchHandle> {
        let shared = &self.shared;

        // Claim the run: only Idle or Completed may begin a new batch
        if !shared.cas_phase(BatchPhase::Idle, BatchPhase::Running)
            && !shared.cas_phase(BatchPhase::Completed, BatchPhase::Running)
        {
            return Err(BatchError::BatchInProgress);
        }

        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let total = items.len() as u64;
        let (tx, rx) = bounded(1);
        let state = Arc::new(BatchState::new(generation, total, tx));
        let handle = BatchHandle {
            state: Arc::clone(&state),
            completion: rx,
        };

        if items.is_empty() {
            info!(generation, "no work items; batch completes immediately");
            shared.store_phase(BatchPhase::Completing);
            state.done.store(true, Ordering::SeqCst);
            let summary = state.summary();
            shared.sink.on_event(BatchEvent::BatchCompleted {
                summary: summary.clone(),
            });
            shared.store_phase(BatchPhase::Completed);
            state.resolve(summary);
            return Ok(handle);
        }

        *shared.current.lock() = Some(Arc::clone(&state));
        info!(generation, total, workers = self.pool.worker_count(), "batch started");

        for item in items {
            if let Err(e) = self.pool.submit(BatchTask { item, generation }) {
                // Supersede the aborted run so outcomes from tasks already
                // queued cannot mutate its counters or fire its completion
                shared.current.lock().take();
                shared.store_phase(BatchPhase::Completed);
                warn!(generation, error = %e, "submission rejected; batch aborted");
                return Err(e.into());
            }
        }

        Ok(handle)
    }

    /// Return a `Completed` coordinator to `Idle`
    pub fn reset(&self) -> Result<()> {
        match self.shared.phase() {
            BatchPhase::Idle => Ok(()),
            BatchPhase::Completed => {
                if self.shared.cas_phase(BatchPhase::Completed, BatchPhase::Idle) {
                    Ok(())
                } else {
                    Err(BatchError::BatchInProgress)
                }
            }
            BatchPhase::Running | BatchPhase::Completing => Err(BatchError::BatchInProgress),
        }
    }

    /// Close the pool: reject new work, drain in-flight tasks, join workers
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

/// Pool runner: execute one task and fold its outcome into the current run
fn run_task(shared: &Shared, task: &BatchTask) {
    let outcome = task::execute(&task.item, &*shared.generator, &*shared.writer, &*shared.sink);

    // Guard: does this outcome still belong to the current batch?
    let state = shared.current.lock().clone();
    let Some(state) = state else {
        debug!(generation = task.generation, "no active batch; outcome discarded");
        return;
    };
    if state.generation() != task.generation {
        debug!(
            stale = task.generation,
            current = state.generation(),
            "outcome from superseded batch discarded"
        );
        return;
    }

    let success = outcome.is_success();
    shared.sink.on_event(BatchEvent::ItemCompleted { outcome });

    if state.record_outcome(success) {
        finish_batch(shared, &state);
    }
}

/// Terminal transition, entered exactly once per batch by the worker that
/// recorded the final outcome
fn finish_batch(shared: &Shared, state: &BatchState) {
    if !shared.cas_phase(BatchPhase::Running, BatchPhase::Completing) {
        warn!(
            generation = state.generation(),
            "completion raced an external phase change; event suppressed"
        );
        return;
    }

    shared.current.lock().take();

    let summary = state.summary();
    info!(
        generation = state.generation(),
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        duration_ms = summary.duration.as_millis() as u64,
        "batch completed"
    );

    shared.sink.on_event(BatchEvent::BatchCompleted {
        summary: summary.clone(),
    });

    // Phase goes terminal before the handle resolves, so a caller that
    // wakes from `wait` can immediately start the next batch
    shared.store_phase(BatchPhase::Completed);
    state.resolve(summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;

    fn state_for(total: u64) -> (Arc<BatchState>, Receiver<BatchSummary>) {
        let (tx, rx) = bounded(1);
        (Arc::new(BatchState::new(1, total, tx)), rx)
    }

    #[test]
    fn test_record_outcome_detects_last_exactly_once() {
        let (state, _rx) = state_for(3);

        assert!(!state.record_outcome(true));
        assert!(!state.record_outcome(false));
        assert!(state.record_outcome(true));

        assert_eq!(state.completed(), 3);
        assert_eq!(state.succeeded(), 2);
        assert_eq!(state.failed(), 1);
        assert!(state.is_done());
    }

    #[test]
    fn test_counts_balance_at_quiescence() {
        let (state, _rx) = state_for(5);
        for i in 0..5 {
            state.record_outcome(i % 2 == 0);
        }
        assert_eq!(state.succeeded() + state.failed(), state.completed());
        assert_eq!(state.completed(), state.total());
    }

    #[test]
    fn test_resolve_is_single_shot() {
        let (state, rx) = state_for(1);
        state.record_outcome(true);

        let summary = state.summary();
        state.resolve(summary.clone());
        state.resolve(summary);

        assert!(rx.recv().is_ok());
        // Sender was taken on the first resolve, so the channel is closed
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_phase_roundtrip() {
        for phase in [
            BatchPhase::Idle,
            BatchPhase::Running,
            BatchPhase::Completing,
            BatchPhase::Completed,
        ] {
            assert_eq!(BatchPhase::from_u8(phase as u8), phase);
        }
    }

    #[test]
    fn test_reset_only_from_terminal_phases() {
        let shared = Shared {
            phase: AtomicU8::new(BatchPhase::Completed as u8),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
            generator: Arc::new(crate::metadata::tests_support::StubGenerator),
            writer: Arc::new(crate::metadata::tests_support::StubWriter),
            sink: Arc::new(NullSink),
        };

        assert!(shared.cas_phase(BatchPhase::Completed, BatchPhase::Idle));
        assert_eq!(shared.phase(), BatchPhase::Idle);
        assert!(!shared.cas_phase(BatchPhase::Completed, BatchPhase::Idle));
    }
}
