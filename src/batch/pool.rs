//! Fixed-size worker pool
//!
//! A bounded set of OS threads consuming typed tasks from a shared channel.
//! Submissions are accepted in FIFO order; once dequeued, start order across
//! workers is unspecified. The pool survives panicking tasks and shuts down
//! gracefully: stop accepting, drain what was accepted, join the workers.

use crate::error::PoolError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Bounded-concurrency executor for typed tasks
///
/// The runner is fixed at construction and invoked once per task on a
/// worker thread. Task types should carry data, not behavior.
pub struct WorkerPool<T> {
    /// Sending half; taken on shutdown so workers see the disconnect
    sender: Mutex<Option<Sender<T>>>,

    /// Cleared when shutdown begins; submissions fail afterwards
    accepting: AtomicBool,

    /// Worker thread handles, drained on shutdown
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Concurrency limit, fixed at construction
    limit: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn a pool with `workers` threads running `runner` per task
    pub fn new<R>(workers: usize, runner: R) -> Result<Self, PoolError>
    where
        R: Fn(T) + Send + Sync + 'static,
    {
        let (sender, receiver) = unbounded::<T>();
        let runner = Arc::new(runner);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let receiver = receiver.clone();
            let runner = Arc::clone(&runner);

            let handle = thread::Builder::new()
                .name(format!("metabatch-{}", id))
                .spawn(move || worker_loop(id, &receiver, &*runner))
                .map_err(|e| PoolError::SpawnFailed {
                    id,
                    reason: e.to_string(),
                })?;

            handles.push(handle);
        }

        debug!(count = handles.len(), "workers spawned");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            accepting: AtomicBool::new(true),
            workers: Mutex::new(handles),
            limit: workers,
        })
    }

    /// Number of worker threads (the concurrency limit)
    pub fn worker_count(&self) -> usize {
        self.limit
    }

    /// Submit a task for execution
    ///
    /// Accepted tasks queue in submission order and are guaranteed to run.
    /// Fails with `PoolError::Closed` once shutdown has begun.
    pub fn submit(&self, task: T) -> Result<(), PoolError> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }

        match &*self.sender.lock() {
            Some(sender) => sender.send(task).map_err(|_| PoolError::Closed),
            None => Err(PoolError::Closed),
        }
    }

    /// Graceful shutdown: reject new submissions, let accepted tasks drain,
    /// join the workers
    ///
    /// Idempotent; later calls return once the first has finished.
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);

        // Dropping the sender disconnects the channel; workers finish the
        // queue and exit their recv loop
        self.sender.lock().take();

        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
    }
}

impl<T> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.accepting.store(false, Ordering::SeqCst);
        self.sender.lock().take();
        for handle in std::mem::take(&mut *self.workers.lock()) {
            let _ = handle.join();
        }
    }
}

/// Main worker loop: drain tasks until the channel disconnects
fn worker_loop<T, R: Fn(T)>(id: usize, receiver: &Receiver<T>, runner: &R) {
    debug!(worker = id, "worker starting");

    while let Ok(task) = receiver.recv() {
        // A panicking task must not take the worker with it
        if catch_unwind(AssertUnwindSafe(|| runner(task))).is_err() {
            warn!(worker = id, "task panicked; worker continues");
        }
    }

    debug!(worker = id, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded as chan;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_tasks_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let pool = WorkerPool::new(2, move |n: usize| {
            c.fetch_add(n, Ordering::SeqCst);
        })
        .unwrap();

        for _ in 0..10 {
            pool.submit(1).unwrap();
        }
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_fifo_acceptance_with_single_worker() {
        let (tx, rx) = chan();
        let pool = WorkerPool::new(1, move |n: usize| {
            tx.send(n).unwrap();
        })
        .unwrap();

        for n in 0..20 {
            pool.submit(n).unwrap();
        }
        pool.shutdown();

        let seen: Vec<usize> = rx.try_iter().collect();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool: WorkerPool<usize> = WorkerPool::new(1, |_| {}).unwrap();
        pool.shutdown();

        assert!(matches!(pool.submit(1), Err(PoolError::Closed)));

        // Shutdown is idempotent
        pool.shutdown();
    }

    #[test]
    fn test_shutdown_drains_accepted_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let pool = WorkerPool::new(1, move |_: usize| {
            thread::sleep(Duration::from_millis(5));
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        for n in 0..8 {
            pool.submit(n).unwrap();
        }

        // Accepted before shutdown, so all eight must run
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_concurrency_never_exceeds_worker_count() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));

        let pool = WorkerPool::new(2, move |_: usize| {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            a.fetch_sub(1, Ordering::SeqCst);
        })
        .unwrap();

        for n in 0..12 {
            pool.submit(n).unwrap();
        }
        pool.shutdown();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let pool = WorkerPool::new(1, move |n: usize| {
            if n == 0 {
                panic!("boom");
            }
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        pool.submit(0).unwrap();
        pool.submit(1).unwrap();
        pool.submit(2).unwrap();
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
