//! Event surface bridging worker threads to a single-threaded consumer
//!
//! Workers publish; the consumer drains on its own thread. A sink
//! implementation must never block or do unbounded work inline, because it
//! is invoked from whichever worker thread finished a task.

use crate::batch::TaskOutcome;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::Duration;

/// Final counts for one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Items the batch started with
    pub total: u64,

    /// Items that completed successfully
    pub succeeded: u64,

    /// Items that failed (generation, write, or unexpected)
    pub failed: u64,

    /// Wall time from batch start to the last completion
    pub duration: Duration,
}

impl BatchSummary {
    /// True if every item succeeded (vacuously true for an empty batch)
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Events published by the batch engine
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Informational log line (per-item progress messages)
    Log { message: String },

    /// One work item finished, successfully or not.
    /// Emitted exactly once per item, from the completing worker's thread.
    ItemCompleted { outcome: TaskOutcome },

    /// The batch reached its terminal state.
    /// Emitted exactly once per batch.
    BatchCompleted { summary: BatchSummary },
}

/// Receives batch events from worker threads
///
/// Invoked concurrently; implementations marshal to their own consumer
/// (queue, atomic counters + notify) rather than doing work inline.
pub trait EventSink: Send + Sync {
    /// Called for every event the engine publishes
    fn on_event(&self, event: BatchEvent);
}

/// Sink that forwards events into an unbounded channel
///
/// The sending half never blocks a worker; the receiving half is drained by
/// a single-threaded consumer (a UI loop, the CLI main thread, a test).
pub struct ChannelSink {
    sender: Sender<BatchEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its consumer drains
    pub fn new() -> (Self, Receiver<BatchEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn on_event(&self, event: BatchEvent) {
        // Receiver may be gone (consumer exited); events are then dropped
        let _ = self.sender.send(event);
    }
}

/// Sink that discards every event
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: BatchEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivery() {
        let (sink, rx) = ChannelSink::new();

        sink.on_event(BatchEvent::Log {
            message: "processing a.jpg".into(),
        });

        match rx.try_recv().unwrap() {
            BatchEvent::Log { message } => assert_eq!(message, "processing a.jpg"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        // Must not panic or block
        sink.on_event(BatchEvent::Log {
            message: "dropped".into(),
        });
    }

    #[test]
    fn test_summary_is_clean() {
        let summary = BatchSummary {
            total: 3,
            succeeded: 3,
            failed: 0,
            duration: Duration::from_secs(1),
        };
        assert!(summary.is_clean());

        let summary = BatchSummary {
            failed: 1,
            succeeded: 2,
            ..summary
        };
        assert!(!summary.is_clean());
    }
}
