//! Concurrent batch-execution engine
//!
//! This module implements the core pipeline: enumerate eligible files,
//! fan tasks out over a fixed worker pool, and aggregate outcomes into a
//! single completion signal.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────────┐
//!                    │     BatchCoordinator      │
//!                    │  - enumerate work items   │
//!                    │  - one task per item      │
//!                    │  - atomic completion      │
//!                    └───────────┬──────────────┘
//!                                │ submit (FIFO)
//!       ┌────────────────────────┼────────────────────────┐
//!       │                        │                        │
//! ┌─────▼─────┐            ┌─────▼─────┐            ┌─────▼─────┐
//! │  Worker 1 │            │  Worker 2 │            │  Worker N │
//! │ generate  │            │ generate  │            │ generate  │
//! │ write     │            │ write     │            │ write     │
//! └─────┬─────┘            └─────┬─────┘            └─────┬─────┘
//!       │                        │                        │
//!       └────────────────────────┼────────────────────────┘
//!                                ▼
//!                    ┌──────────────────────────┐
//!                    │        EventSink          │
//!                    │  per-item + batch events  │
//!                    │  drained by the consumer  │
//!                    │  on its own thread        │
//!                    └──────────────────────────┘
//! ```

pub mod coordinator;
pub mod enumerate;
pub mod pool;
pub mod task;

pub use coordinator::{BatchCoordinator, BatchHandle, BatchPhase, BatchState};
pub use enumerate::{enumerate, ExtensionFilter};
pub use pool::WorkerPool;
pub use task::{TaskOutcome, WorkItem};
