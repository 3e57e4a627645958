//! metabatch - Concurrent Image Metadata Tagger
//!
//! Batch-processes a folder of images: each file is sent to a metadata
//! generation service, and the result is persisted beside the image. The
//! interesting part is the execution engine - a bounded worker pool with
//! per-item failure isolation and a thread-safe event bridge, so a
//! single-threaded consumer (a UI loop, the CLI) never has to poll from a
//! worker thread.
//!
//! # Features
//!
//! - **Bounded parallelism**: a fixed worker pool caps concurrent service
//!   calls and open file handles; excess work queues FIFO.
//!
//! - **Failure isolation**: a failing (or panicking) item becomes a
//!   recorded outcome, never an aborted batch.
//!
//! - **Exactly-once completion**: the last outcome triggers the batch
//!   completion event via an atomic counter, with no monitor thread.
//!
//! - **Pluggable collaborators**: metadata generation and persistence sit
//!   behind traits; the shipped CLI wires an HTTP generator and a JSON
//!   sidecar writer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       BatchCoordinator                           │
//! │   enumerate → submit one task per item → aggregate outcomes      │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │ FIFO queue (crossbeam)
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!  ┌─────▼─────┐         ┌─────▼─────┐         ┌─────▼─────┐
//!  │ Worker 1  │         │ Worker 2  │   ...   │ Worker N  │
//!  │ generate  │         │ generate  │         │ generate  │
//!  │ write     │         │ write     │         │ write     │
//!  └─────┬─────┘         └─────┬─────┘         └─────┬─────┘
//!        │                     │                     │
//!        └─────────────────────┼─────────────────────┘
//!                              ▼
//!                 ┌─────────────────────────┐
//!                 │       EventSink          │
//!                 │ Log / ItemCompleted /    │
//!                 │ BatchCompleted           │
//!                 └────────────┬────────────┘
//!                              │ unbounded channel
//!                              ▼
//!                 ┌─────────────────────────┐
//!                 │ single-threaded consumer │
//!                 │ (CLI main thread, UI)    │
//!                 └─────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use metabatch::{BatchConfig, BatchCoordinator, ChannelSink};
//! use metabatch::services::{HttpGenerator, SidecarWriter};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let (sink, events) = ChannelSink::new();
//! let generator = HttpGenerator::new("http://localhost:8702/describe", Duration::from_secs(30))?;
//!
//! let coordinator = BatchCoordinator::new(
//!     BatchConfig::default(),
//!     Arc::new(generator),
//!     Arc::new(SidecarWriter::new()),
//!     Arc::new(sink),
//! )?;
//!
//! let handle = coordinator.run_batch(std::path::Path::new("/photos"))?;
//!
//! // Drain events on this thread; workers never block on the consumer
//! for event in events.iter() {
//!     let done = matches!(event, metabatch::BatchEvent::BatchCompleted { .. });
//!     println!("{:?}", event);
//!     if done {
//!         break;
//!     }
//! }
//! assert!(handle.is_done());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod events;
pub mod metadata;
pub mod progress;
pub mod services;

pub use batch::{
    enumerate, BatchCoordinator, BatchHandle, BatchPhase, ExtensionFilter, TaskOutcome, WorkItem,
    WorkerPool,
};
pub use config::{BatchConfig, CliArgs};
pub use error::{
    BatchError, ConfigError, EnumerationError, FailureReason, PoolError, Result,
};
pub use events::{BatchEvent, BatchSummary, ChannelSink, EventSink, NullSink};
pub use metadata::{Metadata, MetadataGenerator, MetadataWriter, ServiceError};
