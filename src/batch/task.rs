//! The unit of work: one image, generate then write
//!
//! Each task runs the two collaborator calls in sequence and reduces
//! whatever happens - including a panic inside a collaborator - to a
//! `TaskOutcome`. Nothing escapes this boundary, so one bad image can
//! never take down sibling work.

use crate::error::FailureReason;
use crate::events::{BatchEvent, EventSink};
use crate::metadata::{MetadataGenerator, MetadataWriter};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One file queued for processing
///
/// Immutable once enumerated; consumed exactly once by a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Absolute path to the source file
    pub path: PathBuf,
}

impl WorkItem {
    /// Create a work item for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name for log messages (falls back to the full path)
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Recorded result of processing one work item
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Metadata was generated and written
    Success { path: PathBuf },

    /// Generation or write failed, or a fault was captured
    Failure {
        path: PathBuf,
        reason: FailureReason,
    },
}

impl TaskOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success { .. })
    }

    /// Returns the path associated with this outcome
    pub fn path(&self) -> &Path {
        match self {
            TaskOutcome::Success { path } => path,
            TaskOutcome::Failure { path, .. } => path,
        }
    }

    /// Returns the failure reason, if any
    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            TaskOutcome::Success { .. } => None,
            TaskOutcome::Failure { reason, .. } => Some(reason),
        }
    }
}

/// Process a single work item
///
/// Invokes the generation collaborator, then the writing collaborator, and
/// converts every failure mode into a `TaskOutcome`. Safe to run many
/// instances concurrently; holds no shared mutable state.
pub fn execute(
    item: &WorkItem,
    generator: &dyn MetadataGenerator,
    writer: &dyn MetadataWriter,
    sink: &dyn EventSink,
) -> TaskOutcome {
    let name = item.file_name();

    sink.on_event(BatchEvent::Log {
        message: format!("processing {}", name),
    });

    let outcome = run_collaborators(item, generator, writer);

    match &outcome {
        TaskOutcome::Success { .. } => {
            debug!(path = %item.path.display(), "metadata written");
            sink.on_event(BatchEvent::Log {
                message: format!("wrote metadata for {}", name),
            });
        }
        TaskOutcome::Failure { reason, .. } => {
            warn!(path = %item.path.display(), error = %reason, "item failed");
            sink.on_event(BatchEvent::Log {
                message: format!("error processing {}: {}", item.path.display(), reason),
            });
        }
    }

    outcome
}

/// Run generate-then-write, capturing panics at the boundary
fn run_collaborators(
    item: &WorkItem,
    generator: &dyn MetadataGenerator,
    writer: &dyn MetadataWriter,
) -> TaskOutcome {
    let path = &item.path;

    let metadata = match catch_unwind(AssertUnwindSafe(|| generator.generate(path))) {
        Ok(Ok(metadata)) => metadata,
        Ok(Err(e)) => {
            return TaskOutcome::Failure {
                path: path.clone(),
                reason: FailureReason::Generate(e.to_string()),
            };
        }
        Err(payload) => {
            return TaskOutcome::Failure {
                path: path.clone(),
                reason: FailureReason::Unexpected(panic_message(payload)),
            };
        }
    };

    match catch_unwind(AssertUnwindSafe(|| writer.write(path, &metadata))) {
        Ok(Ok(())) => TaskOutcome::Success { path: path.clone() },
        Ok(Err(e)) => TaskOutcome::Failure {
            path: path.clone(),
            reason: FailureReason::Write(e.to_string()),
        },
        Err(payload) => TaskOutcome::Failure {
            path: path.clone(),
            reason: FailureReason::Unexpected(panic_message(payload)),
        },
    }
}

/// Best-effort extraction of a panic payload message
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
