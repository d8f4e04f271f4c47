use tracing::{debug, info, warn};

use crate::label::{ClassificationSource, Label};

use super::runner::BatchSummary;

/// Events emitted by the batch runner, one per input item plus a final summary.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Persisted {
        index: usize,
        thread_id: String,
        label: Label,
        source: ClassificationSource,
    },
    Ignored {
        index: usize,
        thread_id: String,
    },
    Failed {
        index: usize,
        error: String,
    },
    Finished {
        summary: BatchSummary,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for tests and library callers that do not care.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Logs each event; the summary at `info`, failures at `warn`.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Persisted {
                index,
                thread_id,
                label,
                source,
            } => debug!(index, thread_id = %thread_id, %label, %source, "Message persisted"),
            ProgressEvent::Ignored { index, thread_id } => {
                debug!(index, thread_id = %thread_id, "Message ignored")
            }
            ProgressEvent::Failed { index, error } => {
                warn!(index, error = %error, "Message failed")
            }
            ProgressEvent::Finished { summary } => info!(
                total = summary.total,
                persisted = summary.persisted,
                ignored = summary.ignored,
                failed = summary.failed,
                "Batch finished"
            ),
        }
    }
}
