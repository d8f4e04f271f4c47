pub mod context;
pub mod progress;
pub mod runner;
pub mod sink;
pub mod source;

pub use context::ProcessedMessage;
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter, TracingProgress};
pub use runner::{BatchSummary, Pipeline};
pub use sink::{ApplicationStatus, JsonLinesSink, MessageSink, ThreadRecord, ThreadStore};
pub use source::read_json_lines;
