pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod label;
pub mod logging;
pub mod message;
pub mod ml;
pub mod pipeline;

pub use classifier::{Classifier, ClassifierSettings, RuleClassifier};
pub use config::{load_patterns, load_patterns_from_str, ConfigPaths, PatternConfig};
pub use error::{
    ApptrackError, ClassifyError, ConfigError, PipelineError, PredictError, Result, SinkError,
};
pub use extractor::{CompanyExtraction, CompanyExtractor, ExtractionSource};
pub use label::{ClassificationResult, ClassificationSource, Label};
pub use message::RawMessage;
pub use ml::{LinearPredictor, MessagePredictor, Prediction, UnavailablePredictor};
pub use pipeline::{BatchSummary, MessageSink, Pipeline, ProcessedMessage, ThreadStore};
