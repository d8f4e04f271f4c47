use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApptrackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Predictor error: {0}")]
    Predict(#[from] PredictError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON in '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown label '{label}' in {file}")]
    UnknownLabel { label: String, file: String },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("No model loaded")]
    Unavailable,

    #[error("Failed to read model file '{path}': {source}")]
    ModelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model JSON: {0}")]
    ModelParse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Predictor failed: {0}")]
    Predictor(#[from] PredictError),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Record rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifyError),

    #[error("Persistence failed: {0}")]
    Persist(#[from] SinkError),

    #[error("Unreadable input record at line {line}: {reason}")]
    Source { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, ApptrackError>;
