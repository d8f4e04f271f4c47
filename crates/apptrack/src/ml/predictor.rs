use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Label reported by [`UnavailablePredictor`].
pub const UNKNOWN_LABEL: &str = "unknown";

/// Raw model output. The label is whatever string the model was trained on;
/// the classifier decides whether it is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Probability of `label`, in [0, 1].
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// A trained text classifier consulted when no rule fires.
pub trait MessagePredictor: Send + Sync {
    fn predict(&self, subject: &str, body: &str) -> Result<Prediction, PredictError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Stands in when no model is available. Always answers with zero confidence,
/// which routes every rule miss to the low-confidence path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePredictor;

impl MessagePredictor for UnavailablePredictor {
    fn predict(&self, _subject: &str, _body: &str) -> Result<Prediction, PredictError> {
        Ok(Prediction::new(UNKNOWN_LABEL, 0.0))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
