pub mod linear;
pub mod predictor;

pub use linear::LinearPredictor;
pub use predictor::{MessagePredictor, Prediction, UnavailablePredictor, UNKNOWN_LABEL};
