pub mod combinator;
pub mod rules;

pub use combinator::{Classifier, ClassifierSettings, DEFAULT_THRESHOLD};
pub use rules::RuleClassifier;
