//! Merges rule output, model output, and sender signals into one result.
//!
//! Precedence, highest first:
//! 1. a rule hit, accepted with confidence 1.0 and never revisited;
//! 2. a model label at or above the threshold;
//! 3. `noise`, for anything below the threshold or any label the crate does not know.
//!
//! A model `head_hunter` sent from a company's own recruiting domain is then re-checked,
//! whatever its confidence: with ATS evidence it becomes `other`. Personal senders skip
//! that check.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::PatternConfig;
use crate::error::ClassifyError;
use crate::extractor::company::contains_word;
use crate::label::{ClassificationResult, Label};
use crate::message::{parse_sender, RawMessage, SenderAddress};
use crate::ml::{MessagePredictor, UNKNOWN_LABEL};

use super::rules::RuleClassifier;

pub const DEFAULT_THRESHOLD: f32 = 0.55;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    /// Minimum model confidence for its label to be accepted.
    pub threshold: f32,
    /// The mailbox owner's addresses. Mail from these is treated as personal.
    pub user_addresses: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            user_addresses: Vec::new(),
        }
    }
}

/// What the combinator knows about a sender beyond the text.
struct SenderSignals {
    address: Option<SenderAddress>,
    domain: String,
    list_unsubscribe: bool,
}

pub struct Classifier {
    rules: RuleClassifier,
    patterns: Arc<PatternConfig>,
    predictor: Arc<dyn MessagePredictor>,
    settings: ClassifierSettings,
}

impl Classifier {
    pub fn new(
        patterns: Arc<PatternConfig>,
        predictor: Arc<dyn MessagePredictor>,
        settings: ClassifierSettings,
    ) -> Self {
        let settings = ClassifierSettings {
            user_addresses: settings
                .user_addresses
                .iter()
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
            ..settings
        };
        Self {
            rules: RuleClassifier::new(Arc::clone(&patterns)),
            patterns,
            predictor,
            settings,
        }
    }

    pub fn rules(&self) -> &RuleClassifier {
        &self.rules
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    /// Classifies from text and the raw From value alone. Without headers the only
    /// ATS evidence is keywords and known ATS domains.
    pub fn predict_with_fallback(
        &self,
        subject: &str,
        body: &str,
        sender: &str,
    ) -> Result<ClassificationResult, ClassifyError> {
        let address = parse_sender(sender);
        let signals = SenderSignals {
            domain: address.as_ref().map(|a| a.domain.clone()).unwrap_or_default(),
            address,
            list_unsubscribe: false,
        };
        self.resolve(subject, body, &signals)
    }

    /// Classifies a full message, using its recorded sender domain and headers.
    pub fn classify(&self, message: &RawMessage) -> Result<ClassificationResult, ClassifyError> {
        let address = message.sender_address();
        let domain = if message.sender_domain.is_empty() {
            address.as_ref().map(|a| a.domain.clone()).unwrap_or_default()
        } else {
            message.sender_domain.clone()
        };
        let signals = SenderSignals {
            address,
            domain,
            list_unsubscribe: message.has_list_unsubscribe(),
        };
        self.resolve(&message.subject, &message.body, &signals)
    }

    fn resolve(
        &self,
        subject: &str,
        body: &str,
        signals: &SenderSignals,
    ) -> Result<ClassificationResult, ClassifyError> {
        let domain = (!signals.domain.is_empty()).then_some(signals.domain.as_str());
        if let Some(label) = self.rules.rule_label(subject, body, domain) {
            return Ok(ClassificationResult::rule(label));
        }

        let prediction = self.predictor.predict(subject, body)?;
        let predicted = match prediction.label.parse::<Label>() {
            Ok(label) => Some(label),
            Err(_) => {
                if prediction.label != UNKNOWN_LABEL {
                    warn!(
                        predictor = self.predictor.name(),
                        label = %prediction.label,
                        "Predictor returned an unknown label"
                    );
                }
                None
            }
        };
        let confidence = prediction.confidence;
        let personal = self.is_personal_sender(signals);

        let result = match predicted {
            Some(label) if confidence >= self.settings.threshold => {
                ClassificationResult::ml(label, confidence)
            }
            _ => {
                if personal {
                    debug!(domain = %signals.domain, confidence, "Low confidence from personal sender");
                } else {
                    debug!(
                        label = %prediction.label,
                        confidence,
                        threshold = self.settings.threshold,
                        "Low confidence prediction, falling back to noise"
                    );
                }
                ClassificationResult::overridden(Label::Noise, confidence)
            }
        };

        // Runs on the raw prediction, so it also applies below the threshold.
        if predicted == Some(Label::HeadHunter)
            && !personal
            && self.patterns.is_internal_recruiter_domain(&signals.domain)
        {
            if self.has_ats_evidence(body, signals) {
                debug!(domain = %signals.domain, "Internal recruiter mail with ATS evidence, demoting head_hunter");
                return Ok(ClassificationResult::overridden(Label::Other, confidence));
            }
            debug!(domain = %signals.domain, "Internal recruiter mail without ATS evidence, keeping head_hunter");
        }

        Ok(result)
    }

    fn is_personal_sender(&self, signals: &SenderSignals) -> bool {
        if !signals.domain.is_empty() && self.patterns.is_personal_domain(&signals.domain) {
            return true;
        }
        signals.address.as_ref().is_some_and(|a| {
            let full = format!("{}@{}", a.local_part, a.domain);
            self.settings.user_addresses.contains(&full)
        })
    }

    fn has_ats_evidence(&self, body: &str, signals: &SenderSignals) -> bool {
        if signals.list_unsubscribe || self.patterns.is_ats_domain(&signals.domain) {
            return true;
        }
        let body = body.to_lowercase();
        self.patterns.ats_keywords().iter().any(|keyword| {
            contains_word(&body, keyword)
                || signals
                    .domain
                    .split(['.', '-'])
                    .any(|label| label == keyword.as_str())
        })
    }
}
