use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::classifier::{Classifier, ClassifierSettings};
use crate::config::PatternConfig;
use crate::error::PipelineError;
use crate::extractor::CompanyExtractor;
use crate::label::{ClassificationSource, Label};
use crate::message::RawMessage;
use crate::ml::MessagePredictor;

use super::context::ProcessedMessage;
use super::progress::{ProgressEvent, ProgressReporter};
use super::sink::MessageSink;

/// Tallies for one batch run. `by_label` and `by_source` count every message that was
/// classified, ignored ones included.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub persisted: usize,
    pub ignored: usize,
    pub failed: usize,
    pub by_label: BTreeMap<Label, usize>,
    pub by_source: BTreeMap<ClassificationSource, usize>,
}

pub struct Pipeline {
    classifier: Classifier,
    extractor: CompanyExtractor,
}

impl Pipeline {
    /// Production constructor: both stages share one pattern table.
    pub fn from_config(
        patterns: Arc<PatternConfig>,
        predictor: Arc<dyn MessagePredictor>,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&patterns), predictor, settings),
            extractor: CompanyExtractor::new(patterns),
        }
    }

    pub fn new(classifier: Classifier, extractor: CompanyExtractor) -> Self {
        Self {
            classifier,
            extractor,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn extractor(&self) -> &CompanyExtractor {
        &self.extractor
    }

    /// Classifies and extracts one message. Extraction runs whatever the label.
    pub fn process(&self, message: &RawMessage) -> Result<ProcessedMessage, PipelineError> {
        let _span = info_span!("message",
            thread_id = %message.thread_id,
            message_id = %message.message_id,
        )
        .entered();

        let classification = {
            let _step = info_span!("classify").entered();
            self.classifier.classify(message)?
        };

        let extraction = {
            let _step = info_span!("extract").entered();
            self.extractor.extract(message)
        };

        debug!(
            label = %classification.label(),
            source = %classification.source(),
            confidence = classification.confidence(),
            company = %extraction.company_name,
            "Message processed"
        );

        Ok(ProcessedMessage::new(
            message.clone(),
            classification,
            extraction,
        ))
    }

    /// Processes every item and hands non-ignored results to `sink`. A failure on one
    /// item is logged and counted; the batch always runs to the end. The sink is not
    /// flushed here.
    pub fn run_batch<I>(
        &self,
        messages: I,
        sink: &mut dyn MessageSink,
        progress: &dyn ProgressReporter,
    ) -> BatchSummary
    where
        I: IntoIterator<Item = Result<RawMessage, PipelineError>>,
    {
        let mut summary = BatchSummary::default();

        for (index, item) in messages.into_iter().enumerate() {
            summary.total += 1;

            match item.and_then(|message| self.run_one(&message, &mut *sink, &mut summary)) {
                Ok(Outcome::Persisted(processed)) => {
                    summary.persisted += 1;
                    progress.report(ProgressEvent::Persisted {
                        index,
                        label: processed.classification.label(),
                        source: processed.classification.source(),
                        thread_id: processed.message.thread_id,
                    });
                }
                Ok(Outcome::Ignored { thread_id }) => {
                    summary.ignored += 1;
                    progress.report(ProgressEvent::Ignored { index, thread_id });
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(index, error = %e, "Skipping message");
                    progress.report(ProgressEvent::Failed {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        progress.report(ProgressEvent::Finished {
            summary: summary.clone(),
        });
        summary
    }

    fn run_one(
        &self,
        message: &RawMessage,
        sink: &mut dyn MessageSink,
        summary: &mut BatchSummary,
    ) -> Result<Outcome, PipelineError> {
        let processed = self.process(message)?;
        let classification = processed.classification;
        *summary.by_label.entry(classification.label()).or_insert(0) += 1;
        *summary.by_source.entry(classification.source()).or_insert(0) += 1;

        if classification.ignore() {
            return Ok(Outcome::Ignored {
                thread_id: message.thread_id.clone(),
            });
        }

        let _step = info_span!("persist", thread_id = %message.thread_id).entered();
        sink.persist(&processed)?;
        Ok(Outcome::Persisted(processed))
    }
}

enum Outcome {
    Persisted(ProcessedMessage),
    Ignored { thread_id: String },
}
