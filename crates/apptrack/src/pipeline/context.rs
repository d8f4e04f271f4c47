use crate::extractor::CompanyExtraction;
use crate::label::ClassificationResult;
use crate::message::RawMessage;

/// Everything the pipeline learned about one message; what a sink receives.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMessage {
    pub message: RawMessage,
    pub classification: ClassificationResult,
    pub extraction: CompanyExtraction,
}

impl ProcessedMessage {
    pub fn new(
        message: RawMessage,
        classification: ClassificationResult,
        extraction: CompanyExtraction,
    ) -> Self {
        Self {
            message,
            classification,
            extraction,
        }
    }
}
