//! Message labels and the result type produced by classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of labels a message can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    JobApplication,
    InterviewInvite,
    Rejection,
    Offer,
    Referral,
    HeadHunter,
    Noise,
    FollowUp,
    Response,
    Other,
    Ignore,
}

impl Label {
    /// Every label, in declaration order.
    pub const ALL: [Label; 11] = [
        Label::JobApplication,
        Label::InterviewInvite,
        Label::Rejection,
        Label::Offer,
        Label::Referral,
        Label::HeadHunter,
        Label::Noise,
        Label::FollowUp,
        Label::Response,
        Label::Other,
        Label::Ignore,
    ];

    /// Rule evaluation order used when `patterns.json` does not set `label_priority`.
    /// Most consequential first.
    pub const DEFAULT_PRIORITY: [Label; 7] = [
        Label::Offer,
        Label::Rejection,
        Label::InterviewInvite,
        Label::JobApplication,
        Label::Referral,
        Label::HeadHunter,
        Label::Noise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::JobApplication => "job_application",
            Label::InterviewInvite => "interview_invite",
            Label::Rejection => "rejection",
            Label::Offer => "offer",
            Label::Referral => "referral",
            Label::HeadHunter => "head_hunter",
            Label::Noise => "noise",
            Label::FollowUp => "follow_up",
            Label::Response => "response",
            Label::Other => "other",
            Label::Ignore => "ignore",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown label '{}'", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Label::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == normalized)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Which stage decided the final label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Rule,
    Ml,
    Override,
}

impl fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClassificationSource::Rule => "rule",
            ClassificationSource::Ml => "ml",
            ClassificationSource::Override => "override",
        };
        f.write_str(s)
    }
}

/// Final label for one message.
///
/// Built only through the constructors, so a rule result always carries
/// confidence 1.0 and `ignore` always agrees with the label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    label: Label,
    confidence: f32,
    source: ClassificationSource,
    ignore: bool,
}

impl ClassificationResult {
    pub fn rule(label: Label) -> Self {
        Self::build(label, 1.0, ClassificationSource::Rule)
    }

    pub fn ml(label: Label, confidence: f32) -> Self {
        Self::build(label, confidence, ClassificationSource::Ml)
    }

    pub fn overridden(label: Label, confidence: f32) -> Self {
        Self::build(label, confidence, ClassificationSource::Override)
    }

    fn build(label: Label, confidence: f32, source: ClassificationSource) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            label,
            confidence,
            source,
            ignore: label == Label::Ignore,
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn source(&self) -> ClassificationSource {
        self.source
    }

    /// Whether the message should be dropped before extraction and persistence.
    pub fn ignore(&self) -> bool {
        self.ignore
    }
}
