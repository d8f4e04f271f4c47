//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use apptrack::config::{CompaniesFile, PatternsFile};
use apptrack::error::PredictError;
use apptrack::ml::{MessagePredictor, Prediction};
use apptrack::RawMessage;

/// Builder for `patterns.json` content.
#[derive(Default)]
pub struct PatternsBuilder {
    file: PatternsFile,
}

impl PatternsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add trigger patterns for a label.
    pub fn label(mut self, label: &str, patterns: &[&str]) -> Self {
        self.file
            .message_labels
            .entry(label.to_string())
            .or_default()
            .extend(patterns.iter().map(|p| p.to_string()));
        self
    }

    /// Add exclude patterns for a label.
    pub fn exclude(mut self, label: &str, patterns: &[&str]) -> Self {
        self.file
            .exclude_labels
            .entry(label.to_string())
            .or_default()
            .extend(patterns.iter().map(|p| p.to_string()));
        self
    }

    pub fn priority(mut self, labels: &[&str]) -> Self {
        self.file.label_priority = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn ignore(mut self, phrases: &[&str]) -> Self {
        self.file
            .ignore
            .extend(phrases.iter().map(|p| p.to_string()));
        self
    }

    pub fn build(self) -> PatternsFile {
        self.file
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.file).expect("Failed to serialize patterns")
    }
}

/// Builder for `companies.json` content.
#[derive(Default)]
pub struct CompaniesBuilder {
    file: CompaniesFile,
}

impl CompaniesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known(mut self, names: &[&str]) -> Self {
        self.file.known.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn domain(mut self, domain: &str, company: &str) -> Self {
        self.file
            .domain_to_company
            .insert(domain.to_string(), company.to_string());
        self
    }

    pub fn alias(mut self, key: &str, company: &str) -> Self {
        self.file
            .aliases
            .insert(key.to_string(), company.to_string());
        self
    }

    pub fn ats_domains(mut self, domains: &[&str]) -> Self {
        self.file
            .ats_domains
            .extend(domains.iter().map(|d| d.to_string()));
        self
    }

    pub fn headhunter_domains(mut self, domains: &[&str]) -> Self {
        self.file
            .headhunter_domains
            .extend(domains.iter().map(|d| d.to_string()));
        self
    }

    pub fn internal_recruiter_domains(mut self, domains: &[&str]) -> Self {
        self.file
            .internal_recruiter_domains
            .extend(domains.iter().map(|d| d.to_string()));
        self
    }

    pub fn subject_patterns(mut self, patterns: &[&str]) -> Self {
        self.file.subject_patterns = Some(patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn build(self) -> CompaniesFile {
        self.file
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.file).expect("Failed to serialize companies")
    }
}

/// Builder for `RawMessage` instances.
pub struct MessageBuilder {
    thread_id: String,
    message_id: Option<String>,
    subject: String,
    body: String,
    sender: String,
    timestamp: DateTime<Utc>,
    headers: BTreeMap<String, String>,
}

impl MessageBuilder {
    pub fn new(thread_id: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            message_id: None,
            subject: String::new(),
            body: String::new(),
            sender: "jobs@example.com".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
            headers: BTreeMap::new(),
        }
    }

    pub fn message_id(mut self, id: &str) -> Self {
        self.message_id = Some(id.to_string());
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn sender(mut self, sender: &str) -> Self {
        self.sender = sender.to_string();
        self
    }

    /// Days after the builder's base date.
    pub fn day(mut self, offset: i64) -> Self {
        self.timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
            + chrono::Duration::days(offset);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> RawMessage {
        let mut message = RawMessage::new(
            self.thread_id,
            self.subject,
            self.body,
            self.sender,
            self.timestamp,
        );
        if let Some(id) = self.message_id {
            message = message.with_message_id(id);
        }
        for (name, value) in self.headers {
            message = message.with_header(name, value);
        }
        message
    }
}

/// Stub model that always returns the same answer and counts its calls.
pub struct FixedPredictor {
    label: String,
    confidence: f32,
    calls: AtomicUsize,
}

impl FixedPredictor {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self {
            label: label.to_string(),
            confidence,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MessagePredictor for FixedPredictor {
    fn predict(&self, _subject: &str, _body: &str) -> Result<Prediction, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Prediction::new(self.label.clone(), self.confidence))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
