//! Where processed messages go: per-thread aggregates or a JSON lines stream.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::SinkError;
use crate::extractor::ExtractionSource;
use crate::label::{ClassificationSource, Label};

use super::context::ProcessedMessage;

/// The persistence side of the pipeline. Only non-ignored messages reach it.
pub trait MessageSink {
    fn persist(&mut self, processed: &ProcessedMessage) -> Result<(), SinkError>;

    /// Pushes buffered output out. Called once after a batch.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<A: MessageSink, B: MessageSink> MessageSink for (A, B) {
    fn persist(&mut self, processed: &ProcessedMessage) -> Result<(), SinkError> {
        self.0.persist(processed)?;
        self.1.persist(processed)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.0.flush()?;
        self.1.flush()
    }
}

/// Where an application stands, judged from every label seen on its thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Offered,
    Rejected,
    Interviewing,
    Applied,
    Referred,
    Recruiter,
    Unknown,
}

impl ApplicationStatus {
    /// Most advanced stage wins, so a late rejection beats an earlier interview.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a Label>) -> Self {
        labels
            .into_iter()
            .map(|label| match label {
                Label::Offer => ApplicationStatus::Offered,
                Label::Rejection => ApplicationStatus::Rejected,
                Label::InterviewInvite => ApplicationStatus::Interviewing,
                Label::JobApplication => ApplicationStatus::Applied,
                Label::Referral => ApplicationStatus::Referred,
                Label::HeadHunter => ApplicationStatus::Recruiter,
                _ => ApplicationStatus::Unknown,
            })
            .min_by_key(|status| status.rank())
            .unwrap_or(ApplicationStatus::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Referred => "referred",
            ApplicationStatus::Recruiter => "recruiter",
            ApplicationStatus::Unknown => "unknown",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ApplicationStatus::Offered => 0,
            ApplicationStatus::Rejected => 1,
            ApplicationStatus::Interviewing => 2,
            ApplicationStatus::Applied => 3,
            ApplicationStatus::Referred => 4,
            ApplicationStatus::Recruiter => 5,
            ApplicationStatus::Unknown => 6,
        }
    }
}

/// Aggregate for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadRecord {
    pub thread_id: String,
    /// First non-empty company seen on the thread.
    pub company: String,
    pub job_title: String,
    pub job_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Label of each stored message, in arrival order.
    pub labels: Vec<Label>,
    pub message_ids: Vec<String>,
    pub status: ApplicationStatus,
}

impl ThreadRecord {
    fn new(processed: &ProcessedMessage) -> Self {
        let message = &processed.message;
        Self {
            thread_id: message.thread_id.clone(),
            company: String::new(),
            job_title: String::new(),
            job_id: String::new(),
            first_seen: message.timestamp,
            last_seen: message.timestamp,
            labels: Vec::new(),
            message_ids: Vec::new(),
            status: ApplicationStatus::Unknown,
        }
    }

    fn absorb(&mut self, processed: &ProcessedMessage) {
        let message = &processed.message;
        let extraction = &processed.extraction;

        fill_if_empty(&mut self.company, &extraction.company_name);
        fill_if_empty(&mut self.job_title, &extraction.job_title);
        fill_if_empty(&mut self.job_id, &extraction.job_id);

        self.first_seen = self.first_seen.min(message.timestamp);
        self.last_seen = self.last_seen.max(message.timestamp);
        self.labels.push(processed.classification.label());
        self.message_ids.push(message.message_id.clone());
        self.status = ApplicationStatus::from_labels(&self.labels);
    }
}

fn fill_if_empty(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}

/// In-memory per-thread upsert. A message ID is stored at most once.
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: HashMap<String, ThreadRecord>,
    seen: HashSet<String>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, thread_id: &str) -> Option<&ThreadRecord> {
        self.threads.get(thread_id)
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Threads ordered by most recent activity first.
    pub fn records(&self) -> Vec<&ThreadRecord> {
        let mut records: Vec<&ThreadRecord> = self.threads.values().collect();
        records.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        records
    }

    pub fn status_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in self.threads.values() {
            *counts.entry(record.status.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl MessageSink for ThreadStore {
    fn persist(&mut self, processed: &ProcessedMessage) -> Result<(), SinkError> {
        let message = &processed.message;
        if message.thread_id.trim().is_empty() {
            return Err(SinkError::Rejected(format!(
                "message '{}' has no thread_id",
                message.message_id
            )));
        }
        if !message.message_id.is_empty() && !self.seen.insert(message.message_id.clone()) {
            debug!(message_id = %message.message_id, "Duplicate message skipped");
            return Ok(());
        }

        self.threads
            .entry(message.thread_id.clone())
            .or_insert_with(|| ThreadRecord::new(processed))
            .absorb(processed);
        Ok(())
    }
}

/// Flat, serialisable view of one processed message.
#[derive(Debug, Serialize)]
struct MessageLine<'a> {
    message_id: &'a str,
    thread_id: &'a str,
    timestamp: DateTime<Utc>,
    sender: &'a str,
    sender_domain: &'a str,
    subject: &'a str,
    label: Label,
    confidence: f32,
    source: ClassificationSource,
    company: &'a str,
    job_title: &'a str,
    job_id: &'a str,
    extraction_source: Option<ExtractionSource>,
}

impl<'a> From<&'a ProcessedMessage> for MessageLine<'a> {
    fn from(processed: &'a ProcessedMessage) -> Self {
        let message = &processed.message;
        let extraction = &processed.extraction;
        Self {
            message_id: &message.message_id,
            thread_id: &message.thread_id,
            timestamp: message.timestamp,
            sender: &message.sender,
            sender_domain: &message.sender_domain,
            subject: &message.subject,
            label: processed.classification.label(),
            confidence: processed.classification.confidence(),
            source: processed.classification.source(),
            company: &extraction.company_name,
            job_title: &extraction.job_title,
            job_id: &extraction.job_id,
            extraction_source: extraction.extraction_source,
        }
    }
}

/// Writes one JSON object per persisted message.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for JsonLinesSink<W> {
    fn persist(&mut self, processed: &ProcessedMessage) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &MessageLine::from(processed))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::CompanyExtraction;
    use crate::label::ClassificationResult;
    use crate::message::RawMessage;
    use chrono::TimeZone;

    fn processed(thread: &str, id: &str, day: u32, label: Label, company: &str) -> ProcessedMessage {
        let ts = Utc.with_ymd_and_hms(2024, 4, day, 10, 0, 0).unwrap();
        ProcessedMessage::new(
            RawMessage::new(thread, "Subject", "", "jobs@acme.com", ts).with_message_id(id),
            ClassificationResult::rule(label),
            CompanyExtraction {
                company_name: company.to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_status_precedence() {
        let cases = [
            (vec![Label::JobApplication], ApplicationStatus::Applied),
            (
                vec![Label::JobApplication, Label::InterviewInvite],
                ApplicationStatus::Interviewing,
            ),
            (
                vec![Label::InterviewInvite, Label::Rejection],
                ApplicationStatus::Rejected,
            ),
            (vec![Label::Rejection, Label::Offer], ApplicationStatus::Offered),
            (vec![Label::Noise], ApplicationStatus::Unknown),
            (vec![], ApplicationStatus::Unknown),
        ];
        for (labels, expected) in cases {
            assert_eq!(ApplicationStatus::from_labels(&labels), expected, "{labels:?}");
        }
    }

    #[test]
    fn test_thread_store_upserts_and_dedups() {
        let mut store = ThreadStore::new();
        store
            .persist(&processed("t1", "m1", 2, Label::JobApplication, ""))
            .unwrap();
        store
            .persist(&processed("t1", "m2", 5, Label::InterviewInvite, "Acme"))
            .unwrap();
        store
            .persist(&processed("t1", "m2", 5, Label::InterviewInvite, "Acme"))
            .unwrap();
        store
            .persist(&processed("t2", "m3", 1, Label::Rejection, "Initech"))
            .unwrap();

        assert_eq!(store.len(), 2);
        let t1 = store.get("t1").unwrap();
        assert_eq!(t1.company, "Acme");
        assert_eq!(t1.labels, vec![Label::JobApplication, Label::InterviewInvite]);
        assert_eq!(t1.status, ApplicationStatus::Interviewing);
        assert!(t1.first_seen < t1.last_seen);

        let order: Vec<&str> = store.records().iter().map(|r| r.thread_id.as_str()).collect();
        assert_eq!(order, vec!["t1", "t2"]);
        assert_eq!(store.status_counts().get("rejected"), Some(&1));
    }

    #[test]
    fn test_thread_store_rejects_missing_thread() {
        let mut store = ThreadStore::new();
        let err = store
            .persist(&processed("", "m1", 1, Label::Offer, ""))
            .unwrap_err();
        assert!(matches!(err, SinkError::Rejected(_)));
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.persist(&processed("t1", "m1", 3, Label::Offer, "Acme"))
            .unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.written(), 1);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["label"], "offer");
        assert_eq!(value["source"], "rule");
        assert_eq!(value["company"], "Acme");
        assert_eq!(value["confidence"], 1.0);
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_tuple_sink_feeds_both() {
        let mut sink = (ThreadStore::new(), JsonLinesSink::new(Vec::new()));
        sink.persist(&processed("t1", "m1", 3, Label::Offer, "Acme"))
            .unwrap();
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.1.written(), 1);
    }
}
