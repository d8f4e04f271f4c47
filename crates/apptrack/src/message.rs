//! The unit of work handed over by the mail-ingestion side.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One mail message with HTML already stripped from the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMessageRecord")]
pub struct RawMessage {
    /// Provider message ID, used for deduplication downstream.
    pub message_id: String,
    /// Conversation grouping key.
    pub thread_id: String,
    pub subject: String,
    pub body: String,
    /// The From header as received, e.g. `"Acme Careers <jobs@acme.com>"`.
    pub sender: String,
    /// Lowercased domain of the sender address; empty if the sender is unparseable.
    pub sender_domain: String,
    pub timestamp: DateTime<Utc>,
    /// Selected raw headers. Names keep their original case.
    pub headers: BTreeMap<String, String>,
}

/// Wire shape of a message; `sender_domain` is optional and derived when missing.
#[derive(Deserialize)]
struct RawMessageRecord {
    #[serde(default)]
    message_id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    sender: String,
    #[serde(default)]
    sender_domain: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl From<RawMessageRecord> for RawMessage {
    fn from(record: RawMessageRecord) -> Self {
        let sender_domain = record
            .sender_domain
            .map(|d| normalize_domain(&d))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| sender_domain(&record.sender));

        Self {
            message_id: record.message_id,
            thread_id: record.thread_id,
            subject: record.subject,
            body: record.body,
            sender: record.sender,
            sender_domain,
            timestamp: record.timestamp,
            headers: record.headers,
        }
    }
}

impl RawMessage {
    pub fn new(
        thread_id: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let sender = sender.into();
        let thread_id = thread_id.into();
        Self {
            message_id: thread_id.clone(),
            sender_domain: sender_domain(&sender),
            thread_id,
            subject: subject.into(),
            body: body.into(),
            sender,
            timestamp,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Bulk senders, including most ATS platforms, set `List-Unsubscribe`.
    pub fn has_list_unsubscribe(&self) -> bool {
        self.header("List-Unsubscribe")
            .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn sender_address(&self) -> Option<SenderAddress> {
        parse_sender(&self.sender)
    }
}

/// The address part of a From header, split at the `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderAddress {
    /// Lowercased part before the `@`.
    pub local_part: String,
    /// Lowercased part after the `@`.
    pub domain: String,
}

/// Parses `"Display Name <user@host>"` or a bare `user@host`.
pub fn parse_sender(sender: &str) -> Option<SenderAddress> {
    let sender = sender.trim();
    let address = match (sender.rfind('<'), sender.rfind('>')) {
        (Some(open), Some(close)) if open < close => &sender[open + 1..close],
        _ => sender,
    };
    let address = address.trim().trim_matches('"');

    let (local, domain) = address.rsplit_once('@')?;
    let local = local.trim().to_lowercase();
    let domain = normalize_domain(domain);
    if local.is_empty() || domain.is_empty() || domain.contains(char::is_whitespace) {
        return None;
    }

    Some(SenderAddress {
        local_part: local,
        domain,
    })
}

/// Domain of the sender, or an empty string when there is none.
pub fn sender_domain(sender: &str) -> String {
    parse_sender(sender).map(|a| a.domain).unwrap_or_default()
}

pub(crate) fn normalize_domain(domain: &str) -> String {
    domain
        .trim()
        .trim_start_matches('@')
        .trim_end_matches('.')
        .to_lowercase()
}
