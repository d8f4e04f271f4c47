//! Job title and requisition ID passes over the subject line.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

const TITLE_PATTERNS: &[&str] = &[
    // "Position — Acme — Data Engineer"
    r"^position\s*[\-–—]\s*[^\-–—|]+?\s*[\-–—]\s*(?P<title>[^|]+?)\s*$",
    // "Your application for the Data Analyst position at Acme"
    r"\bapplication for (?:the\s+)?(?P<title>[^\-–—|(),:]+?)(?:\s+(?:position|role)\b|\s+(?:at|with)\s+|\s*[\-–—|(),:]|$)",
    // "Role: Systems Engineer"
    r"\b(?:position|role|job title)\s*:\s*(?P<title>[^\-–—|(),]+?)(?:\s+(?:at|with)\s+|\s*[\-–—|(),]|$)",
    // "... the Cloud Architect position"
    r"\bthe\s+(?P<title>[^\-–—|(),:]+?)\s+(?:position|role|opening)\b",
];

const JOB_ID_PATTERNS: &[&str] = &[
    // "Job ID: R12345", "Req #4567", "Requisition Number 2024-123"
    r"\b(?:job|req(?:uisition)?|position)\s*(?:id|#|no\.?|number)\s*[:#]?\s*(?P<id>[A-Z0-9][\w-]*\d[\w-]*)",
    // "(R0123456)"
    r"\((?P<id>(?:R|JR|REQ)?-?\d{4,}[\w-]*)\)",
    // "JR12345"
    r"\b(?P<id>(?:JR|REQ|R)[-_]?\d{4,})\b",
];

static RE_TITLES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(TITLE_PATTERNS));
static RE_JOB_IDS: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(JOB_ID_PATTERNS));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| RegexBuilder::new(p).case_insensitive(true).build().unwrap())
        .collect()
}

pub fn extract_job_title(subject: &str) -> Option<String> {
    first_capture(&RE_TITLES, subject, "title")
}

pub fn extract_job_id(subject: &str) -> Option<String> {
    first_capture(&RE_JOB_IDS, subject, "id").map(|id| id.to_uppercase())
}

fn first_capture(patterns: &[Regex], subject: &str, group: &str) -> Option<String> {
    patterns.iter().find_map(|regex| {
        let value = regex.captures(subject)?.name(group)?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
