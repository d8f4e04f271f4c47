use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PatternConfig;
use crate::message::{parse_sender, RawMessage};

use super::job::{extract_job_id, extract_job_title};

/// Company subject regexes used when `companies.json` does not supply its own.
/// Evaluated in order; each must capture `company`.
pub const DEFAULT_SUBJECT_PATTERNS: &[&str] = &[
    // "Your application to Acme", "Application with Acme for Engineer"
    r"\bapplication\s+(?:to|with|at)\s+(?P<company>[^\-–—|:!,()]+?)(?:\s+for\s+|\s*[\-–—|:!,(]|$)",
    // "... the Senior Engineer position at Acme"
    r"\b(?:position|role|opening|job|opportunity)\s+(?:at|with)\s+(?P<company>[^\-–—|:!,()]+?)(?:\s*[\-–—|:!,(]|$)",
    // "Thank you for applying to Acme!"
    r"\bthank you for (?:applying|your interest|your application)\s+(?:to|in|with|at)\s+(?P<company>[^\-–—|:!,()]+?)(?:\s+for\s+|\s*[\-–—|:!,(]|$)",
    // "Acme Job Application"
    r"^(?P<company>[^\-–—|:!,()]+?)\s+job application\b",
    // "Position — Acme — Data Engineer"
    r"^position\s*[\-–—]\s*(?P<company>[^\-–—|]+?)\s*[\-–—]",
    // "Interview with Acme"
    r"\b(?:interview|offer)\s+(?:with|from)\s+(?P<company>[^\-–—|:!,()]+?)(?:\s+for\s+|\s*[\-–—|:!,(]|$)",
];

static RE_COLON_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][\w&.\- ]+):").unwrap());
static RE_REPLY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:(?:re|fwd?|aw|wg)\s*(?:\[\d+\])?\s*:\s*)+").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A colon prefix starting with one of these is a greeting or notice, not a name.
const GENERIC_LEADING_WORDS: &[&str] = &[
    "action",
    "automatic",
    "congratulations",
    "important",
    "job",
    "new",
    "notice",
    "our",
    "out",
    "thank",
    "thanks",
    "urgent",
    "welcome",
    "your",
];

/// A colon prefix containing one of these describes the message, not the sender.
const MESSAGE_KIND_WORDS: &[&str] = &[
    "application",
    "applications",
    "confirmation",
    "interview",
    "invitation",
    "offer",
    "reminder",
    "status",
    "update",
];

/// Captures that are pronouns or filler, not names.
const FILLER_NAMES: &[&str] = &["a", "an", "my", "our", "the", "this", "your", "new", "job"];

const MAX_COMPANY_LEN: usize = 80;

/// Which company heuristic produced the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    ColonPrefix,
    KnownCompany,
    DomainMapping,
    SubjectRegex,
    Alias,
}

/// Company, title, and requisition ID pulled from one message. Empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyExtraction {
    pub company_name: String,
    pub job_title: String,
    pub job_id: String,
    pub extraction_source: Option<ExtractionSource>,
}

impl CompanyExtraction {
    pub fn has_company(&self) -> bool {
        !self.company_name.is_empty()
    }
}

struct ExtractionInput<'a> {
    subject: &'a str,
    local_part: Option<String>,
    sender_domain: String,
}

type HeuristicFn = fn(&CompanyExtractor, &ExtractionInput<'_>) -> Option<String>;

struct Heuristic {
    source: ExtractionSource,
    run: HeuristicFn,
}

/// First heuristic to return a name wins.
const COMPANY_HEURISTICS: &[Heuristic] = &[
    Heuristic {
        source: ExtractionSource::ColonPrefix,
        run: CompanyExtractor::colon_prefix,
    },
    Heuristic {
        source: ExtractionSource::KnownCompany,
        run: CompanyExtractor::known_company,
    },
    Heuristic {
        source: ExtractionSource::DomainMapping,
        run: CompanyExtractor::domain_mapping,
    },
    Heuristic {
        source: ExtractionSource::SubjectRegex,
        run: CompanyExtractor::subject_regex,
    },
    Heuristic {
        source: ExtractionSource::Alias,
        run: CompanyExtractor::alias,
    },
];

pub struct CompanyExtractor {
    patterns: Arc<PatternConfig>,
}

impl CompanyExtractor {
    pub fn new(patterns: Arc<PatternConfig>) -> Self {
        Self { patterns }
    }

    /// The order in which company heuristics are tried.
    pub fn heuristic_order() -> Vec<ExtractionSource> {
        COMPANY_HEURISTICS.iter().map(|h| h.source).collect()
    }

    pub fn extract(&self, message: &RawMessage) -> CompanyExtraction {
        let domain = (!message.sender_domain.is_empty()).then_some(message.sender_domain.as_str());
        self.parse_subject(&message.subject, &message.body, Some(&message.sender), domain)
    }

    /// Best-effort extraction. Never fails; missing parts come back empty.
    /// Every heuristic reads the subject and sender; `_body` is accepted for callers
    /// that hold the whole message.
    pub fn parse_subject(
        &self,
        subject: &str,
        _body: &str,
        sender: Option<&str>,
        sender_domain: Option<&str>,
    ) -> CompanyExtraction {
        let subject = RE_REPLY_PREFIX.replace(subject, "");
        let subject = subject.trim();

        let address = sender.and_then(parse_sender);
        let sender_domain = sender_domain
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .or_else(|| address.as_ref().map(|a| a.domain.clone()))
            .unwrap_or_default();

        let input = ExtractionInput {
            subject,
            local_part: address.map(|a| a.local_part),
            sender_domain,
        };

        let mut extraction = CompanyExtraction {
            job_title: extract_job_title(subject).unwrap_or_default(),
            job_id: extract_job_id(subject).unwrap_or_default(),
            ..Default::default()
        };

        for heuristic in COMPANY_HEURISTICS {
            if let Some(name) = (heuristic.run)(self, &input).and_then(|n| clean_company(&n)) {
                let name = self.canonicalize(name);
                debug!(
                    source = ?heuristic.source,
                    company = %name,
                    "Company extracted"
                );
                extraction.company_name = name;
                extraction.extraction_source = Some(heuristic.source);
                break;
            }
        }

        extraction
    }

    fn colon_prefix(&self, input: &ExtractionInput<'_>) -> Option<String> {
        let caps = RE_COLON_PREFIX.captures(input.subject)?;
        let prefix = caps.get(1)?.as_str().trim();
        let lowered = prefix.to_lowercase();
        let mut words = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());
        let first = words.next()?;
        if GENERIC_LEADING_WORDS.contains(&first)
            || std::iter::once(first)
                .chain(words)
                .any(|w| MESSAGE_KIND_WORDS.contains(&w))
        {
            return None;
        }
        Some(prefix.to_string())
    }

    fn known_company(&self, input: &ExtractionInput<'_>) -> Option<String> {
        let haystack = input.subject.to_lowercase();
        self.patterns
            .known_companies()
            .iter()
            .find(|company| contains_word(&haystack, &company.to_lowercase()))
            .cloned()
    }

    fn domain_mapping(&self, input: &ExtractionInput<'_>) -> Option<String> {
        if input.sender_domain.is_empty() {
            return None;
        }
        self.patterns
            .company_for_domain(&input.sender_domain)
            .map(str::to_string)
    }

    fn subject_regex(&self, input: &ExtractionInput<'_>) -> Option<String> {
        self.patterns.subject_patterns().iter().find_map(|regex| {
            let company = regex.captures(input.subject)?.name("company")?.as_str();
            clean_company(company)
        })
    }

    fn alias(&self, input: &ExtractionInput<'_>) -> Option<String> {
        let local = input.local_part.as_deref()?;
        if let Some(company) = self.patterns.alias(local) {
            return Some(company.to_string());
        }
        local
            .split(['.', '_', '-', '+'])
            .filter(|token| !token.is_empty())
            .find_map(|token| self.patterns.alias(token))
            .map(str::to_string)
    }

    /// Maps a name that is itself an alias key to its canonical form.
    fn canonicalize(&self, name: String) -> String {
        match self.patterns.alias(&name) {
            Some(canonical) => canonical.to_string(),
            None => name,
        }
    }
}

/// Trims, collapses whitespace, and rejects filler or implausible names.
fn clean_company(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '-' | '–' | '—' | '|'))
        .trim();
    let collapsed = RE_WHITESPACE.replace_all(trimmed, " ").to_string();

    if collapsed.is_empty() || collapsed.chars().count() > MAX_COMPANY_LEN {
        return None;
    }
    if FILLER_NAMES.contains(&collapsed.to_lowercase().as_str()) {
        return None;
    }
    Some(collapsed)
}

/// Substring match that does not start or end inside a word.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{CompaniesFile, PatternsFile};
    use std::collections::BTreeMap;

    fn extractor(companies: CompaniesFile) -> CompanyExtractor {
        let config = PatternConfig::build(PatternsFile::default(), companies, None).unwrap();
        CompanyExtractor::new(Arc::new(config))
    }

    fn default_extractor() -> CompanyExtractor {
        extractor(CompaniesFile::default())
    }

    #[test]
    fn test_heuristic_order() {
        assert_eq!(
            CompanyExtractor::heuristic_order(),
            vec![
                ExtractionSource::ColonPrefix,
                ExtractionSource::KnownCompany,
                ExtractionSource::DomainMapping,
                ExtractionSource::SubjectRegex,
                ExtractionSource::Alias,
            ]
        );
    }

    #[test]
    fn test_colon_prefix() {
        let result = default_extractor().parse_subject("Acme Corp: Application Received", "", None, None);
        assert_eq!(result.company_name, "Acme Corp");
        assert_eq!(result.extraction_source, Some(ExtractionSource::ColonPrefix));
    }

    #[test]
    fn test_colon_prefix_requires_capital() {
        let result = default_extractor().parse_subject("acme: hello", "", None, None);
        assert!(!result.has_company());
        assert_eq!(result.extraction_source, None);
    }

    #[test]
    fn test_generic_colon_prefix_skipped() {
        let result = default_extractor().parse_subject("Reminder: Application to Initech", "", None, None);
        assert_eq!(result.company_name, "Initech");
        assert_eq!(result.extraction_source, Some(ExtractionSource::SubjectRegex));
    }

    #[test]
    fn test_descriptive_colon_prefixes_skipped() {
        let cases = [
            "Interview Invitation: Data Engineer",
            "Job Offer: Analyst",
            "Your Application: Data Engineer",
            "Application Status Update: Analyst",
            "Out of Office: back Monday",
        ];
        for subject in cases {
            let result = default_extractor().parse_subject(subject, "", None, None);
            assert_ne!(
                result.extraction_source,
                Some(ExtractionSource::ColonPrefix),
                "{subject}"
            );
        }
    }

    #[test]
    fn test_reply_prefix_stripped() {
        let result = default_extractor().parse_subject("RE: Fwd: Acme: Next steps", "", None, None);
        assert_eq!(result.company_name, "Acme");
        assert_eq!(result.extraction_source, Some(ExtractionSource::ColonPrefix));
    }

    #[test]
    fn test_known_company_needs_word_boundary() {
        let ext = extractor(CompaniesFile {
            known: vec!["Meta".into()],
            ..Default::default()
        });
        assert!(!ext.parse_subject("Metadata engineer opening", "", None, None).has_company());
        assert_eq!(
            ext.parse_subject("Your interview at meta", "", None, None).company_name,
            "Meta"
        );
    }

    #[test]
    fn test_domain_mapping_from_sender() {
        let ext = extractor(CompaniesFile {
            domain_to_company: BTreeMap::from([("leidos.com".into(), "Leidos".into())]),
            ..Default::default()
        });
        let result = ext.parse_subject("We received your resume", "", Some("jobs@careers.leidos.com"), None);
        assert_eq!(result.company_name, "Leidos");
        assert_eq!(result.extraction_source, Some(ExtractionSource::DomainMapping));
    }

    #[test]
    fn test_subject_patterns() {
        let ext = default_extractor();
        let cases = [
            ("Your application to Initech for Senior Engineer", "Initech"),
            ("Thank you for applying to Globex!", "Globex"),
            ("Hooli Job Application", "Hooli"),
            ("Position — Umbrella Corp — Data Engineer", "Umbrella Corp"),
            ("Thank you for your interest in the Analyst position at Wayne Enterprises", "Wayne Enterprises"),
            ("Interview with Stark Industries", "Stark Industries"),
        ];
        for (subject, expected) in cases {
            let result = ext.parse_subject(subject, "", None, None);
            assert_eq!(result.company_name, expected, "subject: {subject}");
            assert_eq!(result.extraction_source, Some(ExtractionSource::SubjectRegex));
        }
    }

    #[test]
    fn test_filler_capture_rejected() {
        let result = default_extractor().parse_subject("Your Job Application", "", None, None);
        assert!(!result.has_company());
    }

    #[test]
    fn test_alias_by_token() {
        let ext = extractor(CompaniesFile {
            aliases: BTreeMap::from([("ngc".into(), "Northrop Grumman".into())]),
            ..Default::default()
        });
        let result = ext.parse_subject("Thanks for applying", "", Some("ngc.recruiting@myworkday.com"), None);
        assert_eq!(result.company_name, "Northrop Grumman");
        assert_eq!(result.extraction_source, Some(ExtractionSource::Alias));
    }

    #[test]
    fn test_extracted_name_canonicalized_by_alias() {
        let ext = extractor(CompaniesFile {
            aliases: BTreeMap::from([("BAH".into(), "Booz Allen Hamilton".into())]),
            ..Default::default()
        });
        let result = ext.parse_subject("BAH: Interview availability", "", None, None);
        assert_eq!(result.company_name, "Booz Allen Hamilton");
        assert_eq!(result.extraction_source, Some(ExtractionSource::ColonPrefix));
    }

    #[test]
    fn test_empty_input() {
        let result = default_extractor().parse_subject("", "", None, None);
        assert_eq!(result, CompanyExtraction::default());
    }

    #[test]
    fn test_clean_company() {
        assert_eq!(clean_company("  Acme   Corp!! "), Some("Acme Corp".to_string()));
        assert_eq!(clean_company(" - "), None);
        assert_eq!(clean_company("The"), None);
        assert_eq!(clean_company(&"x".repeat(81)), None);
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("join icf today", "icf"));
        assert!(contains_word("icf", "icf"));
        assert!(!contains_word("specifics", "icf"));
        assert!(!contains_word("anything", ""));
    }
}
