//! Compiled, read-only pattern tables shared by the classifier and the extractor.

use std::collections::{HashMap, HashSet};

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::config::schema::{CompaniesFile, DomainMapFile, PatternsFile};
use crate::error::ConfigError;
use crate::extractor::company::DEFAULT_SUBJECT_PATTERNS;
use crate::label::Label;
use crate::message::normalize_domain;

/// One label family: its trigger patterns and its vetoes.
#[derive(Debug, Clone)]
pub struct LabelRule {
    pub label: Label,
    pub patterns: Vec<Regex>,
    pub excludes: Vec<Regex>,
    /// Sender domains that trigger the label without a pattern hit.
    pub sender_domains: HashSet<String>,
}

/// A pattern that failed to compile and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternWarning {
    /// Label name or table the pattern belonged to.
    pub owner: String,
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PatternConfig {
    label_rules: Vec<LabelRule>,
    ignore_phrases: Vec<String>,
    /// Longest first, so a longer name shadows its own prefixes.
    known_companies: Vec<String>,
    domain_to_company: HashMap<String, String>,
    aliases: HashMap<String, String>,
    ats_domains: HashSet<String>,
    headhunter_domains: HashSet<String>,
    personal_domains: HashSet<String>,
    internal_recruiter_domains: HashSet<String>,
    ats_keywords: Vec<String>,
    subject_patterns: Vec<Regex>,
    warnings: Vec<PatternWarning>,
}

impl PatternConfig {
    /// Compiles all tables. Bad regexes are skipped and recorded; unknown labels are errors.
    pub fn build(
        patterns: PatternsFile,
        companies: CompaniesFile,
        legacy_domains: Option<DomainMapFile>,
    ) -> Result<Self, ConfigError> {
        let mut warnings = Vec::new();

        let priority = resolve_priority(&patterns)?;
        let headhunter_domains = domain_set(&companies.headhunter_domains);

        let mut label_rules = Vec::with_capacity(priority.len());
        for label in priority {
            let patterns_for_label = patterns
                .message_labels
                .get(label.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let excludes_for_label = patterns
                .exclude_labels
                .get(label.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();

            let compiled = compile_all(label.as_str(), patterns_for_label, &mut warnings);
            let excludes = compile_all(
                &format!("{} (exclude)", label),
                excludes_for_label,
                &mut warnings,
            );
            let sender_domains = if label == Label::HeadHunter {
                headhunter_domains.clone()
            } else {
                HashSet::new()
            };

            label_rules.push(LabelRule {
                label,
                patterns: compiled,
                excludes,
                sender_domains,
            });
        }

        for (name, list) in &patterns.exclude_labels {
            parse_label(name, "patterns.json exclude_labels")?;
            if !patterns.message_labels.contains_key(name) {
                debug!(label = %name, count = list.len(), "Exclude list for label without patterns");
            }
        }

        let ignore_phrases = patterns
            .ignore
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let mut known_companies: Vec<String> = companies
            .known
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        known_companies.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        known_companies.dedup();

        let mut domain_to_company = HashMap::new();
        for (domain, company) in legacy_domains
            .iter()
            .flatten()
            .chain(companies.domain_to_company.iter())
        {
            domain_to_company.insert(normalize_domain(domain), company.trim().to_string());
        }

        let aliases = companies
            .aliases
            .iter()
            .map(|(key, company)| (key.trim().to_lowercase(), company.trim().to_string()))
            .collect();

        let subject_patterns = match &companies.subject_patterns {
            Some(custom) => compile_subject_patterns(custom.iter().map(String::as_str), &mut warnings),
            None => compile_subject_patterns(DEFAULT_SUBJECT_PATTERNS.iter().copied(), &mut warnings),
        };

        for warning in &warnings {
            warn!(
                owner = %warning.owner,
                pattern = %warning.pattern,
                reason = %warning.reason,
                "Skipping invalid pattern"
            );
        }

        Ok(Self {
            label_rules,
            ignore_phrases,
            known_companies,
            domain_to_company,
            aliases,
            ats_domains: domain_set(&companies.ats_domains),
            headhunter_domains,
            personal_domains: domain_set(&companies.personal_domains),
            internal_recruiter_domains: domain_set(&companies.internal_recruiter_domains),
            ats_keywords: companies
                .ats_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            subject_patterns,
            warnings,
        })
    }

    /// Label families in evaluation order.
    pub fn label_rules(&self) -> &[LabelRule] {
        &self.label_rules
    }

    pub fn label_priority(&self) -> Vec<Label> {
        self.label_rules.iter().map(|r| r.label).collect()
    }

    pub fn ignore_phrases(&self) -> &[String] {
        &self.ignore_phrases
    }

    pub fn known_companies(&self) -> &[String] {
        &self.known_companies
    }

    /// Looks up the domain, then each parent domain down to two labels.
    pub fn company_for_domain(&self, domain: &str) -> Option<&str> {
        let domain = normalize_domain(domain);
        let company = domain_candidates(&domain)
            .find_map(|d| self.domain_to_company.get(d).map(String::as_str));
        company
    }

    pub fn alias(&self, key: &str) -> Option<&str> {
        self.aliases
            .get(&key.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn is_ats_domain(&self, domain: &str) -> bool {
        in_domain_set(&self.ats_domains, domain)
    }

    pub fn is_headhunter_domain(&self, domain: &str) -> bool {
        in_domain_set(&self.headhunter_domains, domain)
    }

    pub fn is_personal_domain(&self, domain: &str) -> bool {
        in_domain_set(&self.personal_domains, domain)
    }

    /// A company's own recruiting domain: listed explicitly or mapped to a company,
    /// and never an agency or an ATS host.
    pub fn is_internal_recruiter_domain(&self, domain: &str) -> bool {
        if domain.is_empty() || self.is_headhunter_domain(domain) || self.is_ats_domain(domain) {
            return false;
        }
        in_domain_set(&self.internal_recruiter_domains, domain)
            || self.company_for_domain(domain).is_some()
    }

    pub fn ats_keywords(&self) -> &[String] {
        &self.ats_keywords
    }

    /// Company subject regexes in evaluation order; each has a `company` group.
    pub fn subject_patterns(&self) -> &[Regex] {
        &self.subject_patterns
    }

    /// Patterns dropped at load time.
    pub fn warnings(&self) -> &[PatternWarning] {
        &self.warnings
    }

    /// Total number of compiled label and exclude patterns.
    pub fn pattern_count(&self) -> usize {
        self.label_rules
            .iter()
            .map(|r| r.patterns.len() + r.excludes.len())
            .sum()
    }
}

fn resolve_priority(patterns: &PatternsFile) -> Result<Vec<Label>, ConfigError> {
    let mut order: Vec<Label> = if patterns.label_priority.is_empty() {
        Label::DEFAULT_PRIORITY.to_vec()
    } else {
        let mut listed = Vec::with_capacity(patterns.label_priority.len());
        for name in &patterns.label_priority {
            let label = parse_label(name, "patterns.json label_priority")?;
            if listed.contains(&label) {
                return Err(ConfigError::Validation {
                    message: format!("Label '{}' listed twice in label_priority", label),
                });
            }
            listed.push(label);
        }
        listed
    };

    let mut configured = Vec::new();
    for name in patterns.message_labels.keys() {
        configured.push(parse_label(name, "patterns.json message_labels")?);
    }

    // Labels with patterns but no explicit slot run after the listed ones.
    for label in Label::ALL {
        if configured.contains(&label) && !order.contains(&label) {
            order.push(label);
        }
    }

    Ok(order)
}

fn parse_label(name: &str, file: &str) -> Result<Label, ConfigError> {
    name.parse::<Label>().map_err(|_| ConfigError::UnknownLabel {
        label: name.to_string(),
        file: file.to_string(),
    })
}

fn compile_all(owner: &str, patterns: &[String], warnings: &mut Vec<PatternWarning>) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match compile_pattern(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warnings.push(PatternWarning {
                    owner: owner.to_string(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                });
                None
            }
        })
        .collect()
}

fn compile_subject_patterns<'a>(
    patterns: impl Iterator<Item = &'a str>,
    warnings: &mut Vec<PatternWarning>,
) -> Vec<Regex> {
    patterns
        .filter_map(|pattern| {
            let reason = match compile_pattern(pattern) {
                Ok(regex) if regex.capture_names().any(|n| n == Some("company")) => {
                    return Some(regex)
                }
                Ok(_) => "missing named group 'company'".to_string(),
                Err(e) => e.to_string(),
            };
            warnings.push(PatternWarning {
                owner: "subject_patterns".to_string(),
                pattern: pattern.to_string(),
                reason,
            });
            None
        })
        .collect()
}

/// All configured patterns match case-insensitively.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn domain_set(domains: &[String]) -> HashSet<String> {
    domains
        .iter()
        .map(|d| normalize_domain(d))
        .filter(|d| !d.is_empty())
        .collect()
}

fn in_domain_set(set: &HashSet<String>, domain: &str) -> bool {
    let domain = normalize_domain(domain);
    let found = domain_candidates(&domain).any(|d| set.contains(d));
    found
}

/// `a.b.example.com`, `b.example.com`, `example.com`.
pub(crate) fn domain_candidates(domain: &str) -> impl Iterator<Item = &str> {
    let mut next = if domain.is_empty() { None } else { Some(domain) };
    std::iter::from_fn(move || {
        let current = next?;
        next = current
            .split_once('.')
            .map(|(_, rest)| rest)
            .filter(|rest| rest.contains('.'));
        Some(current)
    })
}
