use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Contents of `patterns.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternsFile {
    /// Label name to ordered regex list.
    #[serde(default)]
    pub message_labels: BTreeMap<String, Vec<String>>,
    /// Label name to regexes that veto the label when they match anywhere in the text.
    #[serde(default)]
    pub exclude_labels: BTreeMap<String, Vec<String>>,
    /// Rule evaluation order. Empty means the built-in order.
    #[serde(default)]
    pub label_priority: Vec<String>,
    /// Phrases that mark a message as not worth processing at all.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Contents of `companies.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompaniesFile {
    #[serde(default)]
    pub known: Vec<String>,
    #[serde(default)]
    pub domain_to_company: BTreeMap<String, String>,
    /// Sender local part (or token) to canonical company name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub ats_domains: Vec<String>,
    #[serde(default)]
    pub headhunter_domains: Vec<String>,
    #[serde(default = "default_personal_domains")]
    pub personal_domains: Vec<String>,
    #[serde(default)]
    pub internal_recruiter_domains: Vec<String>,
    #[serde(default = "default_ats_keywords")]
    pub ats_keywords: Vec<String>,
    /// Replaces the built-in subject patterns when set. Each must have a `company` group.
    #[serde(default)]
    pub subject_patterns: Option<Vec<String>>,
}

impl Default for CompaniesFile {
    fn default() -> Self {
        Self {
            known: Vec::new(),
            domain_to_company: BTreeMap::new(),
            aliases: BTreeMap::new(),
            ats_domains: Vec::new(),
            headhunter_domains: Vec::new(),
            personal_domains: default_personal_domains(),
            internal_recruiter_domains: Vec::new(),
            ats_keywords: default_ats_keywords(),
            subject_patterns: None,
        }
    }
}

fn default_personal_domains() -> Vec<String> {
    [
        "gmail.com",
        "googlemail.com",
        "yahoo.com",
        "outlook.com",
        "hotmail.com",
        "live.com",
        "msn.com",
        "icloud.com",
        "me.com",
        "aol.com",
        "proton.me",
        "protonmail.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_ats_keywords() -> Vec<String> {
    [
        "workday",
        "icims",
        "taleo",
        "greenhouse",
        "lever",
        "smartrecruiters",
        "jobvite",
        "successfactors",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Contents of the legacy `domain_to_company.json`: a flat map.
pub type DomainMapFile = BTreeMap<String, String>;
