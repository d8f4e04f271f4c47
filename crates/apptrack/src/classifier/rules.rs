use std::sync::Arc;

use tracing::debug;

use crate::config::patterns::domain_candidates;
use crate::config::{LabelRule, PatternConfig};
use crate::label::Label;
use crate::message::normalize_domain;

/// Deterministic first pass over the configured label families.
pub struct RuleClassifier {
    patterns: Arc<PatternConfig>,
}

impl RuleClassifier {
    pub fn new(patterns: Arc<PatternConfig>) -> Self {
        Self { patterns }
    }

    /// Returns the first label family, in priority order, that matches and is not
    /// vetoed by its own excludes. Falls back to `Label::Ignore` when an ignore
    /// phrase is present, and to `None` when nothing applies.
    pub fn rule_label(
        &self,
        subject: &str,
        body: &str,
        sender_domain: Option<&str>,
    ) -> Option<Label> {
        let text = format!("{}\n{}", subject, body);
        let domain = sender_domain.map(normalize_domain).unwrap_or_default();

        for rule in self.patterns.label_rules() {
            if !self.fires(rule, &text, &domain) {
                continue;
            }
            if let Some(exclude) = rule.excludes.iter().find(|re| re.is_match(&text)) {
                debug!(
                    label = %rule.label,
                    exclude = exclude.as_str(),
                    "Rule match vetoed by exclude pattern"
                );
                continue;
            }
            return Some(rule.label);
        }

        let lowered = text.to_lowercase();
        if let Some(phrase) = self
            .patterns
            .ignore_phrases()
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
        {
            debug!(phrase = %phrase, "Ignore phrase matched");
            return Some(Label::Ignore);
        }

        None
    }

    fn fires(&self, rule: &LabelRule, text: &str, domain: &str) -> bool {
        if let Some(pattern) = rule.patterns.iter().find(|re| re.is_match(text)) {
            debug!(label = %rule.label, pattern = pattern.as_str(), "Rule pattern matched");
            return true;
        }
        if !domain.is_empty() && !rule.sender_domains.is_empty() {
            let hit = domain_candidates(domain).any(|d| rule.sender_domains.contains(d));
            if hit {
                debug!(label = %rule.label, domain = %domain, "Rule sender domain matched");
            }
            return hit;
        }
        false
    }
}
