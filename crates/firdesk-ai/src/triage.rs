//! Keyword-first crime triage.
//!
//! Common complaint phrasings (including Hinglish) map directly to a crime
//! category without touching the model. Only descriptions that match no rule
//! go through zero-shot classification.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::incident::{IncidentClassifier, round_confidence};

/// Ordered `(category, keywords)` rules. Earlier rules win.
const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "Theft",
        &[
            "chori",
            "stolen",
            "theft",
            "loot",
            "looted",
            "snatch",
            "mobile chori",
            "bag chori",
            "bike chori",
            "wallet chori",
            "phone chori",
            "pickpocket",
        ],
    ),
    (
        "Cyber Crime",
        &[
            "otp",
            "hacked",
            "bank fraud",
            "phishing",
            "fake profile",
            "online scam",
            "cyber",
            "internet fraud",
            "upi fraud",
            "katha se paise",
        ],
    ),
    (
        "Sexual Harassment",
        &[
            "harass",
            "stalking",
            "abuse",
            "pichha",
            "badtamizi",
            "molest",
            "eve teasing",
        ],
    ),
    (
        "Assault",
        &["beat", "mara", "fight", "attack", "maar-peet", "injury", "khoon"],
    ),
    ("Robbery", &["robbery", "dacoity", "gunpoint", "knife", "threat"]),
];

/// Case-insensitive substring rules mapping text to a crime category.
#[derive(Debug, Clone)]
pub struct KeywordRules {
    rules: Vec<(String, Vec<String>)>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(cat, words)| {
                    (
                        cat.to_string(),
                        words.iter().map(|w| w.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl KeywordRules {
    pub fn new(rules: Vec<(String, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(cat, words)| (cat, words.into_iter().map(|w| w.to_lowercase()).collect()))
            .collect();
        Self { rules }
    }

    /// First category with a keyword hit, scanning rules in order.
    pub fn detect(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w.as_str())))
            .map(|(cat, _)| cat.as_str())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(cat, _)| cat.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriageMethod {
    #[serde(rename = "rule-based")]
    RuleBased,
    #[serde(rename = "model")]
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageOutcome {
    pub crime_type: String,
    pub method: TriageMethod,
    /// Only set for model-based outcomes.
    pub confidence: Option<f64>,
}

/// Rules first, zero-shot crime classification as fallback.
pub struct Triage {
    rules: KeywordRules,
    incidents: Arc<IncidentClassifier>,
}

impl Triage {
    pub fn new(rules: KeywordRules, incidents: Arc<IncidentClassifier>) -> Self {
        Self { rules, incidents }
    }

    pub fn run(&self, description: &str) -> anyhow::Result<TriageOutcome> {
        if let Some(category) = self.rules.detect(description) {
            debug!(category, "keyword rule matched");
            return Ok(TriageOutcome {
                crime_type: category.to_string(),
                method: TriageMethod::RuleBased,
                confidence: None,
            });
        }

        let top = self
            .incidents
            .top_label(description, self.incidents.crime_labels())?;
        Ok(TriageOutcome {
            crime_type: top.label,
            method: TriageMethod::Model,
            confidence: Some(round_confidence(top.score)),
        })
    }
}
