//! Fixed label sets for zero-shot incident classification, plus tunable defaults.

use thiserror::Error;

/// Crime-type axis, in the order presented to the classifier.
pub const CRIME_LABELS: &[&str] = &[
    "Theft",
    "Robbery",
    "Assault",
    "Cyber Crime",
    "Sexual Harassment",
    "Domestic Violence",
    "Fraud",
    "Missing Person",
    "Murder Attempt",
];

/// Lethality axis, from least to most severe.
pub const LETHALITY_LABELS: &[&str] = &[
    "Non-Violent",
    "Low Violence",
    "Violent",
    "Life Threatening",
];

/// Minimum cosine similarity for a FAQ match to be accepted.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.25;

/// NLI hypothesis built for each candidate label; `{}` is replaced by the label.
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelSetError {
    #[error("label set '{0}' has no labels")]
    Empty(String),

    #[error("label set '{set}' contains a blank label at position {position}")]
    BlankLabel { set: String, position: usize },
}

/// An ordered set of candidate labels defining one classification axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    name: String,
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new<L: Into<String>>(
        name: impl Into<String>,
        labels: impl IntoIterator<Item = L>,
    ) -> Result<Self, LabelSetError> {
        let name = name.into();
        let labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.into().trim().to_string())
            .collect();

        if labels.is_empty() {
            return Err(LabelSetError::Empty(name));
        }
        if let Some(position) = labels.iter().position(|l| l.is_empty()) {
            return Err(LabelSetError::BlankLabel { set: name, position });
        }
        Ok(Self { name, labels })
    }

    /// The 9-label crime-type set.
    pub fn crime() -> Self {
        Self {
            name: "crime".to_string(),
            labels: CRIME_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The 4-label lethality set.
    pub fn lethality() -> Self {
        Self {
            name: "lethality".to_string(),
            labels: LETHALITY_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> Vec<&str> {
        self.labels.iter().map(String::as_str).collect()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
