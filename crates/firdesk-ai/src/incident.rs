//! Incident classification along two independent zero-shot axes.

use std::sync::Arc;

use anyhow::Context;
use firdesk_core::LabelSet;
use serde::Serialize;
use tracing::debug;

use crate::model::{LabelScore, ZeroShotClassifier};

/// Top crime type and lethality for an incident description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReport {
    pub crime_type: String,
    pub crime_confidence: f64,
    pub lethality: String,
    pub lethality_confidence: f64,
}

/// Clamp a score to [0, 1] and round it to two decimal places.
///
/// Exact halves round to even (0.125 -> 0.12, 0.375 -> 0.38).
pub fn round_confidence(score: f32) -> f64 {
    let clamped = f64::from(score).clamp(0.0, 1.0);
    (clamped * 100.0).round_ties_even() / 100.0
}

/// Runs the crime-type and lethality classifications for a description.
pub struct IncidentClassifier {
    classifier: Arc<dyn ZeroShotClassifier>,
    crime: LabelSet,
    lethality: LabelSet,
}

impl IncidentClassifier {
    pub fn new(
        classifier: Arc<dyn ZeroShotClassifier>,
        crime: LabelSet,
        lethality: LabelSet,
    ) -> Self {
        Self {
            classifier,
            crime,
            lethality,
        }
    }

    /// Classifier over the fixed 9-label crime and 4-label lethality sets.
    pub fn with_defaults(classifier: Arc<dyn ZeroShotClassifier>) -> Self {
        Self::new(classifier, LabelSet::crime(), LabelSet::lethality())
    }

    pub fn crime_labels(&self) -> &LabelSet {
        &self.crime
    }

    pub fn lethality_labels(&self) -> &LabelSet {
        &self.lethality
    }

    /// Highest-ranked label for one axis.
    pub fn top_label(&self, text: &str, set: &LabelSet) -> anyhow::Result<LabelScore> {
        let ranked = self
            .classifier
            .classify(text, &set.labels())
            .with_context(|| format!("classifying {} labels", set.name()))?;

        let top = ranked
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("classifier returned no {} labels", set.name()))?;
        anyhow::ensure!(
            set.contains(&top.label),
            "classifier returned {:?}, which is not a {} label",
            top.label,
            set.name()
        );
        debug!(axis = set.name(), label = %top.label, score = top.score, "top label");
        Ok(top)
    }

    /// Classify crime type first, then lethality.
    pub fn classify(&self, description: &str) -> anyhow::Result<IncidentReport> {
        let crime = self.top_label(description, &self.crime)?;
        let lethality = self.top_label(description, &self.lethality)?;

        Ok(IncidentReport {
            crime_type: crime.label,
            crime_confidence: round_confidence(crime.score),
            lethality: lethality.label,
            lethality_confidence: round_confidence(lethality.score),
        })
    }
}
