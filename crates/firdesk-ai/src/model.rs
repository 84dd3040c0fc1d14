//! Model interfaces injected into the matcher and classifier.

/// Sentence embedding model: text in, fixed-length vector out.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Embed several texts, one vector per input in input order.
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// A candidate label with its classifier score.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Zero-shot classifier: ranks candidate labels for a text.
///
/// Implementations return every candidate, ordered by descending score.
pub trait ZeroShotClassifier: Send + Sync {
    fn classify(&self, text: &str, labels: &[&str]) -> anyhow::Result<Vec<LabelScore>>;
}
