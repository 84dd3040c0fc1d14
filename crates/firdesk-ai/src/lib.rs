//! Inference layer: semantic FAQ matching and zero-shot incident classification.
//!
//! Models sit behind the [`TextEmbedder`] and [`ZeroShotClassifier`] traits;
//! ONNX Runtime implementations are available with the `onnx` feature.

pub mod incident;
pub mod matcher;
pub mod model;
pub mod nli;
pub mod similarity;
pub mod triage;

pub use incident::{IncidentClassifier, IncidentReport, round_confidence};
pub use matcher::{FaqMatcher, MatchSettings, Reply, ScoredQuestion};
pub use model::{LabelScore, TextEmbedder, ZeroShotClassifier};
pub use similarity::{cosine_similarity, normalize};
pub use triage::{KeywordRules, Triage, TriageMethod, TriageOutcome};

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::OnnxEmbedder;

#[cfg(feature = "onnx")]
mod zero_shot;
#[cfg(feature = "onnx")]
pub use zero_shot::OnnxZeroShot;
