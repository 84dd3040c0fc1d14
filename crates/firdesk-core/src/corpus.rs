//! FAQ corpus: question variants paired with a single pre-authored answer.
//!
//! The corpus is a JSON array of `{"questions": [...], "answer": "..."}`
//! records, loaded once at startup. [`FaqIndex`] flattens it into two aligned
//! sequences so that every question variant points at its owning answer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Reply returned when no known question is similar enough to the query.
pub const FALLBACK_REPLY: &str = "Maaf kijiye, main samajh nahi paaya. Kripya thoda aur vistaar mein batayein ya FIR se jude sawaal puchein.";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed corpus JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corpus contains no questions")]
    Empty,

    #[error("corpus entry {index} has no question variants")]
    EntryWithoutQuestions { index: usize },
}

/// One pre-authored answer and the question phrasings that lead to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub questions: Vec<String>,
    pub answer: String,
}

impl CorpusEntry {
    pub fn new<Q: Into<String>>(
        questions: impl IntoIterator<Item = Q>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            questions: questions.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }
}

/// A validated, immutable FAQ corpus.
#[derive(Debug, Clone)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

/// Summary statistics for a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub entries: usize,
    pub questions: usize,
}

impl Corpus {
    /// Load and validate a corpus from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_json(&raw)?;
        let stats = corpus.stats();
        info!(
            path = %path.display(),
            entries = stats.entries,
            questions = stats.questions,
            "loaded FAQ corpus"
        );
        Ok(corpus)
    }

    /// Parse and validate a corpus from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, CorpusError> {
        let entries: Vec<CorpusEntry> = serde_json::from_str(raw)?;
        Self::from_entries(entries)
    }

    /// Validate an in-memory list of entries.
    ///
    /// Every entry must carry at least one question variant, and the corpus
    /// as a whole must not be empty.
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Result<Self, CorpusError> {
        if entries.is_empty() {
            return Err(CorpusError::Empty);
        }
        if let Some(index) = entries.iter().position(|e| e.questions.is_empty()) {
            return Err(CorpusError::EntryWithoutQuestions { index });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            entries: self.entries.len(),
            questions: self.entries.iter().map(|e| e.questions.len()).sum(),
        }
    }
}

/// The corpus flattened into aligned `questions[i]` / `answers[i]` sequences.
///
/// Order is entry order, then question order within each entry. Several
/// positions may share the same answer.
#[derive(Debug, Clone)]
pub struct FaqIndex {
    questions: Vec<String>,
    answers: Vec<String>,
}

impl FaqIndex {
    pub fn flatten(corpus: &Corpus) -> Self {
        let total = corpus.stats().questions;
        let mut questions = Vec::with_capacity(total);
        let mut answers = Vec::with_capacity(total);

        for entry in corpus.entries() {
            for q in &entry.questions {
                questions.push(q.clone());
                answers.push(entry.answer.clone());
            }
        }

        Self { questions, answers }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).map(String::as_str)
    }

    /// All question variants in index order.
    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(String::as_str)
    }
}
