//! Nearest-question FAQ matcher.
//!
//! Every question variant in the corpus is embedded once at build time. A
//! query is embedded, compared against all cached vectors by cosine
//! similarity, and answered with the owning answer of the best match, or a
//! fixed fallback when the best score is below the threshold.

use std::sync::Arc;

use anyhow::Context;
use firdesk_core::{Corpus, DEFAULT_MATCH_THRESHOLD, FALLBACK_REPLY, FaqIndex};
use serde::Serialize;
use tracing::{debug, info};

use crate::model::TextEmbedder;
use crate::similarity::first_max;

/// Tunables for the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    /// Scores strictly below this fall back to [`fallback`](Self::fallback).
    pub threshold: f32,
    pub fallback: String,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            fallback: FALLBACK_REPLY.to_string(),
        }
    }
}

impl MatchSettings {
    /// Cosine similarity lives in [-1, 1]; anything else can never be tuned sensibly.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.threshold.is_finite() && (-1.0..=1.0).contains(&self.threshold),
            "match threshold must be within [-1, 1], got {}",
            self.threshold
        );
        Ok(())
    }
}

/// The closest known question for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredQuestion {
    pub index: usize,
    pub question: String,
    pub score: f32,
}

/// Outcome of a chat query.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// `None` when the fallback reply was used.
    pub matched: Option<ScoredQuestion>,
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        self.matched.is_none()
    }
}

/// Read-only FAQ index with one cached embedding per question variant.
pub struct FaqMatcher {
    index: FaqIndex,
    embeddings: Vec<Vec<f32>>,
    dim: usize,
    embedder: Arc<dyn TextEmbedder>,
    settings: MatchSettings,
}

impl FaqMatcher {
    /// Flatten the corpus and embed every question variant.
    pub fn build(
        corpus: &Corpus,
        embedder: Arc<dyn TextEmbedder>,
        settings: MatchSettings,
    ) -> anyhow::Result<Self> {
        settings.validate()?;

        let index = FaqIndex::flatten(corpus);
        anyhow::ensure!(!index.is_empty(), "FAQ corpus has no questions");

        let questions: Vec<&str> = index.questions().collect();
        let embeddings = embedder
            .embed_batch(&questions)
            .context("embedding corpus questions")?;
        anyhow::ensure!(
            embeddings.len() == index.len(),
            "embedder returned {} vectors for {} questions",
            embeddings.len(),
            index.len()
        );

        let dim = embeddings.first().map_or(0, Vec::len);
        anyhow::ensure!(dim > 0, "embedder returned empty vectors");
        if let Some(pos) = embeddings.iter().position(|e| e.len() != dim) {
            anyhow::bail!(
                "question {pos} embedded with {} dimensions, expected {dim}",
                embeddings[pos].len()
            );
        }

        info!(
            questions = index.len(),
            dim,
            threshold = settings.threshold,
            "built FAQ index"
        );

        Ok(Self {
            index,
            embeddings,
            dim,
            embedder,
            settings,
        })
    }

    /// Number of indexed question variants.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Embedding dimensionality shared by the index and every query.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The closest indexed question, regardless of threshold.
    pub fn best_match(&self, query: &str) -> anyhow::Result<Option<ScoredQuestion>> {
        let query_vec = self.embedder.embed(query).context("embedding query")?;
        anyhow::ensure!(
            query_vec.len() == self.dim,
            "query embedded with {} dimensions, index has {}",
            query_vec.len(),
            self.dim
        );

        let Some((index, score)) = first_max(&query_vec, &self.embeddings) else {
            return Ok(None);
        };
        let question = self.index.question(index).unwrap_or_default().to_string();

        debug!(index, score, question = %question, "best FAQ candidate");
        Ok(Some(ScoredQuestion {
            index,
            question,
            score,
        }))
    }

    /// Answer a query, falling back when nothing clears the threshold.
    pub fn reply(&self, query: &str) -> anyhow::Result<Reply> {
        let best = self.best_match(query)?;

        let answered = best.and_then(|m| {
            if m.score < self.settings.threshold {
                debug!(score = m.score, threshold = self.settings.threshold, "below threshold");
                return None;
            }
            self.index.answer(m.index).map(|a| (a.to_string(), m))
        });

        Ok(match answered {
            Some((text, matched)) => Reply {
                text,
                matched: Some(matched),
            },
            None => Reply {
                text: self.settings.fallback.clone(),
                matched: None,
            },
        })
    }

    /// Reply text only.
    pub fn answer(&self, query: &str) -> anyhow::Result<String> {
        Ok(self.reply(query)?.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firdesk_core::CorpusEntry;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VOCAB: &[&str] = &["fir", "file", "process", "police", "zero", "lost", "phone"];

    /// Bag-of-words embedder over a tiny vocabulary.
    struct VocabEmbedder {
        calls: AtomicUsize,
    }

    impl VocabEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TextEmbedder for VocabEmbedder {
        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = text.to_lowercase();
            let tokens: Vec<&str> = lower
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
                .collect();
            Ok(VOCAB
                .iter()
                .map(|w| tokens.iter().filter(|t| *t == w).count() as f32)
                .collect())
        }
    }

    /// Embedder with hand-picked vectors.
    struct FixedEmbedder(HashMap<&'static str, Vec<f32>>);

    impl TextEmbedder for FixedEmbedder {
        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.0
                .get(text)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no vector for {text:?}"))
        }
    }

    struct ShortBatchEmbedder;

    impl TextEmbedder for ShortBatchEmbedder {
        fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn embed_batch(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }
    }

    fn fir_corpus() -> Corpus {
        Corpus::from_entries(vec![
            CorpusEntry::new(
                ["How do I file an FIR?", "FIR process"],
                "Visit your nearest police station...",
            ),
            CorpusEntry::new(["Lost my phone"], "Report the lost phone online."),
        ])
        .unwrap()
    }

    fn vocab_matcher(settings: MatchSettings) -> anyhow::Result<FaqMatcher> {
        FaqMatcher::build(&fir_corpus(), Arc::new(VocabEmbedder::new()), settings)
    }

    fn fixed(pairs: Vec<(&'static str, Vec<f32>)>) -> Arc<dyn TextEmbedder> {
        Arc::new(FixedEmbedder(pairs.into_iter().collect()))
    }

    #[test]
    fn matches_related_question() {
        let matcher = vocab_matcher(MatchSettings::default()).unwrap();

        let reply = matcher.reply("What is the FIR process?").unwrap();
        assert_eq!(reply.text, "Visit your nearest police station...");
        let matched = reply.matched.unwrap();
        assert_eq!(matched.question, "FIR process");
        assert!(matched.score >= DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn gibberish_gets_fallback() {
        let matcher = vocab_matcher(MatchSettings::default()).unwrap();

        let reply = matcher.reply("asdkjhasdkjh").unwrap();
        assert!(reply.is_fallback());
        assert_eq!(reply.text, FALLBACK_REPLY);
    }

    #[test]
    fn empty_query_is_embedded_not_special_cased() {
        let embedder = Arc::new(VocabEmbedder::new());
        let matcher =
            FaqMatcher::build(&fir_corpus(), embedder.clone(), MatchSettings::default()).unwrap();
        let before = embedder.calls.load(Ordering::SeqCst);

        assert_eq!(matcher.answer("   ").unwrap(), FALLBACK_REPLY);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn corpus_is_embedded_once_at_build() {
        let embedder = Arc::new(VocabEmbedder::new());
        let matcher =
            FaqMatcher::build(&fir_corpus(), embedder.clone(), MatchSettings::default()).unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);

        matcher.answer("FIR process").unwrap();
        matcher.answer("lost phone").unwrap();
        // One embedding per query, none for the corpus.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn score_equal_to_threshold_is_accepted() {
        let corpus = Corpus::from_entries(vec![CorpusEntry::new(["q"], "answer")]).unwrap();
        // cos([1,0], [1,1]) = 1/sqrt(2)
        let embedder = fixed(vec![("q", vec![1.0, 1.0]), ("query", vec![1.0, 0.0])]);
        let exact = cosine_of(&[1.0, 0.0], &[1.0, 1.0]);

        let at = MatchSettings {
            threshold: exact,
            ..Default::default()
        };
        let matcher = FaqMatcher::build(&corpus, embedder.clone(), at).unwrap();
        assert_eq!(matcher.answer("query").unwrap(), "answer");

        let above = MatchSettings {
            threshold: exact + 0.01,
            ..Default::default()
        };
        let matcher = FaqMatcher::build(&corpus, embedder, above).unwrap();
        assert_eq!(matcher.answer("query").unwrap(), FALLBACK_REPLY);
    }

    #[test]
    fn tie_resolves_to_earliest_question() {
        let corpus = Corpus::from_entries(vec![
            CorpusEntry::new(["first"], "answer one"),
            CorpusEntry::new(["second"], "answer two"),
        ])
        .unwrap();
        let embedder = fixed(vec![
            ("first", vec![0.0, 1.0]),
            ("second", vec![0.0, 1.0]),
            ("query", vec![0.0, 2.0]),
        ]);
        let matcher = FaqMatcher::build(&corpus, embedder, MatchSettings::default()).unwrap();

        let reply = matcher.reply("query").unwrap();
        assert_eq!(reply.text, "answer one");
        assert_eq!(reply.matched.unwrap().index, 0);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let matcher = vocab_matcher(MatchSettings::default()).unwrap();
        let a = matcher.reply("file FIR with police").unwrap();
        let b = matcher.reply("file FIR with police").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn custom_fallback_text() {
        let settings = MatchSettings {
            threshold: 0.9,
            fallback: "Please rephrase.".into(),
        };
        let matcher = vocab_matcher(settings).unwrap();
        assert_eq!(matcher.answer("police").unwrap(), "Please rephrase.");
    }

    #[test]
    fn query_embedding_failure_is_an_error() {
        let corpus = Corpus::from_entries(vec![CorpusEntry::new(["q"], "a")]).unwrap();
        let embedder = fixed(vec![("q", vec![1.0])]);
        let matcher = FaqMatcher::build(&corpus, embedder, MatchSettings::default()).unwrap();
        assert!(matcher.reply("unknown").is_err());
    }

    #[test]
    fn build_fails_when_corpus_embedding_fails() {
        let err = FaqMatcher::build(&fir_corpus(), fixed(vec![]), MatchSettings::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("embedding corpus questions"));
    }

    #[test]
    fn build_rejects_short_batch() {
        assert!(
            FaqMatcher::build(&fir_corpus(), Arc::new(ShortBatchEmbedder), MatchSettings::default())
                .is_err()
        );
    }

    #[test]
    fn query_dimension_mismatch_is_an_error_not_a_fallback() {
        let corpus = Corpus::from_entries(vec![CorpusEntry::new(["q"], "a")]).unwrap();
        let embedder = fixed(vec![("q", vec![1.0, 0.0]), ("q again", vec![1.0, 0.0, 0.0])]);
        let matcher = FaqMatcher::build(&corpus, embedder, MatchSettings::default()).unwrap();
        assert_eq!(matcher.dim(), 2);

        let err = matcher.reply("q again").unwrap_err();
        assert!(err.to_string().contains("3 dimensions"), "{err}");
    }

    #[test]
    fn build_rejects_mixed_corpus_dimensions() {
        let embedder = fixed(vec![
            ("How do I file an FIR?", vec![1.0, 0.0]),
            ("FIR process", vec![1.0, 0.0, 0.0]),
            ("Lost my phone", vec![0.0, 1.0]),
        ]);
        let err = FaqMatcher::build(&fir_corpus(), embedder, MatchSettings::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("question 1"), "{err}");
    }

    #[test]
    fn build_rejects_empty_vectors() {
        let embedder = fixed(vec![
            ("How do I file an FIR?", vec![]),
            ("FIR process", vec![]),
            ("Lost my phone", vec![]),
        ]);
        assert!(FaqMatcher::build(&fir_corpus(), embedder, MatchSettings::default()).is_err());
    }

    #[test]
    fn build_rejects_out_of_range_threshold() {
        let settings = MatchSettings {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(vocab_matcher(settings).is_err());
    }

    fn cosine_of(a: &[f32], b: &[f32]) -> f32 {
        crate::similarity::cosine_similarity(a, b)
    }
}
