pub mod corpus;
pub mod labels;

pub use corpus::{Corpus, CorpusEntry, CorpusError, CorpusStats, FaqIndex, FALLBACK_REPLY};
pub use labels::{
    CRIME_LABELS, DEFAULT_HYPOTHESIS_TEMPLATE, DEFAULT_MATCH_THRESHOLD, LETHALITY_LABELS,
    LabelSet, LabelSetError,
};
