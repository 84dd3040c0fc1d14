//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Args;
use firdesk_ai::MatchSettings;
use firdesk_core::{
    CRIME_LABELS, DEFAULT_HYPOTHESIS_TEMPLATE, DEFAULT_MATCH_THRESHOLD, FALLBACK_REPLY,
    LETHALITY_LABELS, LabelSet,
};

#[derive(Args, Debug, Clone)]
pub struct MatcherArgs {
    /// FAQ corpus: JSON array of {"questions": [...], "answer": "..."}.
    #[arg(long, env = "FIRDESK_CORPUS", default_value = "answers.json")]
    pub corpus: PathBuf,

    /// Directory with the sentence-embedding model.onnx and tokenizer.json.
    #[arg(long, env = "FIRDESK_EMBED_MODEL", default_value = "models/all-MiniLM-L6-v2")]
    pub embed_model: PathBuf,

    /// Minimum cosine similarity for a FAQ answer.
    #[arg(long, env = "FIRDESK_THRESHOLD", default_value_t = DEFAULT_MATCH_THRESHOLD)]
    pub threshold: f32,

    #[arg(long, env = "FIRDESK_FALLBACK", default_value = FALLBACK_REPLY)]
    pub fallback: String,
}

impl MatcherArgs {
    pub fn settings(&self) -> MatchSettings {
        MatchSettings {
            threshold: self.threshold,
            fallback: self.fallback.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClassifierArgs {
    /// Directory with the NLI model.onnx, tokenizer.json and config.json.
    #[arg(long, env = "FIRDESK_NLI_MODEL", default_value = "models/bart-large-mnli")]
    pub nli_model: PathBuf,

    #[arg(long, env = "FIRDESK_HYPOTHESIS_TEMPLATE", default_value = DEFAULT_HYPOTHESIS_TEMPLATE)]
    pub hypothesis_template: String,

    /// Crime-type labels, comma separated. Defaults to the built-in 9-label set.
    #[arg(long, env = "FIRDESK_CRIME_LABELS", value_delimiter = ',')]
    pub crime_labels: Vec<String>,

    /// Lethality labels, comma separated. Defaults to the built-in 4-label set.
    #[arg(long, env = "FIRDESK_LETHALITY_LABELS", value_delimiter = ',')]
    pub lethality_labels: Vec<String>,
}

impl ClassifierArgs {
    pub fn label_sets(&self) -> anyhow::Result<(LabelSet, LabelSet)> {
        let crime = label_set("crime", &self.crime_labels, CRIME_LABELS)?;
        let lethality = label_set("lethality", &self.lethality_labels, LETHALITY_LABELS)?;
        Ok((crime, lethality))
    }
}

fn label_set(name: &str, given: &[String], defaults: &[&str]) -> anyhow::Result<LabelSet> {
    let set = if given.is_empty() {
        LabelSet::new(name, defaults.iter().copied())?
    } else {
        LabelSet::new(name, given.iter().cloned())?
    };
    Ok(set)
}
