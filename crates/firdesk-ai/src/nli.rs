//! Zero-shot classification on top of an NLI cross-encoder.
//!
//! Each candidate label becomes a hypothesis ("This example is Theft.") paired
//! with the text as premise. The entailment logit of every pair is softmaxed
//! across labels, giving one probability distribution over the candidates.

use serde_json::Value;

use crate::model::LabelScore;

/// Entailment column for MNLI heads (contradiction, neutral, entailment).
pub const DEFAULT_ENTAILMENT_INDEX: usize = 2;

/// Fill a hypothesis template, replacing `{}` with the label.
pub fn hypothesis(template: &str, label: &str) -> String {
    template.replace("{}", label)
}

/// Locate the entailment class in a Hugging Face `config.json`.
///
/// Checks `label2id` first, then `id2label`. Matching is case-insensitive.
pub fn entailment_index(config: &Value) -> Option<usize> {
    if let Some(map) = config.get("label2id").and_then(Value::as_object) {
        let found = map
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("entailment"))
            .and_then(|(_, v)| v.as_u64());
        if let Some(idx) = found {
            return Some(idx as usize);
        }
    }

    config
        .get("id2label")
        .and_then(Value::as_object)?
        .iter()
        .find(|(_, v)| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case("entailment")))
        .and_then(|(k, _)| k.parse().ok())
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Rank labels by softmaxed entailment logits.
///
/// `logits` is row-major `[labels.len(), num_classes]`. Equal scores keep the
/// candidate order.
pub fn rank_by_entailment(
    labels: &[&str],
    logits: &[f32],
    num_classes: usize,
    entailment: usize,
) -> anyhow::Result<Vec<LabelScore>> {
    anyhow::ensure!(
        entailment < num_classes,
        "entailment index {entailment} out of range for {num_classes} classes"
    );
    anyhow::ensure!(
        logits.len() == labels.len() * num_classes,
        "expected {} logits, got {}",
        labels.len() * num_classes,
        logits.len()
    );

    let entail: Vec<f32> = logits
        .chunks(num_classes)
        .map(|row| row[entailment])
        .collect();
    let probs = softmax(&entail);

    let mut ranked: Vec<LabelScore> = labels
        .iter()
        .zip(probs)
        .map(|(l, p)| LabelScore::new(*l, p))
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranked)
}
