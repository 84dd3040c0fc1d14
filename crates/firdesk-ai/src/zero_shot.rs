//! ONNX Runtime zero-shot classifier backed by an MNLI model (e.g. bart-large-mnli).
//!
//! The model directory must contain `model.onnx` and `tokenizer.json`; a
//! `config.json` is read, when present, to find the entailment class.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{info, warn};

use crate::model::{LabelScore, ZeroShotClassifier};
use crate::nli::{DEFAULT_ENTAILMENT_INDEX, entailment_index, hypothesis, rank_by_entailment};

pub struct OnnxZeroShot {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    template: String,
    entailment: usize,
    uses_type_ids: bool,
}

impl OnnxZeroShot {
    /// Load an NLI model; `template` must contain `{}` for the label.
    pub fn load(model_dir: &Path, template: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(
            template.contains("{}"),
            "hypothesis template {template:?} has no {{}} placeholder"
        );

        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let uses_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let entailment = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: serde_json::Value =
                serde_json::from_str(&raw).context("parsing model config.json")?;
            entailment_index(&config).unwrap_or_else(|| {
                warn!("no entailment label in config.json, using index {DEFAULT_ENTAILMENT_INDEX}");
                DEFAULT_ENTAILMENT_INDEX
            })
        } else {
            DEFAULT_ENTAILMENT_INDEX
        };

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 512,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(
            model = %model_path.display(),
            entailment,
            uses_type_ids,
            "loaded zero-shot model"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            template: template.to_string(),
            entailment,
            uses_type_ids,
        })
    }
}

impl ZeroShotClassifier for OnnxZeroShot {
    fn classify(&self, text: &str, labels: &[&str]) -> anyhow::Result<Vec<LabelScore>> {
        anyhow::ensure!(!labels.is_empty(), "no candidate labels");

        let hypotheses: Vec<String> = labels
            .iter()
            .map(|l| hypothesis(&self.template, l))
            .collect();
        let pairs: Vec<(&str, &str)> = hypotheses.iter().map(|h| (text, h.as_str())).collect();

        let encodings = self
            .tokenizer
            .encode_batch(pairs, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("zero-shot session lock poisoned"))?;
        let outputs = if self.uses_type_ids {
            let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?
        };

        // Logits: [batch_size, num_classes].
        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[0] as usize == batch_size,
            "unexpected logits shape: {dims:?}, expected [{batch_size}, classes]"
        );

        rank_by_entailment(labels, logits, dims[1] as usize, self.entailment)
    }
}
