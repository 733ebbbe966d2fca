//! Local ONNX Runtime token-classification recognizer.
//!
//! Runs a BERT NER model (e.g. dslim/bert-base-NER exported to ONNX).
//! The model directory must contain `model.onnx` and `tokenizer.json`;
//! `config.json` is read for `id2label` when present, otherwise the
//! CoNLL-2003 label order is assumed.

use std::path::Path;

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};
use wayfarer_core::RawEntity;

use crate::labels::{NerLabels, TokenPrediction, group_entities, softmax_argmax, stitch_windows};
use crate::recognizer::EntityRecognizer;

/// BERT position limit.
const MAX_SEQ_LEN: usize = 512;
/// Tokens shared by consecutive windows of a long post.
const WINDOW_STRIDE: usize = 128;

pub struct OnnxRecognizer {
    session: Session,
    tokenizer: Tokenizer,
    labels: NerLabels,
}

impl OnnxRecognizer {
    /// Load a token-classification model from a directory.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let labels = if config_path.exists() {
            NerLabels::from_config_file(&config_path)?
        } else {
            NerLabels::conll()
        };

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

        // Long posts are split into overlapping windows rather than cut off.
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                stride: WINDOW_STRIDE,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(None);

        info!(
            labels = labels.num_labels(),
            model = %model_path.display(),
            "loaded NER model"
        );
        Ok(Self {
            session,
            tokenizer,
            labels,
        })
    }

    /// Recognize entities in `text`, window by window.
    pub fn recognize_blocking(&mut self, text: &str) -> anyhow::Result<Vec<RawEntity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let mut windows = vec![encoding.clone()];
        windows.extend(encoding.get_overflowing().iter().cloned());
        debug!(windows = windows.len(), "tokenized blog text");

        let predictions = windows
            .iter()
            .map(|window| self.predict(window))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let merged = stitch_windows(&predictions, WINDOW_STRIDE);
        Ok(group_entities(&merged, &self.labels))
    }

    fn predict(&mut self, encoding: &Encoding) -> anyhow::Result<Vec<TokenPrediction>> {
        let seq_len = encoding.get_ids().len();
        if seq_len == 0 {
            return Ok(Vec::new());
        }

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let shape = [1i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Logits: [1, seq_len, num_labels].
        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] == 1 && dims[1] as usize == seq_len,
            "unexpected output shape: {dims:?}, expected [1, {seq_len}, {}]",
            self.labels.num_labels()
        );
        let num_labels = dims[2] as usize;

        let tokens = encoding.get_tokens();
        let special = encoding.get_special_tokens_mask();

        let predictions = (0..seq_len)
            .map(|j| {
                let row = &logits[j * num_labels..(j + 1) * num_labels];
                let (label_id, score) = softmax_argmax(row);
                TokenPrediction {
                    token: tokens[j].clone(),
                    label_id,
                    score,
                    special: special[j] == 1,
                }
            })
            .collect();

        Ok(predictions)
    }
}

#[async_trait]
impl EntityRecognizer for OnnxRecognizer {
    async fn recognize(&mut self, text: &str) -> anyhow::Result<Vec<RawEntity>> {
        // Inference runs on the calling task; the pipeline is sequential.
        self.recognize_blocking(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join("bert-base-NER")
    }

    fn require_model() -> PathBuf {
        let dir = model_dir();
        if !dir.join("model.onnx").exists() {
            panic!(
                "Model not found. Export from HuggingFace:\n  \
                 optimum-cli export onnx --model dslim/bert-base-NER \
                 --task token-classification models/bert-base-NER"
            );
        }
        dir
    }

    #[test]
    #[ignore = "needs models/bert-base-NER"]
    fn load_model() {
        let dir = require_model();
        let rec = OnnxRecognizer::load(&dir).unwrap();
        assert_eq!(rec.labels.num_labels(), 9);
    }

    #[test]
    #[ignore = "needs models/bert-base-NER"]
    fn finds_locations() {
        let dir = require_model();
        let mut rec = OnnxRecognizer::load(&dir).unwrap();
        let ents = rec
            .recognize_blocking("I visited Paris and loved the Eiffel Tower.")
            .unwrap();
        assert!(
            ents.iter()
                .any(|e| e.category.is_location() && e.text == "Paris"),
            "expected Paris in {ents:?}"
        );
    }

    #[test]
    #[ignore = "needs models/bert-base-NER"]
    fn empty_text_yields_nothing() {
        let dir = require_model();
        let mut rec = OnnxRecognizer::load(&dir).unwrap();
        assert!(rec.recognize_blocking("").unwrap().is_empty());
    }
}
