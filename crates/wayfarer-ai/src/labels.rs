//! NER label sets and "simple" aggregation of token predictions into spans.
//!
//! Token-classification models emit one BIO tag per word piece
//! (`B-LOC`, `I-LOC`, `O`, ...). Adjacent pieces of the same entity type are
//! grouped into one span the way the Hugging Face `simple` aggregation does:
//! a `B-` tag or a change of type opens a new span, `O` and special tokens
//! close it. Pieces are re-joined with WordPiece rules, so a span that starts
//! on a continuation piece keeps its leading `##`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use wayfarer_core::{EntityCategory, RawEntity};

/// CoNLL-2003 label order used by `dslim/bert-base-NER` and most BERT NER
/// fine-tunes.
pub const CONLL_LABELS: &[&str] = &[
    "O", "B-MISC", "I-MISC", "B-PER", "I-PER", "B-ORG", "I-ORG", "B-LOC", "I-LOC",
];

/// Index → label mapping for a token-classification head.
#[derive(Debug, Clone, PartialEq)]
pub struct NerLabels {
    id2label: Vec<String>,
}

#[derive(Deserialize)]
struct ModelConfig {
    id2label: BTreeMap<String, String>,
}

impl NerLabels {
    /// The CoNLL-2003 label set.
    pub fn conll() -> Self {
        Self {
            id2label: CONLL_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Read `id2label` from a Hugging Face `config.json`.
    pub fn from_config_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_config_json(&raw)
    }

    pub fn from_config_json(raw: &str) -> anyhow::Result<Self> {
        let config: ModelConfig = serde_json::from_str(raw).context("parsing model config")?;

        let mut indexed = Vec::with_capacity(config.id2label.len());
        for (k, v) in config.id2label {
            let idx: usize = k
                .parse()
                .with_context(|| format!("non-numeric id2label key {k:?}"))?;
            indexed.push((idx, v));
        }
        indexed.sort_by_key(|(i, _)| *i);

        for (expected, (idx, _)) in indexed.iter().enumerate() {
            anyhow::ensure!(*idx == expected, "id2label has a gap at index {expected}");
        }
        anyhow::ensure!(!indexed.is_empty(), "id2label is empty");

        Ok(Self {
            id2label: indexed.into_iter().map(|(_, v)| v).collect(),
        })
    }

    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }

    /// Label for a class index. Out-of-range indices read as `O`.
    pub fn label(&self, id: usize) -> &str {
        self.id2label.get(id).map(String::as_str).unwrap_or("O")
    }
}

/// Per-token output of a token-classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrediction {
    /// WordPiece token text, continuation pieces prefixed with `##`.
    pub token: String,
    pub label_id: usize,
    /// Softmax probability of the chosen label.
    pub score: f32,
    /// `[CLS]`, `[SEP]`, padding.
    pub special: bool,
}

#[derive(Debug, PartialEq)]
enum Bio<'a> {
    Begin(&'a str),
    Inside(&'a str),
    Outside,
}

fn split_tag(label: &str) -> Bio<'_> {
    if label == "O" {
        Bio::Outside
    } else if let Some(group) = label.strip_prefix("B-") {
        Bio::Begin(group)
    } else if let Some(group) = label.strip_prefix("I-") {
        Bio::Inside(group)
    } else {
        // Un-prefixed labels continue like `I-`.
        Bio::Inside(label)
    }
}

struct OpenSpan {
    group: String,
    tokens: Vec<String>,
    scores: Vec<f32>,
}

/// Group token predictions into entity spans.
pub fn group_entities(predictions: &[TokenPrediction], labels: &NerLabels) -> Vec<RawEntity> {
    let mut entities = Vec::new();
    let mut open: Option<OpenSpan> = None;

    for p in predictions {
        if p.special {
            close(&mut open, &mut entities);
            continue;
        }

        let (opens_new, group) = match split_tag(labels.label(p.label_id)) {
            Bio::Outside => {
                close(&mut open, &mut entities);
                continue;
            }
            Bio::Begin(group) => (true, group),
            Bio::Inside(group) => (open.as_ref().is_none_or(|s| s.group != group), group),
        };

        if opens_new {
            close(&mut open, &mut entities);
            open = Some(OpenSpan {
                group: group.to_string(),
                tokens: Vec::new(),
                scores: Vec::new(),
            });
        }
        if let Some(span) = open.as_mut() {
            span.tokens.push(p.token.clone());
            span.scores.push(p.score);
        }
    }
    close(&mut open, &mut entities);

    entities
}

fn close(open: &mut Option<OpenSpan>, out: &mut Vec<RawEntity>) {
    if let Some(span) = open.take() {
        let score = span.scores.iter().sum::<f32>() / span.scores.len().max(1) as f32;
        out.push(RawEntity::new(
            join_word_pieces(&span.tokens),
            EntityCategory::parse(&span.group),
            score,
        ));
    }
}

/// Merge predictions from overlapping tokenizer windows into one sequence.
///
/// Consecutive windows share `stride` content tokens. Each shared token is
/// kept from the window where it sits further from the edge: the earlier
/// window gives up the back half of the overlap, the later one the front
/// half. Special tokens are dropped, so a span that crosses a window
/// boundary groups as one entity.
pub fn stitch_windows(windows: &[Vec<TokenPrediction>], stride: usize) -> Vec<TokenPrediction> {
    let front = stride / 2;
    let back = stride - front;
    let last = windows.len().saturating_sub(1);

    let mut merged = Vec::new();
    for (k, window) in windows.iter().enumerate() {
        let content: Vec<&TokenPrediction> = window.iter().filter(|p| !p.special).collect();
        let lo = if k > 0 { front } else { 0 };
        let hi = if k < last {
            content.len().saturating_sub(back)
        } else {
            content.len()
        };
        if lo < hi {
            merged.extend(content[lo..hi].iter().map(|p| (*p).clone()));
        }
    }
    merged
}

/// Re-join WordPiece tokens: continuation pieces attach to the previous
/// piece; a leading continuation piece keeps its marker.
pub fn join_word_pieces(tokens: &[String]) -> String {
    tokens.join(" ").replace(" ##", "").trim().to_string()
}

/// Index and probability of the most likely class for one token's logits.
pub fn softmax_argmax(logits: &[f32]) -> (usize, f32) {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut best = 0;
    let mut denom = 0.0f32;
    for (i, &l) in logits.iter().enumerate() {
        denom += (l - max).exp();
        if l > logits[best] {
            best = i;
        }
    }
    if logits.is_empty() || denom == 0.0 {
        return (0, 0.0);
    }
    (best, (logits[best] - max).exp() / denom)
}
