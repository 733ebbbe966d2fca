//! Entity recognizer seam and the hosted (HTTP) implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wayfarer_core::{EntityCategory, RawEntity};

/// Hugging Face inference endpoint for the default NER model.
pub const DEFAULT_NER_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/dslim/bert-base-NER";

/// Labels spans of text with entity categories.
///
/// Implementations return grouped spans (sub-word tokens already merged).
/// Errors are not recovered by the pipeline: a failing recognizer aborts
/// the run.
#[async_trait]
pub trait EntityRecognizer: Send {
    async fn recognize(&mut self, text: &str) -> anyhow::Result<Vec<RawEntity>>;
}

#[async_trait]
impl<T: EntityRecognizer + ?Sized> EntityRecognizer for Box<T> {
    async fn recognize(&mut self, text: &str) -> anyhow::Result<Vec<RawEntity>> {
        (**self).recognize(text).await
    }
}

/// Token-classification model served over HTTP (Hugging Face Inference API
/// or a self-hosted text-inference server with the same contract).
pub struct HostedRecognizer {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct NerRequest<'a> {
    inputs: &'a str,
    parameters: NerParameters,
}

#[derive(Serialize)]
struct NerParameters {
    aggregation_strategy: &'static str,
}

#[derive(Debug, Deserialize)]
struct HostedEntity {
    entity_group: String,
    word: String,
    #[serde(default)]
    score: f32,
}

impl From<HostedEntity> for RawEntity {
    fn from(e: HostedEntity) -> Self {
        RawEntity::new(e.word, EntityCategory::parse(&e.entity_group), e.score)
    }
}

impl HostedRecognizer {
    /// `endpoint` is the full model URL; `token` is sent as a bearer token
    /// when present.
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl EntityRecognizer for HostedRecognizer {
    async fn recognize(&mut self, text: &str) -> anyhow::Result<Vec<RawEntity>> {
        // The inference API rejects empty inputs; nothing can be found anyway.
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        debug!(endpoint = %self.endpoint, chars = text.len(), "requesting entities");
        let mut req = self.client.post(&self.endpoint).json(&NerRequest {
            inputs: text,
            parameters: NerParameters {
                aggregation_strategy: "simple",
            },
        });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("recognizer returned {status}: {body}");
        }

        let entities = parse_entities(&resp.text().await?)?;
        info!(count = entities.len(), "recognized entities");
        Ok(entities)
    }
}

fn parse_entities(body: &str) -> anyhow::Result<Vec<RawEntity>> {
    let raw: Vec<HostedEntity> = serde_json::from_str(body)?;
    Ok(raw.into_iter().map(RawEntity::from).collect())
}
