//! Command-line and environment configuration.
//!
//! Every option can come from the environment, so a deployment runs the
//! binary with no flags at all.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tracing::info;
use wayfarer_ai::recognizer::DEFAULT_NER_ENDPOINT;
use wayfarer_ai::{EntityRecognizer, HostedRecognizer, LexiconSentiment};
use wayfarer_geo::{Geocoder, NOMINATIM_BASE_URL, NominatimClient, OpenCageClient};
use wayfarer_pipeline::PipelineConfig;
use wayfarer_store::SupabaseStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeocoderKind {
    Opencage,
    Nominatim,
}

/// Wayfarer: discover popular places mentioned in travel blogs.
#[derive(Parser, Debug)]
#[command(name = "wayfarer", version, about, long_about = None)]
pub struct Args {
    /// Supabase project URL, e.g. https://xyz.supabase.co
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: String,

    /// Supabase API key (sent as `apikey` and bearer token)
    #[arg(long, env = "SUPABASE_API_KEY", hide_env_values = true)]
    pub supabase_key: String,

    #[arg(long, env = "WAYFARER_GEOCODER", value_enum, default_value_t = GeocoderKind::Opencage)]
    pub geocoder: GeocoderKind,

    /// Required when the geocoder is OpenCage
    #[arg(long, env = "OPENCAGE_API_KEY", hide_env_values = true)]
    pub opencage_key: Option<String>,

    #[arg(long, env = "NOMINATIM_URL", default_value = NOMINATIM_BASE_URL)]
    pub nominatim_url: String,

    /// Directory with model.onnx + tokenizer.json; runs NER locally instead
    /// of calling the hosted endpoint
    #[arg(long, env = "WAYFARER_NER_MODEL_DIR")]
    pub ner_model_dir: Option<PathBuf>,

    /// Hosted token-classification endpoint
    #[arg(long, env = "WAYFARER_NER_ENDPOINT", default_value = DEFAULT_NER_ENDPOINT)]
    pub ner_endpoint: String,

    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// JSON object of extra sentiment words: {"word": polarity}
    #[arg(long, env = "WAYFARER_SENTIMENT_LEXICON")]
    pub sentiment_lexicon: Option<PathBuf>,

    /// Minimum milliseconds between candidates (geocoder rate limit)
    #[arg(long, env = "WAYFARER_THROTTLE_MS", default_value_t = 1000)]
    pub throttle_ms: u64,
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            throttle: Duration::from_millis(self.throttle_ms),
        }
    }

    pub fn store(&self) -> anyhow::Result<SupabaseStore> {
        SupabaseStore::new(&self.supabase_url, &self.supabase_key)
            .context("configuring Supabase client")
    }

    pub fn geocoder(&self) -> anyhow::Result<Box<dyn Geocoder>> {
        match self.geocoder {
            GeocoderKind::Opencage => {
                let Some(key) = self.opencage_key.as_deref().filter(|k| !k.is_empty()) else {
                    bail!(
                        "OPENCAGE_API_KEY (--opencage-key) is required for the opencage geocoder"
                    );
                };
                info!("geocoding with OpenCage");
                Ok(Box::new(OpenCageClient::new(key)))
            }
            GeocoderKind::Nominatim => {
                info!(url = %self.nominatim_url, "geocoding with Nominatim");
                let user_agent = format!("wayfarer/{}", env!("CARGO_PKG_VERSION"));
                Ok(Box::new(NominatimClient::new(&self.nominatim_url, user_agent)))
            }
        }
    }

    pub fn recognizer(&self) -> anyhow::Result<Box<dyn EntityRecognizer>> {
        match &self.ner_model_dir {
            Some(dir) => local_recognizer(dir),
            None => {
                info!(endpoint = %self.ner_endpoint, "using hosted NER");
                Ok(Box::new(HostedRecognizer::new(
                    self.ner_endpoint.clone(),
                    self.hf_token.clone(),
                )))
            }
        }
    }

    pub fn sentiment(&self) -> anyhow::Result<LexiconSentiment> {
        let base = LexiconSentiment::new();
        match &self.sentiment_lexicon {
            Some(path) => base.with_overrides_file(path),
            None => Ok(base),
        }
    }
}

#[cfg(feature = "onnx")]
fn local_recognizer(dir: &std::path::Path) -> anyhow::Result<Box<dyn EntityRecognizer>> {
    info!(dir = %dir.display(), "loading local NER model");
    Ok(Box::new(wayfarer_ai::OnnxRecognizer::load(dir)?))
}

#[cfg(not(feature = "onnx"))]
fn local_recognizer(dir: &std::path::Path) -> anyhow::Result<Box<dyn EntityRecognizer>> {
    bail!(
        "--ner-model-dir {} given, but wayfarer was built without the `onnx` feature",
        dir.display()
    )
}
