//! AI layer: named-entity recognition over blog text and sentiment polarity
//! for review text.

pub mod labels;
pub mod recognizer;
pub mod sentiment;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxRecognizer;

pub use labels::{NerLabels, TokenPrediction, group_entities, stitch_windows};
pub use recognizer::{EntityRecognizer, HostedRecognizer};
pub use sentiment::{LexiconSentiment, SentimentScorer};
