//! Review sentiment polarity.
//!
//! [`LexiconSentiment`] is a pattern-style lexicon scorer: each known
//! opinion word contributes its polarity, an immediately preceding
//! intensifier scales it, and a nearby negation flips and dampens it
//! (× −0.5). The text's polarity is the mean contribution, in `[-1, 1]`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use tracing::info;

/// Maps text to a polarity in `[-1.0, 1.0]`. Text with no signal is `0.0`.
pub trait SentimentScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

impl<T: SentimentScorer + ?Sized> SentimentScorer for Box<T> {
    fn polarity(&self, text: &str) -> f64 {
        (**self).polarity(text)
    }
}

/// Negations look back this many tokens.
const NEGATION_WINDOW: usize = 3;
const NEGATION_FACTOR: f64 = -0.5;

const LEXICON: &[(&str, f64)] = &[
    // positive
    ("amazing", 0.6),
    ("authentic", 0.5),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("breathtaking", 0.9),
    ("calm", 0.3),
    ("charming", 0.5),
    ("clean", 0.37),
    ("comfortable", 0.4),
    ("cozy", 0.5),
    ("delicious", 1.0),
    ("enjoy", 0.4),
    ("enjoyed", 0.4),
    ("excellent", 1.0),
    ("fantastic", 0.4),
    ("fun", 0.3),
    ("friendly", 0.375),
    ("gorgeous", 0.7),
    ("great", 0.8),
    ("good", 0.7),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("impressive", 1.0),
    ("incredible", 0.9),
    ("interesting", 0.5),
    ("liked", 0.3),
    ("love", 0.5),
    ("loved", 0.7),
    ("lovely", 0.5),
    ("magical", 0.5),
    ("memorable", 0.5),
    ("nice", 0.6),
    ("peaceful", 0.5),
    ("perfect", 1.0),
    ("pleasant", 0.73),
    ("recommend", 0.4),
    ("recommended", 0.4),
    ("relaxing", 0.5),
    ("spectacular", 0.8),
    ("stunning", 0.5),
    ("superb", 1.0),
    ("welcoming", 0.5),
    ("wonderful", 1.0),
    ("worth", 0.3),
    // negative
    ("annoying", -0.8),
    ("awful", -1.0),
    ("bad", -0.7),
    ("boring", -1.0),
    ("cold", -0.6),
    ("crowded", -0.4),
    ("dangerous", -0.6),
    ("dirty", -0.6),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("disgusting", -1.0),
    ("dull", -0.5),
    ("expensive", -0.5),
    ("hate", -0.8),
    ("hated", -0.9),
    ("horrible", -1.0),
    ("mediocre", -0.4),
    ("noisy", -0.5),
    ("overpriced", -0.6),
    ("poor", -0.4),
    ("rude", -0.3),
    ("sad", -0.5),
    ("scam", -0.8),
    ("terrible", -1.0),
    ("touristy", -0.3),
    ("ugly", -0.7),
    ("unfriendly", -0.5),
    ("unpleasant", -0.7),
    ("unsafe", -0.6),
    ("waste", -0.6),
    ("worse", -0.4),
    ("worst", -1.0),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("incredibly", 1.4),
    ("quite", 1.1),
    ("really", 1.2),
    ("so", 1.2),
    ("super", 1.3),
    ("totally", 1.3),
    ("truly", 1.3),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &[
    "cannot", "hardly", "neither", "never", "no", "none", "nor", "not", "nothing",
];

/// Lexicon-based polarity scorer.
#[derive(Debug, Clone)]
pub struct LexiconSentiment {
    lexicon: HashMap<String, f64>,
    intensifiers: HashMap<String, f64>,
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconSentiment {
    /// Scorer with the built-in travel-review lexicon.
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().map(|&(w, p)| (w.to_string(), p)).collect(),
            intensifiers: INTENSIFIERS
                .iter()
                .map(|&(w, f)| (w.to_string(), f))
                .collect(),
        }
    }

    /// Add or replace one lexicon entry. Polarity is clamped to `[-1, 1]`.
    pub fn with_entry(mut self, word: &str, polarity: f64) -> Self {
        self.lexicon
            .insert(word.to_lowercase(), polarity.clamp(-1.0, 1.0));
        self
    }

    /// Merge entries from a JSON object file (`{"word": polarity, ...}`).
    pub fn with_overrides_file(self, path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading sentiment lexicon {}", path.display()))?;
        let entries: HashMap<String, f64> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing sentiment lexicon {}", path.display()))?;

        info!(
            entries = entries.len(),
            path = %path.display(),
            "loaded sentiment lexicon overrides"
        );
        Ok(entries
            .into_iter()
            .fold(self, |acc, (word, polarity)| acc.with_entry(&word, polarity)))
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }
}

impl SentimentScorer for LexiconSentiment {
    fn polarity(&self, text: &str) -> f64 {
        let tokens = tokenize(text);

        let mut sum = 0.0;
        let mut count = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.lexicon.get(token) else {
                continue;
            };

            let mut value = base;
            if i > 0
                && let Some(&factor) = self.intensifiers.get(&tokens[i - 1])
            {
                value *= factor;
            }
            let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
            if window.iter().any(|t| is_negation(t)) {
                value *= NEGATION_FACTOR;
            }

            sum += value.clamp(-1.0, 1.0);
            count += 1;
        }

        if count == 0 {
            return 0.0;
        }
        (sum / count as f64).clamp(-1.0, 1.0)
    }
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

/// Lower-cased words; apostrophes are kept inside words so contractions
/// like "didn't" survive as negations.
fn tokenize(text: &str) -> Vec<String> {
    text.replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphabetic() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
