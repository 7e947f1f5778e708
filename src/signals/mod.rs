//! Signal Module
//!
//! Lexical signal extraction from free text, plus the report types the
//! archetype scorers consume.

pub mod registry;
pub mod extractor;

pub use registry::{LexicalEntry, LexicalRegistry};
pub use extractor::{extract_signals, tokenize, LexicalHit, SignalExtractor};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Meta signal names emitted for every report
pub const META_EXCLAMATION: &str = "exclamation_count";
pub const META_QUESTION: &str = "question_count";
pub const META_LENGTH: &str = "length_bucket";

/// How a signal was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Keyword,
    Phrase,
    Pattern,
    Meta,
}

/// Semantic polarity of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Polarity {
    /// Bias applied to a signal's chaos contribution
    pub fn multiplier(&self) -> f64 {
        match self {
            Polarity::Positive => 1.12,
            Polarity::Negative => 0.88,
            Polarity::Neutral => 0.95,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
            Polarity::Neutral => write!(f, "neutral"),
        }
    }
}

/// A single extracted signal. `score` is always within [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub value: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalMeta {
    /// Length of the text in characters
    pub length: usize,
    pub exclamation_count: usize,
    pub question_count: usize,
}

/// Extraction output for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub text: String,
    pub signals: Vec<Signal>,
    pub meta: SignalMeta,
}

impl SignalReport {
    /// Distinct values of every signal of `kind`
    pub fn values_of(&self, kind: SignalKind) -> BTreeSet<&str> {
        self.signals
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.value.as_str())
            .collect()
    }

    /// Score of the first signal with this kind and value
    pub fn score_of(&self, kind: SignalKind, value: &str) -> Option<f64> {
        self.signals
            .iter()
            .find(|s| s.kind == kind && s.value == value)
            .map(|s| s.score)
    }

    /// Meta score by name, 0.0 when absent
    pub fn meta_score(&self, name: &str) -> f64 {
        self.score_of(SignalKind::Meta, name).unwrap_or(0.0)
    }
}
