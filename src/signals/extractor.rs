//! Signal Extractor
//!
//! Tokenizes text, matches it against a lexical registry and emits named
//! signals with sub-linear (sqrt) strength growth for repeated hits.

use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{InputResult, InvalidInput};
use crate::utils::clamp::{clamp, clamp_unit, ensure_finite};

use super::{
    LexicalEntry, LexicalRegistry, Polarity, Signal, SignalKind, SignalMeta, SignalReport,
    META_EXCLAMATION, META_LENGTH, META_QUESTION,
};

/// Default character limit for a single text
pub const MAX_TEXT_CHARS: usize = 4000;

/// Upper bound of a raw registry strength
const MAX_STRENGTH: f64 = 4.0;

/// Registry match with its unclamped strength in [0,4]
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
    pub name: String,
    pub kind: SignalKind,
    pub strength: f64,
    pub polarity: Polarity,
}

/// Split on anything that is not alphanumeric or `_`, lowercased. Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.to_lowercase().chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn length_bucket(length: usize) -> f64 {
    if length <= 40 {
        0.3
    } else if length <= 120 {
        0.6
    } else {
        0.9
    }
}

#[derive(Debug, Clone)]
pub struct SignalExtractor {
    registry: LexicalRegistry,
    /// Compiled phrase matchers, indexed like `registry.entries()`
    phrase_matchers: Vec<Vec<Regex>>,
    max_text_chars: usize,
}

impl SignalExtractor {
    pub fn new(registry: LexicalRegistry, max_text_chars: usize) -> Self {
        let phrase_matchers = registry
            .entries()
            .iter()
            .map(Self::compile_phrases)
            .collect();
        Self {
            registry,
            phrase_matchers,
            max_text_chars,
        }
    }

    fn compile_phrases(entry: &LexicalEntry) -> Vec<Regex> {
        if entry.kind != SignalKind::Phrase {
            return Vec::new();
        }
        entry
            .variants
            .iter()
            .filter(|v| !v.is_empty())
            .filter_map(|v| match Regex::new(&regex::escape(&v.to_lowercase())) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping phrase variant '{}' of '{}': {}", v, entry.name, e);
                    None
                }
            })
            .collect()
    }

    pub fn registry(&self) -> &LexicalRegistry {
        &self.registry
    }

    /// Registry matches for `text`. Never fails; unmatched text yields an empty list.
    pub fn detect(&self, text: &str) -> Vec<LexicalHit> {
        let tokens = tokenize(text);
        let mut frequency: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *frequency.entry(token.as_str()).or_insert(0) += 1;
        }
        let lowered = text.to_lowercase();

        let mut hits = Vec::new();
        for (entry, matchers) in self.registry.entries().iter().zip(&self.phrase_matchers) {
            let count = match entry.kind {
                SignalKind::Phrase => matchers.iter().map(|re| re.find_iter(&lowered).count()).sum(),
                _ => Self::count_keyword(entry, &tokens, &frequency),
            };
            if count == 0 {
                continue;
            }

            let strength = clamp(
                ensure_finite(entry.base_weight * (count as f64).sqrt(), 0.0),
                0.0,
                MAX_STRENGTH,
            );
            hits.push(LexicalHit {
                name: entry.name.clone(),
                kind: entry.kind,
                strength,
                polarity: entry.polarity,
            });
        }
        hits
    }

    /// Exact token occurrences across variants; substring hits only when there are none.
    fn count_keyword(entry: &LexicalEntry, tokens: &[String], frequency: &HashMap<&str, usize>) -> usize {
        let variants: Vec<String> = entry
            .variants
            .iter()
            .map(|v| v.to_lowercase())
            .filter(|v| !v.is_empty())
            .collect();

        let exact: usize = variants
            .iter()
            .map(|v| frequency.get(v.as_str()).copied().unwrap_or(0))
            .sum();
        if exact > 0 {
            return exact;
        }

        variants
            .iter()
            .map(|v| tokens.iter().filter(|t| t.contains(v.as_str())).count())
            .sum()
    }

    /// Full report: registry signals followed by the three meta signals.
    pub fn extract(&self, text: &str) -> InputResult<SignalReport> {
        let length = text.chars().count();
        if length > self.max_text_chars {
            return Err(InvalidInput::TextTooLong {
                length,
                max: self.max_text_chars,
            });
        }

        let exclamation_count = text.chars().filter(|c| *c == '!').count();
        let question_count = text.chars().filter(|c| *c == '?').count();

        let mut signals: Vec<Signal> = self
            .detect(text)
            .into_iter()
            .map(|hit| Signal {
                kind: hit.kind,
                value: hit.name,
                score: clamp_unit(hit.strength),
            })
            .collect();

        signals.push(Signal {
            kind: SignalKind::Meta,
            value: META_EXCLAMATION.to_string(),
            score: clamp_unit(exclamation_count as f64 / 5.0),
        });
        signals.push(Signal {
            kind: SignalKind::Meta,
            value: META_QUESTION.to_string(),
            score: clamp_unit(question_count as f64 / 5.0),
        });
        signals.push(Signal {
            kind: SignalKind::Meta,
            value: META_LENGTH.to_string(),
            score: length_bucket(length),
        });

        debug!("Extracted {} signals from {} chars", signals.len(), length);

        Ok(SignalReport {
            text: text.to_string(),
            signals,
            meta: SignalMeta {
                length,
                exclamation_count,
                question_count,
            },
        })
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new(LexicalRegistry::default(), MAX_TEXT_CHARS)
    }
}

/// Extract with the default registry and character limit.
pub fn extract_signals(text: &str) -> InputResult<SignalReport> {
    SignalExtractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Out_of_stock!! Delay, delay?"), vec!["out_of_stock", "delay", "delay"]);
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_inventory_and_delay_scenario() {
        let text = "inventory is low and delays are increasing";
        let report = extract_signals(text).unwrap();

        assert!(report.score_of(SignalKind::Keyword, "inventory").unwrap() >= 0.0);
        assert!(report.score_of(SignalKind::Keyword, "delay").unwrap() >= 0.0);
        // 42 characters lands in the middle bucket
        assert_eq!(report.meta.length, 42);
        assert_eq!(report.meta_score(META_LENGTH), 0.6);
        assert_eq!(report.meta_score(META_EXCLAMATION), 0.0);
    }

    #[test]
    fn test_sqrt_dampening_and_clip() {
        let extractor = SignalExtractor::default();
        let hits = extractor.detect("risk risk risk risk");
        let risk = hits.iter().find(|h| h.name == "risk").unwrap();
        assert!((risk.strength - 2.0).abs() < 1e-12);

        let flood = "risk ".repeat(100);
        let hits = extractor.detect(&flood);
        assert_eq!(hits[0].strength, 4.0);
    }

    #[test]
    fn test_substring_fallback_only_without_exact_hits() {
        let extractor = SignalExtractor::default();
        // "delayed" is itself a variant, so the exact count wins
        let hits = extractor.detect("delayed shipments");
        let delay = hits.iter().find(|h| h.name == "delay").unwrap();
        assert!((delay.strength - 0.85).abs() < 1e-12);

        let hits = extractor.detect("stockpile stockroom");
        let inventory = hits.iter().find(|h| h.name == "inventory").unwrap();
        assert!((inventory.strength - 0.8 * 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_phrases_and_meta() {
        let report = extract_signals("I need help!! Not sure what to do?").unwrap();
        assert!(report.score_of(SignalKind::Phrase, "need_help").is_some());
        assert!(report.score_of(SignalKind::Phrase, "not_sure").is_some());
        assert!((report.meta_score(META_EXCLAMATION) - 0.4).abs() < 1e-12);
        assert!((report.meta_score(META_QUESTION) - 0.2).abs() < 1e-12);
        assert_eq!(report.meta_score(META_LENGTH), 0.3);
    }

    #[test]
    fn test_oversized_text_is_rejected() {
        let text = "a".repeat(MAX_TEXT_CHARS + 1);
        let err = extract_signals(&text).unwrap_err();
        assert_eq!(err, InvalidInput::TextTooLong { length: MAX_TEXT_CHARS + 1, max: MAX_TEXT_CHARS });
        assert!(extract_signals(&"a".repeat(MAX_TEXT_CHARS)).is_ok());
    }

    #[test]
    fn test_empty_text_yields_only_meta() {
        let report = extract_signals("").unwrap();
        assert_eq!(report.signals.len(), 3);
        assert!(report.signals.iter().all(|s| s.kind == SignalKind::Meta));
        assert_eq!(report.meta, SignalMeta::default());
    }
}
