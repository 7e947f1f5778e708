//! Lexical Registry
//!
//! Named signals with their matching variants, base weight and polarity.

use serde::{Deserialize, Serialize};

use super::{Polarity, SignalKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    pub name: String,
    /// `Keyword` entries match tokens, `Phrase` entries match raw text
    pub kind: SignalKind,
    pub variants: Vec<String>,
    pub base_weight: f64,
    #[serde(default)]
    pub polarity: Polarity,
}

impl LexicalEntry {
    pub fn keyword(name: &str, variants: &[&str], base_weight: f64, polarity: Polarity) -> Self {
        Self {
            name: name.to_string(),
            kind: SignalKind::Keyword,
            variants: variants.iter().map(|v| v.to_string()).collect(),
            base_weight,
            polarity,
        }
    }

    pub fn phrase(name: &str, variants: &[&str], base_weight: f64, polarity: Polarity) -> Self {
        Self {
            kind: SignalKind::Phrase,
            ..Self::keyword(name, variants, base_weight, polarity)
        }
    }
}

/// Ordered set of entries; iteration order is the order signals are emitted in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalRegistry {
    entries: Vec<LexicalEntry>,
}

impl LexicalRegistry {
    /// Build a registry. Later entries with an already-seen name are dropped.
    pub fn new(entries: Vec<LexicalEntry>) -> Self {
        let mut unique: Vec<LexicalEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.name.trim().is_empty() || unique.iter().any(|e| e.name == entry.name) {
                continue;
            }
            unique.push(entry);
        }
        Self { entries: unique }
    }

    pub fn entries(&self) -> &[LexicalEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&LexicalEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn polarity_of(&self, name: &str) -> Polarity {
        self.get(name).map(|e| e.polarity).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LexicalRegistry {
    fn default() -> Self {
        use Polarity::*;
        Self::new(vec![
            LexicalEntry::keyword("inventory", &["inventory", "stock", "out_of_stock", "shortage", "backorder"], 0.8, Neutral),
            LexicalEntry::keyword("quality", &["quality", "defect", "defective", "failure", "reject"], 0.9, Negative),
            LexicalEntry::keyword("delay", &["delay", "delayed", "late", "lag", "lagging", "postpone"], 0.85, Negative),
            LexicalEntry::keyword("risk", &["risk", "risky", "exposure", "threat", "danger", "unsafe"], 1.0, Negative),
            LexicalEntry::keyword("pressure", &["pressure", "stress", "pressure_high"], 0.7, Neutral),
            LexicalEntry::keyword("trust", &["trust", "confidence", "reliable", "faith"], 0.5, Positive),
            LexicalEntry::keyword("urgent", &["urgent", "asap", "immediately"], 0.6, Positive),
            LexicalEntry::keyword("overload", &["overload", "overloaded", "burnout"], 0.7, Neutral),
            LexicalEntry::phrase("not_sure", &["not sure", "uncertain", "don't know"], 0.6, Neutral),
            LexicalEntry::phrase("need_help", &["need help", "need support", "can't handle"], 0.7, Negative),
            LexicalEntry::phrase("under_pressure", &["under pressure", "too much pressure", "too much"], 0.8, Negative),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_are_dropped() {
        let registry = LexicalRegistry::new(vec![
            LexicalEntry::keyword("risk", &["risk"], 1.0, Polarity::Negative),
            LexicalEntry::keyword("risk", &["danger"], 0.2, Polarity::Positive),
            LexicalEntry::keyword("  ", &["blank"], 0.2, Polarity::Positive),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.polarity_of("risk"), Polarity::Negative);
    }

    #[test]
    fn test_default_registry_kinds() {
        let registry = LexicalRegistry::default();
        assert_eq!(registry.get("inventory").unwrap().kind, SignalKind::Keyword);
        assert_eq!(registry.get("need_help").unwrap().kind, SignalKind::Phrase);
        assert_eq!(registry.polarity_of("unknown"), Polarity::Neutral);
    }
}
