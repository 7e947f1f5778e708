//! Archetype Data Model
//!
//! Catalog definitions (human, bridge, system), per-definition results and the
//! aggregate state produced by each scoring call. Catalog types carry a
//! `validated` constructor used by the store at load time; the scorers assume
//! validated input but still clamp every numeric read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{InputResult, InvalidInput};
use crate::utils::clamp::{clamp, clamp_unit};

/// Named scores keyed by signal name.
///
/// Used for system signals (bridge output), weights, activation thresholds and
/// evidence. Keys iterate in name order so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalMap(BTreeMap<String, f64>);

/// Bridge output: system signal name → value in [0,1]
pub type SystemSignals = SignalMap;
/// Matched signal name → its contribution
pub type Evidence = SignalMap;

impl SignalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `name`, 0.0 when absent
    pub fn value(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Trimmed keys and values clamped to [0,1]. Blank keys and keys that
    /// collide once trimmed are rejected.
    pub fn sanitized(self, field: &str) -> InputResult<Self> {
        let mut cleaned = BTreeMap::new();
        for (key, value) in self.0 {
            let name = key.trim();
            if name.is_empty() {
                return Err(InvalidInput::EmptyIdentifier {
                    field: format!("{} key", field),
                });
            }
            if cleaned.insert(name.to_string(), clamp_unit(value)).is_some() {
                return Err(InvalidInput::DuplicateId {
                    kind: "signal",
                    id: name.to_string(),
                });
            }
        }
        Ok(Self(cleaned))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SignalMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<BTreeMap<String, f64>> for SignalMap {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

/// A scored match against one catalog definition
pub trait Ranked {
    fn archetype_id(&self) -> &str;
    fn confidence(&self) -> f64;
}

/// Stable descending sort on confidence, then truncate. Equal confidences keep
/// their catalog order.
pub fn rank<R: Ranked>(results: &mut Vec<R>, limit: usize) {
    results.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));
    results.truncate(limit);
}

/// Output of one scoring call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateState<R> {
    pub timestamp: DateTime<Utc>,
    /// Confidence-descending, bounded by the scorer's configured maximum
    pub results: Vec<R>,
    pub pressure: f64,
    pub instability: f64,
}

impl<R: Ranked> AggregateState<R> {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            results: Vec::new(),
            pressure: 0.0,
            instability: 0.0,
        }
    }

    /// Highest-confidence result; the first one wins a tie
    pub fn top(&self) -> Option<&R> {
        self.results.iter().fold(None, |best: Option<&R>, r| match best {
            Some(b) if b.confidence() >= r.confidence() => Some(b),
            _ => Some(r),
        })
    }

    pub fn confidences(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.confidence()).collect()
    }
}

fn non_empty(value: String, field: &str) -> InputResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput::EmptyIdentifier {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn ensure_unique<'a>(ids: impl Iterator<Item = &'a str>, kind: &'static str) -> InputResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(InvalidInput::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Human catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentHint {
    Neg,
    Pos,
    Mixed,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanArchetypeSignals {
    /// Registry keyword names
    pub keywords: Vec<String>,
    /// Registry phrase names
    pub phrases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_hint: Option<SentimentHint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanArchetypeWeights {
    pub keyword_weight: f64,
    pub phrase_weight: f64,
    /// Within [0,2]
    pub intensity_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanArchetypeOutputs {
    pub default_intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanArchetypeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub signals: HumanArchetypeSignals,
    pub weights: HumanArchetypeWeights,
    pub outputs: HumanArchetypeOutputs,
    #[serde(default = "default_true")]
    pub editable: bool,
}

impl HumanArchetypeDefinition {
    pub fn validated(self) -> InputResult<Self> {
        let clean_names = |names: Vec<String>| -> Vec<String> {
            names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        };
        Ok(Self {
            id: non_empty(self.id, "human archetype id")?,
            name: non_empty(self.name, "human archetype name")?,
            signals: HumanArchetypeSignals {
                keywords: clean_names(self.signals.keywords),
                phrases: clean_names(self.signals.phrases),
                sentiment_hint: self.signals.sentiment_hint,
            },
            weights: HumanArchetypeWeights {
                keyword_weight: clamp_unit(self.weights.keyword_weight),
                phrase_weight: clamp_unit(self.weights.phrase_weight),
                intensity_scale: clamp(self.weights.intensity_scale, 0.0, 2.0),
            },
            outputs: HumanArchetypeOutputs {
                default_intensity: clamp_unit(self.outputs.default_intensity),
            },
            ..self
        })
    }
}

/// Versioned catalog of human archetype definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanCatalog {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<HumanArchetypeDefinition>,
}

impl HumanCatalog {
    pub fn validated(self) -> InputResult<Self> {
        let items = self
            .items
            .into_iter()
            .map(HumanArchetypeDefinition::validated)
            .collect::<InputResult<Vec<_>>>()?;
        ensure_unique(items.iter().map(|i| i.id.as_str()), "archetype")?;
        Ok(Self { items, ..self })
    }
}

// ---------------------------------------------------------------------------
// Bridge rules
// ---------------------------------------------------------------------------

/// Human archetype id → weighted system signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRule {
    pub human_archetype_id: String,
    pub system_signals: SignalMap,
}

impl BridgeRule {
    pub fn validated(self) -> InputResult<Self> {
        Ok(Self {
            human_archetype_id: non_empty(self.human_archetype_id, "human_archetype_id")?,
            system_signals: self.system_signals.sanitized("system_signals")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub rules: Vec<BridgeRule>,
}

impl BridgeConfig {
    pub fn validated(self) -> InputResult<Self> {
        if self.rules.is_empty() {
            return Err(InvalidInput::EmptyCollection {
                what: "bridge rules".to_string(),
            });
        }
        let rules = self
            .rules
            .into_iter()
            .map(BridgeRule::validated)
            .collect::<InputResult<Vec<_>>>()?;
        ensure_unique(rules.iter().map(|r| r.human_archetype_id.as_str()), "human_archetype_id")?;
        Ok(Self { rules, ..self })
    }

    pub fn rule_for(&self, archetype_id: &str) -> Option<&BridgeRule> {
        self.rules.iter().find(|r| r.human_archetype_id == archetype_id)
    }
}

// ---------------------------------------------------------------------------
// System catalog
// ---------------------------------------------------------------------------

/// Feedback loop polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopPolarity {
    /// Self-amplifying
    #[serde(rename = "R")]
    Reinforcing,
    /// Self-correcting
    #[serde(rename = "B")]
    Balancing,
}

impl std::fmt::Display for LoopPolarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopPolarity::Reinforcing => write!(f, "R"),
            LoopPolarity::Balancing => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub polarity: LoopPolarity,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_min_confidence() -> f64 {
    0.4
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemArchetypeThresholds {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Signal → minimum value; any unmet entry marks the definition blocked
    #[serde(default)]
    pub activation: SignalMap,
}

impl Default for SystemArchetypeThresholds {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            activation: SignalMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemArchetypeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub required_signals: Vec<String>,
    pub weights: SignalMap,
    #[serde(default)]
    pub thresholds: SystemArchetypeThresholds,
    #[serde(default)]
    pub loops_template: Vec<LoopTemplate>,
}

impl SystemArchetypeDefinition {
    pub fn validated(self) -> InputResult<Self> {
        let id = non_empty(self.id, "system archetype id")?;
        if self.required_signals.is_empty() {
            return Err(InvalidInput::EmptyCollection {
                what: format!("required_signals of {}", id),
            });
        }
        let required_signals = self
            .required_signals
            .into_iter()
            .map(|s| non_empty(s, "required signal"))
            .collect::<InputResult<Vec<_>>>()?;
        let loops_template = self
            .loops_template
            .into_iter()
            .map(|l| {
                Ok(LoopTemplate {
                    id: non_empty(l.id, "loop template id")?,
                    ..l
                })
            })
            .collect::<InputResult<Vec<_>>>()?;

        Ok(Self {
            id,
            name: non_empty(self.name, "system archetype name")?,
            required_signals,
            weights: self.weights.sanitized("weights")?,
            thresholds: SystemArchetypeThresholds {
                min_confidence: clamp_unit(self.thresholds.min_confidence),
                activation: self.thresholds.activation.sanitized("activation")?,
            },
            loops_template,
            ..self
        })
    }

    /// Loop type with strictly more templates, if any
    pub fn majority_loop(&self) -> Option<LoopPolarity> {
        let reinforcing = self
            .loops_template
            .iter()
            .filter(|l| l.polarity == LoopPolarity::Reinforcing)
            .count();
        let balancing = self.loops_template.len() - reinforcing;
        match reinforcing.cmp(&balancing) {
            std::cmp::Ordering::Greater => Some(LoopPolarity::Reinforcing),
            std::cmp::Ordering::Less => Some(LoopPolarity::Balancing),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemArchetypeCatalog {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<SystemArchetypeDefinition>,
}

impl SystemArchetypeCatalog {
    pub fn validated(self) -> InputResult<Self> {
        if self.items.is_empty() {
            return Err(InvalidInput::EmptyCollection {
                what: "system archetype items".to_string(),
            });
        }
        let items = self
            .items
            .into_iter()
            .map(SystemArchetypeDefinition::validated)
            .collect::<InputResult<Vec<_>>>()?;
        ensure_unique(items.iter().map(|i| i.id.as_str()), "system archetype")?;
        Ok(Self { items, ..self })
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanArchetypeResult {
    pub archetype_id: String,
    pub confidence: f64,
    pub intensity: f64,
    pub evidence: Evidence,
}

impl Ranked for HumanArchetypeResult {
    fn archetype_id(&self) -> &str {
        &self.archetype_id
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemArchetypeResult {
    pub archetype_id: String,
    pub confidence: f64,
    pub dominant_loop: LoopPolarity,
    pub evidence: Evidence,
    pub notes: String,
}

impl Ranked for SystemArchetypeResult {
    fn archetype_id(&self) -> &str {
        &self.archetype_id
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

pub type HumanArchetypeState = AggregateState<HumanArchetypeResult>;
pub type SystemArchetypeState = AggregateState<SystemArchetypeResult>;

#[cfg(test)]
mod tests {
    use super::*;

    fn system_def(id: &str) -> SystemArchetypeDefinition {
        SystemArchetypeDefinition {
            id: id.to_string(),
            name: "Pattern".to_string(),
            description: String::new(),
            required_signals: vec!["latency".to_string()],
            weights: [("latency", 1.4)].into_iter().collect(),
            thresholds: SystemArchetypeThresholds::default(),
            loops_template: vec![],
        }
    }

    #[test]
    fn test_signal_map_sanitizes_keys_and_values() {
        let map: SignalMap = [(" latency ", 1.5), ("rework", -0.2)].into_iter().collect();
        let clean = map.sanitized("weights").unwrap();
        assert_eq!(clean.get("latency"), Some(1.0));
        assert_eq!(clean.get("rework"), Some(0.0));
        assert_eq!(clean.value("missing"), 0.0);

        let blank: SignalMap = [("  ", 0.5)].into_iter().collect();
        assert!(matches!(
            blank.sanitized("weights"),
            Err(InvalidInput::EmptyIdentifier { .. })
        ));
    }

    #[test]
    fn test_signal_map_rejects_keys_equal_after_trim() {
        let map: SignalMap = [(" latency", 0.4), ("latency", 0.9)].into_iter().collect();
        assert_eq!(
            map.sanitized("system_signals").unwrap_err(),
            InvalidInput::DuplicateId { kind: "signal", id: "latency".into() }
        );
    }

    #[test]
    fn test_loop_polarity_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&LoopPolarity::Balancing).unwrap(), "\"B\"");
        let parsed: LoopPolarity = serde_json::from_str("\"R\"").unwrap();
        assert_eq!(parsed, LoopPolarity::Reinforcing);
    }

    #[test]
    fn test_system_catalog_validation() {
        let catalog = SystemArchetypeCatalog {
            version: "v".into(),
            updated_at: Utc::now(),
            items: vec![system_def(" a "), system_def("b")],
        };
        let valid = catalog.clone().validated().unwrap();
        assert_eq!(valid.items[0].id, "a");
        assert_eq!(valid.items[0].weights.get("latency"), Some(1.0));

        let dup = SystemArchetypeCatalog {
            items: vec![system_def("a"), system_def("a")],
            ..catalog.clone()
        };
        assert_eq!(
            dup.validated().unwrap_err(),
            InvalidInput::DuplicateId { kind: "system archetype", id: "a".into() }
        );

        let mut no_required = system_def("c");
        no_required.required_signals.clear();
        assert!(no_required.validated().is_err());

        let empty = SystemArchetypeCatalog { items: vec![], ..catalog };
        assert!(matches!(empty.validated(), Err(InvalidInput::EmptyCollection { .. })));
    }

    #[test]
    fn test_rank_is_stable() {
        let result = |id: &str, confidence: f64| HumanArchetypeResult {
            archetype_id: id.into(),
            confidence,
            intensity: confidence,
            evidence: Evidence::new(),
        };
        let mut results = vec![result("a", 0.5), result("b", 0.9), result("c", 0.5), result("d", 0.7)];
        rank(&mut results, 3);
        let ids: Vec<&str> = results.iter().map(|r| r.archetype_id()).collect();
        assert_eq!(ids, vec!["b", "d", "a"]);
    }

    #[test]
    fn test_majority_loop() {
        let mut def = system_def("x");
        assert_eq!(def.majority_loop(), None);
        def.loops_template = vec![
            LoopTemplate { id: "r1".into(), polarity: LoopPolarity::Reinforcing, variables: vec![], notes: None },
            LoopTemplate { id: "r2".into(), polarity: LoopPolarity::Reinforcing, variables: vec![], notes: None },
            LoopTemplate { id: "b1".into(), polarity: LoopPolarity::Balancing, variables: vec![], notes: None },
        ];
        assert_eq!(def.majority_loop(), Some(LoopPolarity::Reinforcing));
    }
}
