//! Chaos Aggregator
//!
//! Turns text (and optional history) into an intensity/volatility pair.
//! Signal contributions are shaped with exponential saturation, polarity
//! bias and pairwise geometric-mean synergy, then squashed through a
//! logistic curve. Volatility is normalised Shannon entropy damped by the
//! dominance of the strongest signal.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::signals::{tokenize, Polarity, SignalExtractor};
use crate::utils::clamp::{clamp_unit, ensure_finite};
use crate::utils::sampler::HashSampler;

const MATCH_DECAY: f64 = 0.8;
const SYNERGY_EXPONENT: f64 = 1.5;
const SYNERGY_GAIN: f64 = 0.25;
const SIGMOID_SLOPE: f64 = 1.1;
const SIGMOID_CENTER: f64 = 0.6;
const HISTORY_STEP: f64 = 0.01;
const HISTORY_CAP: f64 = 0.1;
const DOMINANCE_EXPONENT: f64 = 0.7;
const VOLATILITY_GAIN: f64 = 1.1;
const ENTROPY_EPS: f64 = 1e-12;
const DOMINANT_FLOOR: f64 = 0.05;
const MAX_AFFECTED_OBJECTS: f64 = 10.0;
/// Sampler indices for object ids start here
const OBJECT_INDEX_OFFSET: u32 = 1000;
const EXPLANATION_TOP: usize = 3;
const EXPLANATION_DELIMITER: &str = " | ";

/// A candidate signal the aggregator scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosSignal {
    pub keyword: String,
    pub weight: f64,
    #[serde(default)]
    pub polarity: Polarity,
}

impl ChaosSignal {
    pub fn new(keyword: impl Into<String>, weight: f64, polarity: Polarity) -> Self {
        Self {
            keyword: keyword.into(),
            weight,
            polarity,
        }
    }
}

/// Authoritative output of the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosResult {
    pub intensity: f64,
    pub volatility: f64,
    pub dominant_signal: Option<String>,
    pub affected_objects: Vec<String>,
    pub explanation: String,
}

/// Stateless aggregator: a fallback signal set plus the extractor used to
/// discover signals in text.
#[derive(Debug, Clone)]
pub struct ChaosEngine {
    fallback: Vec<ChaosSignal>,
    extractor: SignalExtractor,
}

impl ChaosEngine {
    pub fn new(fallback: Vec<ChaosSignal>) -> Self {
        Self {
            fallback,
            extractor: SignalExtractor::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: SignalExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn fallback_signals(&self) -> &[ChaosSignal] {
        &self.fallback
    }

    /// Signals found in the text, or the fallback set when nothing matched.
    fn candidates(&self, text: &str) -> Vec<ChaosSignal> {
        let extracted: Vec<ChaosSignal> = self
            .extractor
            .detect(text)
            .into_iter()
            .map(|hit| ChaosSignal::new(hit.name, hit.strength, hit.polarity))
            .collect();
        if extracted.is_empty() {
            self.fallback.clone()
        } else {
            extracted
        }
    }

    /// Pure analysis; identical arguments give bit-identical results.
    pub fn analyze(&self, text: &str, history: &[String]) -> ChaosResult {
        let sampler = HashSampler::from_input(text, history);

        let tokens = tokenize(text);
        let mut token_counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *token_counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let contributions = Self::contributions(&self.candidates(text), &tokens, &token_counts);

        let synergy = Self::synergy(&contributions);
        let weighted_sum: f64 = contributions.iter().map(|(_, v)| v).sum();
        let aggregated = ensure_finite(weighted_sum * synergy, 0.0);

        let mut raw_intensity = 1.0 / (1.0 + (-(SIGMOID_SLOPE * (aggregated - SIGMOID_CENTER))).exp());
        if !history.is_empty() {
            raw_intensity += HISTORY_CAP.min(history.len() as f64 * HISTORY_STEP);
        }
        let intensity = clamp_unit(raw_intensity);
        let volatility = Self::volatility(&contributions);

        let dominant_signal = Self::dominant(&contributions);

        let count = (intensity * MAX_AFFECTED_OBJECTS).ceil() as u32;
        let affected_objects = (0..count)
            .map(|k| {
                let r = sampler.sample(OBJECT_INDEX_OFFSET + k);
                format!("obj_{:05}", (r * 100_000.0) as u64)
            })
            .collect();

        let explanation = Self::explain(&contributions, intensity, volatility);

        debug!(
            "Chaos analysis: intensity={:.3} volatility={:.3} dominant={:?}",
            intensity, volatility, dominant_signal
        );

        ChaosResult {
            intensity,
            volatility,
            dominant_signal,
            affected_objects,
            explanation,
        }
    }

    /// Ordered (keyword, contribution) pairs. A repeated keyword overwrites in place.
    fn contributions(
        candidates: &[ChaosSignal],
        tokens: &[String],
        token_counts: &HashMap<&str, usize>,
    ) -> Vec<(String, f64)> {
        let mut contributions: Vec<(String, f64)> = Vec::with_capacity(candidates.len());
        for signal in candidates {
            let key = signal.keyword.to_lowercase();
            let exact = token_counts.get(key.as_str()).copied().unwrap_or(0);
            let substring = if exact == 0 && key.chars().count() >= 3 {
                tokens.iter().filter(|t| t.contains(key.as_str())).count()
            } else {
                0
            };
            let occurrences = (exact + substring) as f64;

            let match_strength = 1.0 - (-MATCH_DECAY * occurrences).exp();
            let weight = ensure_finite(signal.weight.max(0.0), 0.0);
            let raw = ensure_finite(match_strength * weight, 0.0);
            let contribution = ensure_finite(raw * signal.polarity.multiplier(), 0.0).max(0.0);

            match contributions.iter_mut().find(|(k, _)| *k == signal.keyword) {
                Some(slot) => slot.1 = contribution,
                None => contributions.push((signal.keyword.clone(), contribution)),
            }
        }
        contributions
    }

    /// Product of `1 + gm^1.5 * 0.25` over every pair of positive contributions.
    fn synergy(contributions: &[(String, f64)]) -> f64 {
        let mut synergy = 1.0;
        for (i, (_, a)) in contributions.iter().enumerate() {
            for (_, b) in &contributions[i + 1..] {
                if *a > 0.0 && *b > 0.0 {
                    let gm = (a * b).sqrt();
                    synergy *= 1.0 + gm.powf(SYNERGY_EXPONENT) * SYNERGY_GAIN;
                }
            }
        }
        ensure_finite(synergy, 1.0)
    }

    fn volatility(contributions: &[(String, f64)]) -> f64 {
        let values: Vec<f64> = contributions.iter().map(|(_, v)| *v).filter(|v| *v > 0.0).collect();
        if values.is_empty() {
            return 0.0;
        }

        let total: f64 = values.iter().sum();
        let n = values.len();
        let norm = if n > 1 { (n as f64).ln() } else { 1.0 };
        let entropy = -values
            .iter()
            .map(|v| {
                let p = v / total;
                p * (p + ENTROPY_EPS).ln()
            })
            .sum::<f64>()
            / norm;

        let largest = values.iter().cloned().fold(0.0, f64::max);
        let dominance = largest / total;

        let raw = entropy * (1.0 - dominance.powf(DOMINANCE_EXPONENT));
        clamp_unit((raw * VOLATILITY_GAIN).tanh())
    }

    /// First arg-max contribution, if it clears the floor.
    fn dominant(contributions: &[(String, f64)]) -> Option<String> {
        let mut best: Option<&(String, f64)> = None;
        for entry in contributions {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.filter(|(_, v)| *v > DOMINANT_FLOOR).map(|(k, _)| k.clone())
    }

    fn explain(contributions: &[(String, f64)], intensity: f64, volatility: f64) -> String {
        let mut ranked: Vec<&(String, f64)> = contributions.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut parts: Vec<String> = ranked
            .iter()
            .take(EXPLANATION_TOP)
            .map(|(name, value)| format!("{}({:.2})", name, value))
            .collect();
        parts.push(format!("intensity={:.2}", intensity));
        parts.push(format!("volatility={:.2}", volatility));
        parts.join(EXPLANATION_DELIMITER)
    }
}

impl Default for ChaosEngine {
    fn default() -> Self {
        Self::new(vec![
            ChaosSignal::new("risk", 1.0, Polarity::Negative),
            ChaosSignal::new("delay", 0.9, Polarity::Negative),
            ChaosSignal::new("inventory", 0.7, Polarity::Neutral),
            ChaosSignal::new("quality", 0.8, Polarity::Negative),
            ChaosSignal::new("urgent", 0.6, Polarity::Positive),
        ])
    }
}

/// Analyze with the default engine.
pub fn analyze_chaos(text: &str, history: &[String]) -> ChaosResult {
    ChaosEngine::default().analyze(text, history)
}
