//! System Archetype Mapper
//!
//! Weighted match of bridged system signals against the system catalog.
//! Unmet activation thresholds discount a definition instead of excluding it,
//! so weak evidence can still surface at low rank.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::SystemMapperConfig;
use crate::utils::clamp::{clamp_unit, ensure_finite, mean, variance};

use super::model::{
    rank, Evidence, LoopPolarity, SystemArchetypeDefinition, SystemArchetypeResult, SystemArchetypeState,
    SystemSignals,
};

const MATCH_NOTES: &str = "weighted signal match";
const VARIANCE_GAIN: f64 = 3.0;

fn is_blocked(definition: &SystemArchetypeDefinition, signals: &SystemSignals) -> bool {
    definition
        .thresholds
        .activation
        .iter()
        .any(|(name, minimum)| clamp_unit(signals.value(name)) < minimum)
}

/// Sum of finite weights, 1.0 when that sum is not positive
fn total_weight(definition: &SystemArchetypeDefinition) -> f64 {
    let total: f64 = definition.weights.iter().map(|(_, w)| ensure_finite(w, 0.0)).sum();
    if total > 0.0 { total } else { 1.0 }
}

fn dominant_loop(definition: &SystemArchetypeDefinition, evidence: &Evidence, config: &SystemMapperConfig) -> LoopPolarity {
    let bucket = |names: &std::collections::BTreeSet<String>| -> f64 {
        evidence.iter().filter(|(k, _)| names.contains(*k)).map(|(_, v)| v).sum()
    };
    let mut balancing = bucket(&config.balancing_signals);
    let mut reinforcing = bucket(&config.reinforcing_signals);

    match definition.majority_loop() {
        Some(LoopPolarity::Reinforcing) => reinforcing += config.loop_bias,
        Some(LoopPolarity::Balancing) => balancing += config.loop_bias,
        None => {}
    }

    if balancing >= reinforcing {
        LoopPolarity::Balancing
    } else {
        LoopPolarity::Reinforcing
    }
}

fn match_one(
    definition: &SystemArchetypeDefinition,
    signals: &SystemSignals,
    config: &SystemMapperConfig,
) -> Option<SystemArchetypeResult> {
    let total = total_weight(definition);

    let mut contribution = 0.0;
    let mut evidence = Evidence::new();
    for (name, weight) in definition.weights.iter() {
        let weighted = ensure_finite(clamp_unit(signals.value(name)) * clamp_unit(weight), 0.0);
        contribution += weighted;
        evidence.insert(name, clamp_unit(ensure_finite(weighted / total, 0.0)));
    }

    let mut confidence = clamp_unit(ensure_finite(contribution / total, 0.0));
    if is_blocked(definition, signals) {
        confidence = clamp_unit(confidence * config.blocked_penalty);
    }

    let floor = config.min_confidence.max(definition.thresholds.min_confidence);
    if confidence < floor {
        return None;
    }

    Some(SystemArchetypeResult {
        archetype_id: definition.id.clone(),
        confidence,
        dominant_loop: dominant_loop(definition, &evidence, config),
        evidence,
        notes: MATCH_NOTES.to_string(),
    })
}

/// Rank system archetypes for the bridged signals.
///
/// With a prior state, instability is the pressure delta against it; without
/// one, it is the in-batch confidence variance. The two formulas are not
/// continuous at the point history first becomes available.
pub fn map_system_archetypes(
    signals: &SystemSignals,
    catalog: &[SystemArchetypeDefinition],
    history: Option<&SystemArchetypeState>,
    config: &SystemMapperConfig,
    at: DateTime<Utc>,
) -> SystemArchetypeState {
    let mut results: Vec<SystemArchetypeResult> =
        catalog.iter().filter_map(|def| match_one(def, signals, config)).collect();
    rank(&mut results, config.top_n.max(1));

    let confidences: Vec<f64> = results.iter().map(|r| r.confidence).collect();
    let pressure = clamp_unit(mean(&confidences));
    let instability = match history {
        Some(prior) => clamp_unit(ensure_finite((pressure - prior.pressure).abs(), 0.0)),
        None => clamp_unit(ensure_finite(variance(&confidences) * VARIANCE_GAIN, 0.0)),
    };

    debug!(
        "System mapping: {} of {} archetypes matched, pressure={:.3}, instability={:.3}",
        results.len(),
        catalog.len(),
        pressure,
        instability
    );

    SystemArchetypeState {
        timestamp: at,
        results,
        pressure,
        instability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::model::{LoopTemplate, SignalMap, SystemArchetypeThresholds};

    fn definition(id: &str, weights: &[(&str, f64)], activation: &[(&str, f64)], loops: &[LoopPolarity]) -> SystemArchetypeDefinition {
        SystemArchetypeDefinition {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            required_signals: weights.iter().map(|(k, _)| k.to_string()).collect(),
            weights: weights.iter().copied().collect(),
            thresholds: SystemArchetypeThresholds {
                min_confidence: 0.4,
                activation: activation.iter().copied().collect(),
            },
            loops_template: loops
                .iter()
                .enumerate()
                .map(|(i, p)| LoopTemplate { id: format!("l{}", i), polarity: *p, variables: vec![], notes: None })
                .collect(),
        }
    }

    fn signals(values: &[(&str, f64)]) -> SignalMap {
        values.iter().copied().collect()
    }

    #[test]
    fn test_full_evidence_gives_full_confidence() {
        let catalog = vec![definition("a", &[("latency", 0.5), ("quality_drop", 0.6)], &[("latency", 0.3)], &[])];
        let state = map_system_archetypes(
            &signals(&[("latency", 1.0), ("quality_drop", 1.0)]),
            &catalog,
            None,
            &SystemMapperConfig::default(),
            Utc::now(),
        );
        assert_eq!(state.results.len(), 1);
        let result = &state.results[0];
        assert!((result.confidence - 1.0).abs() < 1e-12);
        assert_eq!(result.notes, "weighted signal match");
        assert!((result.evidence.value("latency") - 0.5 / 1.1).abs() < 1e-12);
        assert_eq!(result.dominant_loop, LoopPolarity::Balancing);
        assert_eq!(state.instability, 0.0);
    }

    #[test]
    fn test_blocked_definition_is_discounted() {
        let catalog = vec![definition("a", &[("escalation", 1.0)], &[("latency", 0.5)], &[])];
        let values = signals(&[("escalation", 1.0)]);
        let mut config = SystemMapperConfig::default();

        assert!(map_system_archetypes(&values, &catalog, None, &config, Utc::now()).results.is_empty());

        config.min_confidence = 0.1;
        let mut lenient = catalog.clone();
        lenient[0].thresholds.min_confidence = 0.1;
        let state = map_system_archetypes(&values, &lenient, None, &config, Utc::now());
        assert!((state.results[0].confidence - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_definition_floor_raises_global_floor() {
        let mut def = definition("a", &[("latency", 1.0)], &[], &[]);
        def.thresholds.min_confidence = 0.9;
        let state = map_system_archetypes(
            &signals(&[("latency", 0.8)]),
            &[def],
            None,
            &SystemMapperConfig::default(),
            Utc::now(),
        );
        assert!(state.results.is_empty());
        assert_eq!(state.pressure, 0.0);
    }

    #[test]
    fn test_loop_template_breaks_ties() {
        use LoopPolarity::*;
        let values = signals(&[("rework", 1.0)]);
        let config = SystemMapperConfig::default();

        let r = definition("r", &[("rework", 1.0)], &[], &[Reinforcing, Reinforcing, Balancing]);
        let even = definition("even", &[("rework", 1.0)], &[], &[Reinforcing, Balancing]);
        let state = map_system_archetypes(&values, &[r, even], None, &config, Utc::now());
        assert_eq!(state.results[0].dominant_loop, Reinforcing);
        // empty buckets with no majority resolve to balancing
        assert_eq!(state.results[1].dominant_loop, Balancing);

        let escalating = definition("e", &[("escalation", 1.0)], &[], &[Balancing]);
        let state = map_system_archetypes(&signals(&[("escalation", 1.0)]), &[escalating], None, &config, Utc::now());
        assert_eq!(state.results[0].dominant_loop, Reinforcing);
    }

    #[test]
    fn test_instability_from_history_or_variance() {
        let catalog = vec![
            definition("a", &[("latency", 1.0)], &[], &[]),
            definition("b", &[("rework", 1.0)], &[], &[]),
        ];
        let values = signals(&[("latency", 1.0), ("rework", 0.5)]);
        let config = SystemMapperConfig::default();

        let fresh = map_system_archetypes(&values, &catalog, None, &config, Utc::now());
        assert!((fresh.pressure - 0.75).abs() < 1e-12);
        assert!((fresh.instability - 3.0 * 0.0625).abs() < 1e-12);

        let mut prior = fresh.clone();
        prior.pressure = 0.25;
        let followup = map_system_archetypes(&values, &catalog, Some(&prior), &config, Utc::now());
        assert!((followup.instability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_top_n_bounds_results() {
        let catalog: Vec<_> = (0..5).map(|i| definition(&format!("d{}", i), &[("latency", 1.0)], &[], &[])).collect();
        let config = SystemMapperConfig { top_n: 0, ..SystemMapperConfig::default() };
        let state = map_system_archetypes(&signals(&[("latency", 1.0)]), &catalog, None, &config, Utc::now());
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].archetype_id, "d0");
    }
}
