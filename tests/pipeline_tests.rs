use chrono::{TimeZone, Utc};

use archetype_engine::archetypes::model::{
    BridgeRule, Evidence, HumanArchetypeResult, HumanArchetypeState, SystemArchetypeDefinition,
    SystemArchetypeThresholds,
};
use archetype_engine::archetypes::SignalMap;
use archetype_engine::config::{BridgeSettings, EngineConfig, SystemMapperConfig};
use archetype_engine::signals::{SignalKind, META_LENGTH};
use archetype_engine::{
    analyze_chaos, bridge_signals, extract_signals, map_system_archetypes, run_pipeline, Catalogs,
    PipelineReport,
};

const STRESSED: &str = "Too much pressure, overload everywhere, need help! Delays and quality defects.";

fn in_unit(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

fn run(text: &str) -> PipelineReport {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    run_pipeline(text, &Catalogs::builtin(at), &EngineConfig::default(), None, at).unwrap()
}

fn assert_bounded(report: &PipelineReport) {
    assert!(report.signals.signals.iter().all(|s| in_unit(s.score)));
    assert!(in_unit(report.chaos.intensity) && in_unit(report.chaos.volatility));
    for r in &report.human_state.results {
        assert!(in_unit(r.confidence) && in_unit(r.intensity));
        assert!(r.evidence.iter().all(|(_, v)| in_unit(v)));
    }
    assert!(in_unit(report.human_state.pressure) && in_unit(report.human_state.instability));
    assert!(report.system_signals.iter().all(|(k, v)| !k.is_empty() && in_unit(v)));
    for r in &report.system_state.results {
        assert!(in_unit(r.confidence));
        assert!(r.evidence.iter().all(|(_, v)| in_unit(v)));
    }
    assert!(in_unit(report.system_state.pressure) && in_unit(report.system_state.instability));
    let field = &report.visual.field;
    assert!(in_unit(field.chaos) && in_unit(field.density) && in_unit(field.noise_amp));
}

#[test]
fn test_scores_stay_bounded_for_any_text() {
    let texts = [
        "",
        "!!!???",
        "everything looks fine",
        STRESSED,
        "risk risk risk risk risk risk risk risk risk risk risk risk risk risk risk",
        "Ünïcødé stock-outs, défaut de qualité, 遅延 delay!",
    ];
    for text in texts {
        let report = run(text);
        assert_bounded(&report);

        let human = &report.human_state.results;
        assert!(human.len() <= 5);
        assert!(human.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        let system = &report.system_state.results;
        assert!(system.len() <= 3);
        assert!(system.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert!(report.system_signals.len() <= 6);
    }
}

#[test]
fn test_inventory_scenario_extraction() {
    let report = extract_signals("inventory is low and delays are increasing").unwrap();
    assert!(report.score_of(SignalKind::Keyword, "inventory").unwrap() >= 0.0);
    assert!(report.score_of(SignalKind::Keyword, "delay").unwrap() >= 0.0);
    // 42 characters
    assert_eq!(report.meta_score(META_LENGTH), 0.6);
}

#[test]
fn test_calm_text_has_no_dominant_signal() {
    let result = analyze_chaos("everything looks fine", &[]);
    assert_eq!(result.dominant_signal, None);
    assert_eq!(result.affected_objects.len(), (result.intensity * 10.0).ceil() as usize);
}

#[test]
fn test_bridge_rule_scenario() {
    let state = HumanArchetypeState {
        timestamp: Utc::now(),
        results: vec![HumanArchetypeResult {
            archetype_id: "ha_x".into(),
            confidence: 0.9,
            intensity: 0.5,
            evidence: Evidence::new(),
        }],
        pressure: 0.5,
        instability: 0.0,
    };
    let rules = vec![BridgeRule {
        human_archetype_id: "ha_x".into(),
        system_signals: [("x", 1.0)].into_iter().collect(),
    }];
    let signals = bridge_signals(&state, &rules, &BridgeSettings::default());
    assert_eq!(signals.get("x"), Some(0.5));
}

#[test]
fn test_full_evidence_yields_full_confidence() {
    let definition = SystemArchetypeDefinition {
        id: "p".into(),
        name: "Pattern".into(),
        description: String::new(),
        required_signals: vec!["a".into(), "b".into(), "c".into()],
        weights: [("a", 0.3), ("b", 0.7), ("c", 0.45)].into_iter().collect(),
        thresholds: SystemArchetypeThresholds {
            min_confidence: 0.4,
            activation: [("a", 0.9), ("b", 0.9)].into_iter().collect(),
        },
        loops_template: vec![],
    };
    let signals: SignalMap = [("a", 1.0), ("b", 1.0), ("c", 1.0)].into_iter().collect();
    let state = map_system_archetypes(&signals, &[definition], None, &SystemMapperConfig::default(), Utc::now());
    assert!((state.results[0].confidence - 1.0).abs() < 1e-12);
}

#[test]
fn test_stressed_text_reaches_the_visual_layer() {
    let report = run(STRESSED);

    assert!(!report.human_state.results.is_empty());
    assert!(!report.system_state.results.is_empty());

    let top = &report.system_state.results[0];
    assert_eq!(report.visual.focus.as_deref(), Some(top.archetype_id.as_str()));
    assert_eq!(report.visual.nodes.len(), report.system_state.results.len());
    assert_eq!(report.visual.flows.len(), report.visual.nodes.len() - 1);
    assert!(report.visual.flows.iter().all(|f| f.from == top.archetype_id));
}

#[test]
fn test_unmatched_text_projects_an_empty_scene() {
    let report = run("the weather is nice today");
    assert!(report.system_state.results.is_empty());
    assert_eq!(report.visual.focus, None);
    assert!(report.visual.nodes.is_empty());
    assert!((report.visual.field.density - 0.3).abs() < 1e-12);
}
