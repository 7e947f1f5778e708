//! Pipeline
//!
//! text → signals → chaos → human archetypes → bridged system signals →
//! system archetypes → visual state, plus an optional scene projection of the
//! chaos result with per-object memory. Pure given its arguments: the
//! timestamp is injected, so two runs with the same input serialize
//! identically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::archetypes::{
    bridge_signals, map_system_archetypes, project_visual_state, score_human_archetypes, HumanArchetypeState,
    SystemArchetypeState, SystemSignals, VisualState,
};
use crate::catalog::Catalogs;
use crate::chaos::memory::{apply_memory, remember};
use crate::chaos::{build_scene_actions, ChaosEngine, ChaosResult, MemoryConfig, ObjectMemory, SceneActions, SceneMode};
use crate::config::EngineConfig;
use crate::error::InputResult;
use crate::signals::{LexicalRegistry, SignalExtractor, SignalReport};

/// Prior context for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineHistory {
    /// Earlier texts, oldest first; feeds the chaos seed and intensity bump
    #[serde(default)]
    pub texts: Vec<String>,
    /// Previous system state; switches instability to the pressure delta
    #[serde(default)]
    pub prior_system_state: Option<SystemArchetypeState>,
    /// Object memory returned by the previous run's scene
    #[serde(default)]
    pub object_memory: ObjectMemory,
}

/// Scene actions boosted by object memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneReport {
    pub mode: SceneMode,
    pub actions: SceneActions,
    /// Updated memory; hand it back through `PipelineHistory::object_memory`
    pub memory: ObjectMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub signals: SignalReport,
    pub chaos: ChaosResult,
    pub human_state: HumanArchetypeState,
    pub system_signals: SystemSignals,
    pub system_state: SystemArchetypeState,
    pub visual: VisualState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneReport>,
}

fn project_scene(
    chaos: &ChaosResult,
    mode: SceneMode,
    prior: &ObjectMemory,
    config: &MemoryConfig,
    at: DateTime<Utc>,
) -> SceneReport {
    let actions = build_scene_actions(chaos, mode);
    let touched: Vec<String> = actions.objects.iter().map(|o| o.id.clone()).collect();
    let memory = remember(prior, &touched, chaos.intensity, at.timestamp(), config);
    SceneReport {
        mode,
        actions: apply_memory(&actions, &memory, config),
        memory,
    }
}

/// Run every stage over one text. Fails only on oversized input.
pub fn run_pipeline(
    text: &str,
    catalogs: &Catalogs,
    config: &EngineConfig,
    history: Option<&PipelineHistory>,
    at: DateTime<Utc>,
) -> InputResult<PipelineReport> {
    let extractor = SignalExtractor::new(LexicalRegistry::default(), config.extraction.max_text_chars);
    let signals = extractor.extract(text)?;

    let texts: &[String] = history.map(|h| h.texts.as_slice()).unwrap_or(&[]);
    let chaos = ChaosEngine::default().with_extractor(extractor).analyze(text, texts);

    let human_state = score_human_archetypes(&signals, &catalogs.human.items, &config.human, at);
    let system_signals = bridge_signals(&human_state, &catalogs.bridge.rules, &config.bridge);
    let system_state = map_system_archetypes(
        &system_signals,
        &catalogs.system.items,
        history.and_then(|h| h.prior_system_state.as_ref()),
        &config.system,
        at,
    );
    let visual = project_visual_state(&system_state, &catalogs.library, &config.visual);

    let no_memory = ObjectMemory::new();
    let prior_memory = history.map_or(&no_memory, |h| &h.object_memory);
    let scene = config
        .scene
        .mode
        .map(|mode| project_scene(&chaos, mode, prior_memory, &config.scene.memory, at));

    info!(
        "Pipeline: intensity={:.3} volatility={:.3} human={} system={} focus={:?}",
        chaos.intensity,
        chaos.volatility,
        human_state.results.len(),
        system_state.results.len(),
        visual.focus
    );

    Ok(PipelineReport {
        signals,
        chaos,
        human_state,
        system_signals,
        system_state,
        visual,
        scene,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidInput;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_oversized_text_fails_before_scoring() {
        let config = EngineConfig::default();
        let text = "x".repeat(config.extraction.max_text_chars + 1);
        let err = run_pipeline(&text, &Catalogs::builtin(at()), &config, None, at()).unwrap_err();
        assert!(matches!(err, InvalidInput::TextTooLong { .. }));
    }

    #[test]
    fn test_timestamp_is_injected() {
        let report = run_pipeline("risk", &Catalogs::builtin(at()), &EngineConfig::default(), None, at()).unwrap();
        assert_eq!(report.human_state.timestamp, at());
        assert_eq!(report.system_state.timestamp, at());
        assert_eq!(report.visual.t, at().timestamp() as f64);
    }

    #[test]
    fn test_prior_state_switches_instability_to_delta() {
        let catalogs = Catalogs::builtin(at());
        let config = EngineConfig::default();
        let text = "Too much pressure, overload everywhere, need help! Delays and quality defects.";

        let first = run_pipeline(text, &catalogs, &config, None, at()).unwrap();
        let history = PipelineHistory {
            texts: vec![text.to_string()],
            prior_system_state: Some(first.system_state.clone()),
            ..PipelineHistory::default()
        };
        let second = run_pipeline(text, &catalogs, &config, Some(&history), at()).unwrap();

        assert_eq!(second.system_state.pressure, first.system_state.pressure);
        assert_eq!(second.system_state.instability, 0.0);
        assert!(second.chaos.intensity >= first.chaos.intensity);
    }

    #[test]
    fn test_scene_is_opt_in_and_remembers_objects() {
        let catalogs = Catalogs::builtin(at());
        let mut config = EngineConfig::default();
        let plain = run_pipeline("risk", &catalogs, &config, None, at()).unwrap();
        assert!(plain.scene.is_none());

        config.scene.mode = Some(SceneMode::Business);
        let first = run_pipeline("risk", &catalogs, &config, None, at()).unwrap();
        let scene = first.scene.unwrap();
        let ids: Vec<&str> = scene.actions.objects.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["obj_risk_zone"]);
        assert_eq!(scene.memory["obj_risk_zone"].hits, 1);

        let bare = build_scene_actions(&first.chaos, SceneMode::Business);
        assert!(scene.actions.objects[0].scale > bare.objects[0].scale);

        let history = PipelineHistory {
            object_memory: scene.memory.clone(),
            ..PipelineHistory::default()
        };
        let second = run_pipeline("risk", &catalogs, &config, Some(&history), at()).unwrap();
        let again = second.scene.unwrap();
        assert_eq!(again.memory["obj_risk_zone"].hits, 2);
        assert!(again.memory["obj_risk_zone"].energy > scene.memory["obj_risk_zone"].energy);
        assert!(again.actions.objects[0].scale > scene.actions.objects[0].scale);
    }
}
