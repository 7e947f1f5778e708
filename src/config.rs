//! Engine Configuration
//!
//! Limits, thresholds and layout constants for every pipeline stage. The
//! config is a plain value handed to each stage; nothing reads it globally.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::chaos::{MemoryConfig, SceneMode};

/// Environment variable naming a config file (JSON or YAML).
pub const CONFIG_ENV: &str = "ARCHETYPE_CONFIG";
/// Environment variable overriding `data_dir`.
pub const DATA_DIR_ENV: &str = "ARCHETYPE_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Longest accepted input, in characters
    pub max_text_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_text_chars: 4000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanScoringConfig {
    pub max_results: usize,
    pub min_confidence: f64,
}

impl Default for HumanScoringConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            min_confidence: 0.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Signals kept after accumulation; 0 disables truncation
    pub top_limit: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self { top_limit: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemMapperConfig {
    /// Global confidence floor; a definition's own floor may raise it
    pub min_confidence: f64,
    pub top_n: usize,
    /// Multiplier applied when an activation threshold is unmet
    pub blocked_penalty: f64,
    /// Tie-break bonus for the loop type a definition's template favours
    pub loop_bias: f64,
    pub balancing_signals: BTreeSet<String>,
    pub reinforcing_signals: BTreeSet<String>,
}

impl Default for SystemMapperConfig {
    fn default() -> Self {
        let set = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            min_confidence: 0.4,
            top_n: 3,
            blocked_penalty: 0.2,
            loop_bias: 0.05,
            balancing_signals: set(&["overload", "latency", "quality_drop", "resource_overload"]),
            reinforcing_signals: set(&["demand_growth", "dependency_growth", "scope_creep", "escalation"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub ring_radius: f64,
    pub loop_base_radius: f64,
    pub loop_step: f64,
    pub lever_offset: f64,
    pub node_color: String,
    /// Emit `line` flows from the focus node to every other node. Off gives
    /// an always-empty flow list for renderers that draw no flows.
    pub focus_flows: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            ring_radius: 2.4,
            loop_base_radius: 0.9,
            loop_step: 0.35,
            lever_offset: 0.9,
            node_color: "#9aa4b2".to_string(),
            focus_flows: true,
        }
    }
}

/// Scene projection of the chaos result, skipped unless a mode is set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub mode: Option<SceneMode>,
    pub memory: MemoryConfig,
}

/// Configuration for the whole engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extraction: ExtractionConfig,
    pub human: HumanScoringConfig,
    pub bridge: BridgeSettings,
    pub system: SystemMapperConfig,
    pub visual: VisualConfig,
    pub scene: SceneSettings,
    /// Root directory of the catalog store
    pub data_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            human: HumanScoringConfig::default(),
            bridge: BridgeSettings::default(),
            system: SystemMapperConfig::default(),
            visual: VisualConfig::default(),
            scene: SceneSettings::default(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl EngineConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file. A missing file yields defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config {}", path.display()))?,
            _ => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        };

        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Resolve the config from `ARCHETYPE_CONFIG` (if set) then apply
    /// `ARCHETYPE_DATA_DIR`.
    pub async fn from_env() -> Result<Self> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(path).await?,
            Err(_) => Self::default(),
        };
        Ok(config.with_data_dir(std::env::var(DATA_DIR_ENV).ok()))
    }

    /// An explicit path wins over `ARCHETYPE_CONFIG`. `ARCHETYPE_DATA_DIR` is
    /// applied once either way.
    pub async fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::load(path).await?.with_data_dir(std::env::var(DATA_DIR_ENV).ok())),
            None => Self::from_env().await,
        }
    }

    fn with_data_dir(mut self, dir: Option<String>) -> Self {
        if let Some(dir) = dir {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[tokio::test]
    async fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "human:\n  max_results: 2\nbridge:\n  top_limit: 4\nscene:\n  mode: spirit\n").unwrap();

        let config = EngineConfig::load(&path).await.unwrap();
        assert_eq!(config.human.max_results, 2);
        assert_eq!(config.human.min_confidence, 0.35);
        assert_eq!(config.bridge.top_limit, 4);
        assert_eq!(config.system.top_n, 3);
        assert_eq!(config.scene.mode, Some(SceneMode::Spirit));
        assert_eq!(config.scene.memory.half_life_seconds, 900);
    }

    #[tokio::test]
    async fn test_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"system": {"top_n": 1}, "data_dir": "/tmp/catalogs"}"#).unwrap();

        let config = EngineConfig::load(&path).await.unwrap();
        assert_eq!(config.system.top_n, 1);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/catalogs"));
        assert!(config.system.balancing_signals.contains("latency"));
    }

    #[tokio::test]
    async fn test_data_dir_override_applies_to_loaded_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"data_dir": "/srv/catalogs"}"#).unwrap();

        let loaded = EngineConfig::load(&path).await.unwrap();
        assert_eq!(loaded.clone().with_data_dir(None).data_dir, PathBuf::from("/srv/catalogs"));
        assert_eq!(
            loaded.with_data_dir(Some("/var/override".to_string())).data_dir,
            PathBuf::from("/var/override")
        );
    }
}
