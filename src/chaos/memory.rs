//! Object Memory
//!
//! Scene objects accumulate "energy" each time a chaos result touches them.
//! Energy halves every `half_life_seconds` and boosts scale and emphasis of
//! the object's scene action. All functions are pure: the caller owns the
//! state map and the timestamps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::clamp::clamp_unit;

use super::scene::SceneActions;

/// Energy delta below which a trend counts as stable
const TREND_EPSILON: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub half_life_seconds: i64,
    pub energy_gain: f64,
    pub max_energy: f64,
    pub min_scale: f64,
    pub max_scale_boost: f64,
    pub max_emphasis_boost: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            half_life_seconds: 900,
            energy_gain: 0.35,
            max_energy: 1.0,
            min_scale: 0.25,
            max_scale_boost: 0.25,
            max_emphasis_boost: 0.30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMemoryState {
    pub hits: u32,
    pub energy: f64,
    pub last_intensity: f64,
    /// Unix seconds of the last hit
    pub last_ts: i64,
    pub trend: Trend,
}

/// Object id → memory, ordered for stable serialization
pub type ObjectMemory = BTreeMap<String, ObjectMemoryState>;

/// `energy * 0.5^(dt / half_life)`, clamped to [0,1]
pub fn decay_energy(energy: f64, dt: i64, half_life_seconds: i64) -> f64 {
    if dt <= 0 || half_life_seconds <= 0 {
        return clamp_unit(energy);
    }
    clamp_unit(energy * 0.5f64.powf(dt as f64 / half_life_seconds as f64))
}

/// Fold one hit of `intensity` at `ts` into an object's memory.
pub fn update_object(
    prev: Option<&ObjectMemoryState>,
    intensity: f64,
    ts: i64,
    config: &MemoryConfig,
) -> ObjectMemoryState {
    let intensity = clamp_unit(intensity);
    let Some(prev) = prev else {
        let energy = clamp_unit(config.energy_gain * intensity).min(config.max_energy);
        return ObjectMemoryState {
            hits: 1,
            energy,
            last_intensity: intensity,
            last_ts: ts,
            trend: if energy > TREND_EPSILON { Trend::Rising } else { Trend::Stable },
        };
    };

    let dt = (ts - prev.last_ts).max(0);
    let decayed = decay_energy(prev.energy, dt, config.half_life_seconds);
    let energy = clamp_unit(decayed + config.energy_gain * intensity).min(config.max_energy);

    let trend = if energy > prev.energy + TREND_EPSILON {
        Trend::Rising
    } else if energy < prev.energy - TREND_EPSILON {
        Trend::Falling
    } else {
        Trend::Stable
    };

    ObjectMemoryState {
        hits: prev.hits.saturating_add(1),
        energy,
        last_intensity: intensity,
        last_ts: ts,
        trend,
    }
}

/// New memory map with every affected object updated.
pub fn remember(
    memory: &ObjectMemory,
    affected_ids: &[String],
    intensity: f64,
    ts: i64,
    config: &MemoryConfig,
) -> ObjectMemory {
    let mut next = memory.clone();
    for id in affected_ids {
        let updated = update_object(memory.get(id), intensity, ts, config);
        next.insert(id.clone(), updated);
    }
    next
}

/// Boost scale and emphasis of remembered objects in proportion to their energy.
pub fn apply_memory(actions: &SceneActions, memory: &ObjectMemory, config: &MemoryConfig) -> SceneActions {
    let mut boosted = actions.clone();
    for object in &mut boosted.objects {
        let Some(mem) = memory.get(&object.id) else { continue };
        object.scale = config.min_scale.max(object.scale + config.max_scale_boost * mem.energy);
        object.emphasis += config.max_emphasis_boost * mem.energy;
    }
    boosted
}
