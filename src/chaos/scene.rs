//! Scene Mapping
//!
//! Converts a `ChaosResult` into scene object ids and per-object render
//! actions. Pure data shaping, no rendering.

use serde::{Deserialize, Serialize};

use crate::signals::Polarity;
use crate::utils::clamp::clamp_unit;

use super::ChaosResult;

/// Object vocabulary used for the mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    #[default]
    Business,
    Spirit,
}

const BUSINESS_OBJECTS: &[(&str, &[&str])] = &[
    ("inventory", &["obj_inventory"]),
    ("quality", &["obj_quality"]),
    ("pressure", &["obj_core"]),
    ("delay", &["obj_delivery"]),
    ("risk", &["obj_risk_zone"]),
    ("trust", &["obj_trust_node"]),
];

/// Energy centre → object ids
const SPIRIT_OBJECTS: &[(&str, &[&str])] = &[
    ("root", &["obj_root"]),
    ("sacral", &["obj_sacral"]),
    ("solar", &["obj_solar"]),
    ("heart", &["obj_heart"]),
    ("throat", &["obj_throat"]),
    ("third_eye", &["obj_third_eye"]),
    ("crown", &["obj_crown"]),
];

/// Signal keyword → energy centre
const SPIRIT_SIGNALS: &[(&str, &str)] = &[
    ("risk", "root"),
    ("fear", "root"),
    ("safety", "root"),
    ("creativity", "sacral"),
    ("intimacy", "sacral"),
    ("confidence", "solar"),
    ("power", "solar"),
    ("pressure", "solar"),
    ("trust", "heart"),
    ("connection", "heart"),
    ("communication", "throat"),
    ("clarity", "third_eye"),
    ("insight", "third_eye"),
    ("meaning", "crown"),
    ("purpose", "crown"),
];

fn lookup<'a, V: Copy>(table: &'a [(&'a str, V)], key: &str) -> Option<V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// First `ceil(intensity * len)` entries of a pool
fn take_scaled<'a>(pool: &'a [impl AsRef<str> + 'a], intensity: f64) -> impl Iterator<Item = String> + 'a {
    let count = ((intensity * pool.len() as f64).ceil() as usize).min(pool.len());
    pool[..count].iter().map(|s| s.as_ref().to_string())
}

fn dedupe(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Object ids touched by a result, unique and in mapping order.
pub fn map_chaos_to_objects(result: &ChaosResult, mode: SceneMode) -> Vec<String> {
    match mode {
        SceneMode::Business => map_business(result),
        SceneMode::Spirit => map_spirit(result),
    }
}

fn map_business(result: &ChaosResult) -> Vec<String> {
    let intensity = clamp_unit(result.intensity);

    if let Some(pool) = result.dominant_signal.as_deref().and_then(|ds| lookup(BUSINESS_OBJECTS, ds)) {
        if !pool.is_empty() {
            return dedupe(take_scaled(pool, intensity).collect());
        }
    }

    let explanation = result.explanation.to_lowercase();
    let mentioned: Vec<&[&str]> = BUSINESS_OBJECTS
        .iter()
        .filter(|(key, _)| explanation.contains(key))
        .map(|(_, pool)| *pool)
        .collect();
    if !mentioned.is_empty() {
        let ids = mentioned.into_iter().flat_map(|pool| take_scaled(pool, intensity)).collect();
        return dedupe(ids);
    }

    dedupe(take_scaled(result.affected_objects.as_slice(), intensity).collect())
}

fn map_spirit(result: &ChaosResult) -> Vec<String> {
    let intensity = clamp_unit(result.intensity);

    let dominant = result.dominant_signal.as_deref().unwrap_or("").to_lowercase();
    if let Some(centre) = lookup(SPIRIT_SIGNALS, &dominant) {
        let pool = lookup(SPIRIT_OBJECTS, centre).unwrap_or(&[]);
        return dedupe(take_scaled(pool, intensity).collect());
    }

    let explanation = result.explanation.to_lowercase();
    let mut centres: Vec<&str> = Vec::new();
    for (signal, centre) in SPIRIT_SIGNALS {
        if explanation.contains(signal) && !centres.contains(centre) {
            centres.push(*centre);
        }
    }
    let ids = centres
        .into_iter()
        .flat_map(|centre| take_scaled(lookup(SPIRIT_OBJECTS, centre).unwrap_or(&[]), intensity))
        .collect();
    dedupe(ids)
}

fn polarity_of(signal: Option<&str>) -> Polarity {
    match signal {
        Some("risk") | Some("delay") | Some("quality") => Polarity::Negative,
        Some("trust") | Some("urgent") => Polarity::Positive,
        _ => Polarity::Neutral,
    }
}

fn color_for(polarity: Polarity, mode: SceneMode) -> &'static str {
    match (mode, polarity) {
        (SceneMode::Spirit, Polarity::Negative) => "#d95c4f",
        (SceneMode::Spirit, Polarity::Neutral) => "#4b4a8a",
        (SceneMode::Spirit, Polarity::Positive) => "#6fcf97",
        (SceneMode::Business, Polarity::Negative) => "#e74c3c",
        (SceneMode::Business, Polarity::Neutral) => "#3498db",
        (SceneMode::Business, Polarity::Positive) => "#2ecc71",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSummary {
    pub intensity: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    pub scale: f64,
    pub color: String,
    pub emphasis: f64,
}

/// Render instructions for one chaos result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneActions {
    pub scene: SceneSummary,
    pub objects: Vec<SceneObject>,
}

pub fn build_scene_actions(result: &ChaosResult, mode: SceneMode) -> SceneActions {
    let intensity = clamp_unit(result.intensity);
    let volatility = clamp_unit(result.volatility);
    let color = color_for(polarity_of(result.dominant_signal.as_deref()), mode);
    let scale = 0.6 + intensity * 0.6;

    let objects = map_chaos_to_objects(result, mode)
        .into_iter()
        .map(|id| SceneObject {
            id,
            scale,
            color: color.to_string(),
            emphasis: volatility,
        })
        .collect();

    SceneActions {
        scene: SceneSummary { intensity, volatility },
        objects,
    }
}
