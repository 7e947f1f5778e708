//! Visual Projector
//!
//! Lays matched system archetypes out on a ring and projects each pattern's
//! loops and leverage points around its node. Output is a plain record for a
//! renderer; it is regenerated on every call and carries no identity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::config::VisualConfig;
use crate::utils::clamp::{clamp, clamp_unit, ensure_finite};

use super::library::{FeedbackLoop, PatternDefinition};
use super::model::{LoopPolarity, Ranked, SystemArchetypeState};

pub type Vec3 = [f64; 3];

/// Vertical squash of the layout ring
const RING_ASPECT: f64 = 0.6;
const LEVER_ASPECT: f64 = 0.5;
const LEVER_LIFT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Ico,
    Box,
}

impl From<LoopPolarity> for NodeShape {
    fn from(polarity: LoopPolarity) -> Self {
        match polarity {
            LoopPolarity::Reinforcing => NodeShape::Ico,
            LoopPolarity::Balancing => NodeShape::Box,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualNode {
    pub id: String,
    pub shape: NodeShape,
    pub pos: Vec3,
    pub color: String,
    pub intensity: f64,
    pub opacity: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualLoop {
    pub id: String,
    #[serde(rename = "type")]
    pub polarity: LoopPolarity,
    pub center: Vec3,
    pub radius: f64,
    pub intensity: f64,
    pub flow_speed: f64,
    pub delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualLever {
    pub id: String,
    pub target: String,
    pub pos: Vec3,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualFlow {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: FlowKind,
    pub speed: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualField {
    pub chaos: f64,
    pub density: f64,
    pub noise_amp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    /// Unix seconds of the projected state
    pub t: f64,
    pub focus: Option<String>,
    pub nodes: Vec<VisualNode>,
    pub loops: Vec<VisualLoop>,
    pub levers: Vec<VisualLever>,
    pub flows: Vec<VisualFlow>,
    pub field: VisualField,
}

/// Evenly spaced points on a squashed ring; a single point at the origin for n ≤ 1
fn ring_positions(count: usize, radius: f64) -> Vec<Vec3> {
    if count <= 1 {
        return vec![[0.0, 0.0, 0.0]];
    }
    (0..count)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / count as f64;
            [angle.cos() * radius, angle.sin() * radius * RING_ASPECT, 0.0]
        })
        .collect()
}

fn flow_speed(strength: f64) -> f64 {
    clamp(0.2 + ensure_finite(strength, 0.0) * 0.6, 0.05, 1.2)
}

fn project_loop(owner: &str, feedback: &FeedbackLoop, center: Vec3, index: usize, config: &VisualConfig) -> VisualLoop {
    VisualLoop {
        id: format!("{}:{}", owner, feedback.id),
        polarity: feedback.polarity,
        center,
        radius: clamp(config.loop_base_radius + index as f64 * config.loop_step, 0.5, 3.0),
        intensity: clamp_unit(feedback.strength),
        flow_speed: flow_speed(feedback.strength),
        delay: feedback.delay.map(clamp_unit),
    }
}

fn project_levers(owner: &str, pattern: &PatternDefinition, center: Vec3, strength: f64, config: &VisualConfig) -> Vec<VisualLever> {
    let count = pattern.leverage_points.len().max(1) as f64;
    (0..pattern.leverage_points.len())
        .map(|k| {
            let angle = 2.0 * PI * k as f64 / count;
            VisualLever {
                id: format!("{}:lever:{}", owner, k),
                target: owner.to_string(),
                pos: [
                    center[0] + angle.cos() * config.lever_offset,
                    center[1] + angle.sin() * config.lever_offset * LEVER_ASPECT,
                    center[2] + LEVER_LIFT,
                ],
                strength,
            }
        })
        .collect()
}

/// Project a system archetype state onto the pattern library.
///
/// Results whose id is missing from the library emit nothing but keep their
/// ring slot. Focus flows are an addition on top of the node/loop/lever
/// projection and are skipped when `config.focus_flows` is off.
pub fn project_visual_state(state: &SystemArchetypeState, library: &[PatternDefinition], config: &VisualConfig) -> VisualState {
    let patterns: HashMap<&str, &PatternDefinition> = library.iter().map(|p| (p.id.as_str(), p)).collect();
    let focus = state.top().map(|r| r.archetype_id().to_string());
    let positions = ring_positions(state.results.len(), config.ring_radius);

    let mut nodes = Vec::new();
    let mut loops = Vec::new();
    let mut levers = Vec::new();

    for (idx, result) in state.results.iter().enumerate() {
        let Some(pattern) = patterns.get(result.archetype_id.as_str()) else {
            continue;
        };
        let pos = positions.get(idx).copied().unwrap_or([0.0, 0.0, 0.0]);
        let confidence = clamp_unit(result.confidence);

        nodes.push(VisualNode {
            id: result.archetype_id.clone(),
            shape: result.dominant_loop.into(),
            pos,
            color: config.node_color.clone(),
            intensity: confidence,
            opacity: clamp(0.75 + confidence * 0.2, 0.6, 0.95),
            scale: clamp(0.9 + confidence * 0.4, 0.7, 1.4),
        });

        loops.extend(
            pattern
                .loops
                .iter()
                .enumerate()
                .map(|(i, feedback)| project_loop(&result.archetype_id, feedback, pos, i, config)),
        );
        levers.extend(project_levers(&result.archetype_id, pattern, pos, confidence, config));
    }

    let flows = match focus.as_deref() {
        Some(source) if config.focus_flows && nodes.iter().any(|n| n.id == source) => nodes
            .iter()
            .filter(|n| n.id != source)
            .map(|target| VisualFlow {
                id: format!("{}->{}", source, target.id),
                from: source.to_string(),
                to: target.id.clone(),
                kind: FlowKind::Line,
                speed: flow_speed(target.intensity),
                intensity: target.intensity,
            })
            .collect(),
        _ => Vec::new(),
    };

    let field = VisualField {
        chaos: clamp_unit(state.instability),
        density: clamp_unit(ensure_finite(0.3 + state.pressure * 0.5, 0.3)),
        noise_amp: clamp_unit(state.instability),
    };

    VisualState {
        t: state.timestamp.timestamp_micros() as f64 / 1e6,
        focus,
        nodes,
        loops,
        levers,
        flows,
        field,
    }
}
