//! Pattern Library
//!
//! Built-in structural descriptions of the system archetypes: their feedback
//! loops (with strength and delay) and leverage points. The visual projector
//! reads loops and levers from here; scoring never does.

use serde::{Deserialize, Serialize};

use super::model::LoopPolarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLoop {
    pub id: String,
    #[serde(rename = "type")]
    pub polarity: LoopPolarity,
    pub variables: Vec<String>,
    /// Within [0,1]
    pub strength: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub loops: Vec<FeedbackLoop>,
    pub typical_signals: Vec<String>,
    pub risk_level: RiskLevel,
    pub leverage_points: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn feedback(id: &str, polarity: LoopPolarity, variables: &[&str], strength: f64, delay: Option<f64>) -> FeedbackLoop {
    FeedbackLoop {
        id: id.to_string(),
        polarity,
        variables: strings(variables),
        strength,
        delay,
    }
}

/// The four canonical patterns, ids matching the bootstrap system catalog
pub fn pattern_library() -> Vec<PatternDefinition> {
    use LoopPolarity::{Balancing as B, Reinforcing as R};

    vec![
        PatternDefinition {
            id: "obj_limits_to_growth".into(),
            name: "Limits to Growth".into(),
            description: "Reinforcing growth loop encounters a balancing constraint, \
                          causing expansion to slow or stall after a delay."
                .into(),
            loops: vec![
                feedback("ltg_r_growth", R, &["growth", "capacity_utilization", "adoption"], 0.7, None),
                feedback("ltg_b_constraint", B, &["constraint", "quality", "latency"], 0.6, Some(0.4)),
            ],
            typical_signals: strings(&["demand_up", "quality_down", "latency_up"]),
            risk_level: RiskLevel::Medium,
            leverage_points: strings(&["capacity_investment", "quality_stabilizers", "latency_buffers"]),
        },
        PatternDefinition {
            id: "obj_fixes_that_fail".into(),
            name: "Fixes That Fail".into(),
            description: "A quick fix reduces symptoms in the short term, but secondary effects \
                          increase the underlying problem later."
                .into(),
            loops: vec![
                feedback("ftf_b_relief", B, &["symptom", "quick_fix"], 0.6, None),
                feedback("ftf_r_side_effects", R, &["side_effects", "problem_level"], 0.55, Some(0.5)),
            ],
            typical_signals: strings(&["temporary_relief", "recurring_failure", "side_effects"]),
            risk_level: RiskLevel::High,
            leverage_points: strings(&["root_cause_resolution", "side_effect_visibility"]),
        },
        PatternDefinition {
            id: "obj_escalation".into(),
            name: "Escalation".into(),
            description: "Two reinforcing loops amplify each other as actors react to perceived \
                          threats, driving an arms race dynamic."
                .into(),
            loops: vec![
                feedback("esc_r_side_a", R, &["action_a", "reaction_b"], 0.65, None),
                feedback("esc_r_side_b", R, &["action_b", "reaction_a"], 0.65, None),
            ],
            typical_signals: strings(&["arms_race", "overreaction", "conflict"]),
            risk_level: RiskLevel::High,
            leverage_points: strings(&["shared_limits", "trust_building", "response_delays"]),
        },
        PatternDefinition {
            id: "obj_shifting_the_burden".into(),
            name: "Shifting the Burden".into(),
            description: "Symptomatic solutions reduce immediate pressure, while fundamental \
                          capability erodes over time."
                .into(),
            loops: vec![
                feedback("stb_b_symptomatic", B, &["symptom", "symptomatic_solution"], 0.6, None),
                feedback("stb_r_erosion", R, &["capability_erosion", "problem_level"], 0.55, Some(0.6)),
            ],
            typical_signals: strings(&["symptomatic_reliance", "capability_decline"]),
            risk_level: RiskLevel::Medium,
            leverage_points: strings(&["fundamental_investment", "symptom_visibility"]),
        },
    ]
}
