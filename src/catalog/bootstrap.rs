//! Bootstrap catalogs written on first load of an empty store.
//!
//! Human archetype signals name entries of the default lexical registry, bridge
//! rules target the system signals the system catalog weighs, and system ids
//! match the pattern library.

use chrono::{DateTime, Utc};

use crate::archetypes::model::{
    BridgeConfig, BridgeRule, HumanArchetypeDefinition, HumanArchetypeOutputs, HumanArchetypeSignals,
    HumanArchetypeWeights, HumanCatalog, LoopPolarity, LoopTemplate, SentimentHint, SignalMap,
    SystemArchetypeCatalog, SystemArchetypeDefinition, SystemArchetypeThresholds,
};

pub const BOOTSTRAP_VERSION: &str = "bootstrap";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn map(values: &[(&str, f64)]) -> SignalMap {
    values.iter().copied().collect()
}

struct HumanSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    keywords: &'static [&'static str],
    phrases: &'static [&'static str],
    hint: SentimentHint,
    /// keyword weight, phrase weight, intensity scale, default intensity
    weights: [f64; 4],
}

const HUMAN_SEEDS: &[HumanSeed] = &[
    HumanSeed {
        id: "ha_01",
        name: "Stabilizer",
        description: "Seeks equilibrium through steady pacing and careful adjustments.",
        tags: &["balance", "stability"],
        keywords: &["trust", "quality"],
        phrases: &["not_sure"],
        hint: SentimentHint::Neutral,
        weights: [0.6, 0.8, 1.0, 0.4],
    },
    HumanSeed {
        id: "ha_02",
        name: "Accelerator",
        description: "Prefers rapid momentum and decisive action.",
        tags: &["momentum", "speed"],
        keywords: &["urgent", "pressure"],
        phrases: &["under_pressure"],
        hint: SentimentHint::Pos,
        weights: [0.7, 0.9, 1.3, 0.6],
    },
    HumanSeed {
        id: "ha_03",
        name: "Reducer",
        description: "Focuses on minimizing risk and reducing exposure.",
        tags: &["risk", "caution"],
        keywords: &["risk", "quality"],
        phrases: &["not_sure"],
        hint: SentimentHint::Mixed,
        weights: [0.6, 0.8, 0.9, 0.5],
    },
    HumanSeed {
        id: "ha_04",
        name: "Firefighter",
        description: "Jumps on the most visible problem and trades the plan for speed.",
        tags: &["reactive", "crisis"],
        keywords: &["urgent", "delay", "risk"],
        phrases: &["need_help"],
        hint: SentimentHint::Neg,
        weights: [0.7, 0.8, 1.2, 0.6],
    },
    HumanSeed {
        id: "ha_05",
        name: "Delegator",
        description: "Hands work to others and relies on their follow-through.",
        tags: &["delegation", "dependency"],
        keywords: &["overload", "trust"],
        phrases: &["need_help"],
        hint: SentimentHint::Neutral,
        weights: [0.6, 0.8, 1.0, 0.4],
    },
    HumanSeed {
        id: "ha_06",
        name: "Overloaded Operator",
        description: "Carries more load than capacity allows and lets quality slip.",
        tags: &["capacity", "burnout"],
        keywords: &["overload", "pressure", "delay"],
        phrases: &["under_pressure", "need_help"],
        hint: SentimentHint::Neg,
        weights: [0.7, 0.8, 1.2, 0.6],
    },
    HumanSeed {
        id: "ha_07",
        name: "Drifter",
        description: "Defers decisions while scope and timelines shift around them.",
        tags: &["indecision", "drift"],
        keywords: &["delay"],
        phrases: &["not_sure"],
        hint: SentimentHint::Neutral,
        weights: [0.5, 0.7, 0.8, 0.3],
    },
    HumanSeed {
        id: "ha_08",
        name: "Perfectionist",
        description: "Reworks output until it meets an exacting standard.",
        tags: &["quality", "rework"],
        keywords: &["quality", "delay"],
        phrases: &[],
        hint: SentimentHint::Mixed,
        weights: [0.7, 0.6, 1.0, 0.5],
    },
    HumanSeed {
        id: "ha_09",
        name: "Combatant",
        description: "Answers pressure with pressure and raises the stakes.",
        tags: &["conflict", "escalation"],
        keywords: &["risk", "pressure", "urgent"],
        phrases: &[],
        hint: SentimentHint::Neg,
        weights: [0.7, 0.6, 1.1, 0.5],
    },
    HumanSeed {
        id: "ha_10",
        name: "Quick Fixer",
        description: "Patches symptoms fast and leaves root causes for later.",
        tags: &["workaround", "short_term"],
        keywords: &["inventory", "urgent", "delay"],
        phrases: &["need_help"],
        hint: SentimentHint::Mixed,
        weights: [0.7, 0.7, 1.0, 0.5],
    },
];

pub fn human_catalog(now: DateTime<Utc>) -> HumanCatalog {
    let items = HUMAN_SEEDS
        .iter()
        .map(|seed| HumanArchetypeDefinition {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            description: seed.description.to_string(),
            tags: strings(seed.tags),
            signals: HumanArchetypeSignals {
                keywords: strings(seed.keywords),
                phrases: strings(seed.phrases),
                sentiment_hint: Some(seed.hint),
            },
            weights: HumanArchetypeWeights {
                keyword_weight: seed.weights[0],
                phrase_weight: seed.weights[1],
                intensity_scale: seed.weights[2],
            },
            outputs: HumanArchetypeOutputs {
                default_intensity: seed.weights[3],
            },
            editable: true,
        })
        .collect();

    HumanCatalog {
        version: BOOTSTRAP_VERSION.to_string(),
        updated_at: now,
        items,
    }
}

pub fn bridge_config(now: DateTime<Utc>) -> BridgeConfig {
    let rule = |id: &str, signals: &[(&str, f64)]| BridgeRule {
        human_archetype_id: id.to_string(),
        system_signals: map(signals),
    };

    BridgeConfig {
        version: BOOTSTRAP_VERSION.to_string(),
        updated_at: now,
        rules: vec![
            rule("ha_01", &[("decision_volatility", 0.8), ("rework", 0.6), ("latency", 0.4)]),
            rule("ha_02", &[("scope_creep", 0.7), ("resource_overload", 0.6), ("latency", 0.5)]),
            rule("ha_03", &[("escalation", 0.9), ("decision_volatility", 0.6)]),
            rule("ha_04", &[("short_term_relief", 0.8), ("long_term_risk", 0.7)]),
            rule("ha_05", &[("dependency_growth", 0.8), ("quality_drop", 0.5)]),
            rule("ha_06", &[("resource_overload", 0.9), ("latency", 0.6), ("quality_drop", 0.4)]),
            rule("ha_07", &[("decision_volatility", 0.5), ("scope_creep", 0.6)]),
            rule("ha_08", &[("rework", 0.7), ("quality_drop", 0.6)]),
            rule("ha_09", &[("escalation", 0.6), ("resource_overload", 0.5)]),
            rule("ha_10", &[("short_term_relief", 0.6), ("dependency_growth", 0.6), ("long_term_risk", 0.5)]),
        ],
    }
}

fn template(id: &str, polarity: LoopPolarity, variables: &[&str], notes: &str) -> LoopTemplate {
    LoopTemplate {
        id: id.to_string(),
        polarity,
        variables: strings(variables),
        notes: Some(notes.to_string()),
    }
}

pub fn system_catalog(now: DateTime<Utc>) -> SystemArchetypeCatalog {
    use LoopPolarity::{Balancing as B, Reinforcing as R};

    let definition = |id: &str,
                      name: &str,
                      description: &str,
                      required: &[&str],
                      weights: &[(&str, f64)],
                      activation: &[(&str, f64)],
                      loops: Vec<LoopTemplate>| SystemArchetypeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        required_signals: strings(required),
        weights: map(weights),
        thresholds: SystemArchetypeThresholds {
            min_confidence: 0.4,
            activation: map(activation),
        },
        loops_template: loops,
    };

    let items = vec![
        definition(
            "obj_limits_to_growth",
            "Limits to Growth",
            "Reinforcing growth meets balancing constraints, leading to slowed expansion.",
            &["latency", "resource_overload", "quality_drop"],
            &[("latency", 0.5), ("resource_overload", 0.8), ("quality_drop", 0.6)],
            &[("latency", 0.3), ("resource_overload", 0.4), ("quality_drop", 0.3)],
            vec![
                template("ltg_r_growth", R, &["growth", "adoption"], "Growth reinforces growth."),
                template("ltg_b_constraint", B, &["constraint", "latency", "quality"], "Constraints dampen growth after delay."),
            ],
        ),
        definition(
            "obj_fixes_that_fail",
            "Fixes That Fail",
            "Short-term relief creates long-term risk, increasing the core issue.",
            &["short_term_relief", "long_term_risk"],
            &[("short_term_relief", 0.7), ("long_term_risk", 0.9)],
            &[],
            vec![
                template("ftf_b_relief", B, &["symptom", "short_term_relief"], "Short-term relief reduces symptoms."),
                template("ftf_r_side_effects", R, &["side_effects", "long_term_risk"], "Side effects amplify the root issue."),
            ],
        ),
        definition(
            "obj_escalation",
            "Escalation",
            "Mutual reactions reinforce each other, increasing instability.",
            &["escalation", "decision_volatility"],
            &[("escalation", 0.9), ("decision_volatility", 0.5)],
            &[],
            vec![
                template("esc_r_side_a", R, &["action_a", "reaction_b"], "Side A reacts to Side B."),
                template("esc_r_side_b", R, &["action_b", "reaction_a"], "Side B reacts to Side A."),
            ],
        ),
        definition(
            "obj_shifting_the_burden",
            "Shifting the Burden",
            "Symptomatic relief grows dependency while fundamental capability weakens.",
            &["dependency_growth", "short_term_relief", "long_term_risk"],
            &[("dependency_growth", 0.8), ("long_term_risk", 0.6)],
            &[],
            vec![
                template("stb_b_symptomatic", B, &["symptom", "short_term_relief"], "Symptomatic fixes reduce pressure temporarily."),
                template("stb_r_dependency", R, &["dependency_growth", "capability_erosion"], "Reliance grows and erodes core capability."),
            ],
        ),
    ];

    SystemArchetypeCatalog {
        version: BOOTSTRAP_VERSION.to_string(),
        updated_at: now,
        items,
    }
}
