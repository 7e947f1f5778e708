//! Human Archetype Scorer
//!
//! Matches a `SignalReport` against the human catalog. Confidence blends the
//! keyword and phrase overlap ratios with a small bonus from meta signals;
//! intensity is confidence scaled per archetype.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::HumanScoringConfig;
use crate::signals::{SignalKind, SignalReport, META_EXCLAMATION, META_LENGTH, META_QUESTION};
use crate::utils::clamp::{clamp, clamp_unit, ensure_finite, mean, variance};

use super::model::{rank, Evidence, HumanArchetypeDefinition, HumanArchetypeResult, HumanArchetypeState};

const EXCLAMATION_BONUS: f64 = 0.1;
const QUESTION_BONUS: f64 = 0.1;
const LENGTH_BONUS: f64 = 0.05;
const INSTABILITY_GAIN: f64 = 2.0;

fn meta_bonus(report: &SignalReport) -> f64 {
    clamp_unit(
        report.meta_score(META_EXCLAMATION) * EXCLAMATION_BONUS
            + report.meta_score(META_QUESTION) * QUESTION_BONUS
            + report.meta_score(META_LENGTH) * LENGTH_BONUS,
    )
}

/// Share of `wanted` present in `found`; an empty `wanted` counts as 0
fn overlap<'a>(wanted: &'a BTreeSet<&'a str>, found: &BTreeSet<&str>) -> (f64, Vec<&'a str>) {
    let matched: Vec<&str> = wanted.iter().copied().filter(|w| found.contains(w)).collect();
    let ratio = matched.len() as f64 / wanted.len().max(1) as f64;
    (clamp_unit(ensure_finite(ratio, 0.0)), matched)
}

fn score_one(
    definition: &HumanArchetypeDefinition,
    report: &SignalReport,
    keywords_found: &BTreeSet<&str>,
    phrases_found: &BTreeSet<&str>,
    bonus: f64,
) -> HumanArchetypeResult {
    let keywords: BTreeSet<&str> = definition.signals.keywords.iter().map(String::as_str).collect();
    let phrases: BTreeSet<&str> = definition.signals.phrases.iter().map(String::as_str).collect();

    let (kw_ratio, kw_matched) = overlap(&keywords, keywords_found);
    let (ph_ratio, ph_matched) = overlap(&phrases, phrases_found);

    let weights = &definition.weights;
    let confidence = clamp_unit(
        clamp_unit(weights.keyword_weight) * kw_ratio + clamp_unit(weights.phrase_weight) * ph_ratio + bonus,
    );
    let scale = clamp(weights.intensity_scale, 0.0, 2.0);
    let intensity = clamp_unit(confidence * scale);

    let mut evidence = Evidence::new();
    for name in kw_matched {
        evidence.insert(name, clamp_unit(report.score_of(SignalKind::Keyword, name).unwrap_or(0.0)));
    }
    for name in ph_matched {
        evidence.insert(name, clamp_unit(report.score_of(SignalKind::Phrase, name).unwrap_or(0.0)));
    }

    HumanArchetypeResult {
        archetype_id: definition.id.clone(),
        confidence,
        intensity,
        evidence,
    }
}

/// Score every definition, keep those above the confidence floor, rank and bound.
pub fn score_human_archetypes(
    report: &SignalReport,
    catalog: &[HumanArchetypeDefinition],
    config: &HumanScoringConfig,
    at: DateTime<Utc>,
) -> HumanArchetypeState {
    let keywords_found = report.values_of(SignalKind::Keyword);
    let phrases_found = report.values_of(SignalKind::Phrase);
    let bonus = meta_bonus(report);

    let mut results: Vec<HumanArchetypeResult> = catalog
        .iter()
        .map(|def| score_one(def, report, &keywords_found, &phrases_found, bonus))
        .filter(|r| r.confidence >= config.min_confidence)
        .collect();
    rank(&mut results, config.max_results);

    let intensities: Vec<f64> = results.iter().map(|r| r.intensity).collect();
    let pressure = clamp_unit(mean(&intensities));
    let instability = clamp_unit(variance(&intensities) * INSTABILITY_GAIN);

    debug!(
        "Human scoring: {} of {} archetypes kept, pressure={:.3}",
        results.len(),
        catalog.len(),
        pressure
    );

    HumanArchetypeState {
        timestamp: at,
        results,
        pressure,
        instability,
    }
}
