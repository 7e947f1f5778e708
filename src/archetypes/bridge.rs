//! Bridge Mapper
//!
//! Translates human archetype intensities into the system signal space via the
//! rule table.

use tracing::debug;

use crate::config::BridgeSettings;
use crate::utils::clamp::{clamp_unit, ensure_finite};

use super::model::{BridgeRule, HumanArchetypeState, SystemSignals};

/// Accumulate `intensity × weight` per target signal, clamp each total and keep
/// the `top_limit` largest. Dropped signals are removed, not zeroed.
pub fn bridge_signals(state: &HumanArchetypeState, rules: &[BridgeRule], settings: &BridgeSettings) -> SystemSignals {
    let mut totals = SystemSignals::new();

    for result in &state.results {
        let Some(rule) = rules.iter().find(|r| r.human_archetype_id == result.archetype_id) else {
            continue;
        };
        for (name, weight) in rule.system_signals.iter() {
            let increment = ensure_finite(result.intensity * clamp_unit(weight), 0.0);
            totals.insert(name, totals.value(name) + increment);
        }
    }

    // name order, so equal values keep the alphabetically first signals
    let mut ranked: Vec<(&str, f64)> = totals.iter().map(|(k, v)| (k, clamp_unit(v))).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    if settings.top_limit > 0 {
        ranked.truncate(settings.top_limit);
    }

    debug!("Bridged {} human results into {} system signals", state.results.len(), ranked.len());
    ranked.into_iter().collect()
}
