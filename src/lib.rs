//! Archetype Engine
//!
//! Deterministic text → archetype pipeline:
//! - Lexical signal extraction with sub-linear strength growth
//! - Chaos aggregation (logistic intensity, entropy-weighted volatility)
//! - Human archetype scoring and bridging into system signals
//! - System archetype mapping with dominant feedback-loop classification
//! - Visual projection of matched patterns
//!
//! No randomness and no shared mutable state: identical inputs give
//! bit-identical outputs.

pub mod utils;
pub mod error;
pub mod config;
pub mod signals;
pub mod chaos;
pub mod archetypes;
pub mod catalog;
pub mod pipeline;

// Re-exports for convenience
pub use archetypes::{
    bridge_signals, map_system_archetypes, project_visual_state, score_human_archetypes, AggregateState,
    SystemSignals, VisualState,
};
pub use catalog::{CatalogStore, Catalogs};
pub use chaos::{analyze_chaos, ChaosEngine, ChaosResult};
pub use config::{EngineConfig, SceneSettings};
pub use error::InvalidInput;
pub use pipeline::{run_pipeline, PipelineHistory, PipelineReport, SceneReport};
pub use signals::{extract_signals, Signal, SignalReport};
