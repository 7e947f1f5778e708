//! Archetypes Module
//!
//! Human scoring, bridging into system signals, system pattern mapping and
//! the visual projection of the result.

pub mod model;
pub mod human;
pub mod bridge;
pub mod system;
pub mod library;
pub mod visual;

pub use model::{
    AggregateState, BridgeConfig, BridgeRule, Evidence, HumanArchetypeDefinition, HumanArchetypeResult,
    HumanArchetypeState, HumanCatalog, LoopPolarity, LoopTemplate, Ranked, SignalMap, SystemArchetypeCatalog,
    SystemArchetypeDefinition, SystemArchetypeResult, SystemArchetypeState, SystemSignals,
};
pub use human::score_human_archetypes;
pub use bridge::bridge_signals;
pub use system::map_system_archetypes;
pub use library::{pattern_library, PatternDefinition};
pub use visual::{project_visual_state, VisualState};
