//! Chaos Module
//!
//! Text → intensity/volatility aggregation, its scene projection and the
//! decaying per-object memory layered on top.

pub mod engine;
pub mod scene;
pub mod memory;

pub use engine::{analyze_chaos, ChaosEngine, ChaosResult, ChaosSignal};
pub use scene::{build_scene_actions, map_chaos_to_objects, SceneActions, SceneMode};
pub use memory::{MemoryConfig, ObjectMemory, ObjectMemoryState};
