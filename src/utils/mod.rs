//! Utils Module
pub mod clamp;
pub mod sampler;

pub use clamp::{clamp, clamp_unit, ensure_finite};
pub use sampler::HashSampler;
