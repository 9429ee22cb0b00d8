//! Procedural vine growth.
//!
//! - [`config`]: host parameter bag, per-step parameters and tunables
//! - [`engine`]: the growth state machine and random walk

pub mod config;
pub mod engine;

pub use config::{BridgeParams, GrowthParams, GrowthStrategy, GrowthTuning, MANUAL_GENERATION};
pub use engine::{Front, GrowthEngine, GrowthState, HaltReason};
