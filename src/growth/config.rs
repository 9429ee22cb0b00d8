//! Growth parameters and tunables.
//!
//! [`BridgeParams`] is the parameter bag the host hands in (camelCase keys,
//! every field optional). [`GrowthParams`] is the validated subset a growth
//! step consumes, and [`GrowthTuning`] holds the named constants that shape
//! the walk.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_percent, BridgeError};

/// Generation stamped on nodes placed through the manual extension point.
pub const MANUAL_GENERATION: u32 = 999;

/// How tips pick the point they grow toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrowthStrategy {
    /// Grow from the left platform toward the right platform.
    #[default]
    Unidirectional,
    /// Grow from both platforms toward the middle of the gap.
    Bidirectional,
}

/// Per-step growth configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthParams {
    /// Maximum total node count, seeds included.
    pub node_budget: u32,
    /// Radius used by the connectivity rebuild after each step.
    pub connectivity_radius: f32,
    /// Angular randomness, 0-100.
    pub chaos_factor: f32,
    /// Chance that a tip produces two nodes, 0-100.
    pub branch_probability: f32,
    /// Depth jitter magnitude.
    pub structural_depth: f32,
    /// Downward bias applied to every new node.
    pub sag_arc: f32,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            node_budget: 80,
            connectivity_radius: 100.0,
            chaos_factor: 30.0,
            branch_probability: 25.0,
            structural_depth: 60.0,
            sag_arc: 0.0,
        }
    }
}

impl GrowthParams {
    pub fn with_node_budget(mut self, node_budget: u32) -> Self {
        self.node_budget = node_budget;
        self
    }

    pub fn with_connectivity_radius(mut self, radius: f32) -> Self {
        self.connectivity_radius = radius;
        self
    }

    pub fn with_chaos_factor(mut self, chaos: f32) -> Self {
        self.chaos_factor = chaos;
        self
    }

    pub fn with_branch_probability(mut self, probability: f32) -> Self {
        self.branch_probability = probability;
        self
    }

    pub fn with_structural_depth(mut self, depth: f32) -> Self {
        self.structural_depth = depth;
        self
    }

    pub fn with_sag_arc(mut self, sag_arc: f32) -> Self {
        self.sag_arc = sag_arc;
        self
    }

    /// Reject non-finite values and out-of-range percentages.
    ///
    /// A radius <= 0 is accepted: it simply produces no edges.
    pub fn validate(&self) -> Result<(), BridgeError> {
        ensure_finite("connectivityRadius", self.connectivity_radius)?;
        ensure_percent("chaosFactor", self.chaos_factor)?;
        ensure_percent("branchProbability", self.branch_probability)?;
        ensure_finite("structuralDepth", self.structural_depth)?;
        ensure_finite("sagArc", self.sag_arc)?;
        Ok(())
    }
}

/// The host-facing parameter bag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeParams {
    /// Gap between the platforms' facing edges.
    pub platform_distance: f32,
    /// Vertical offset of the right platform.
    pub height_diff: f32,
    pub node_budget: u32,
    pub connectivity_radius: f32,
    pub structural_depth: f32,
    pub sag_arc: f32,
    /// Frame cadence, 1-10.
    pub growth_speed: u32,
    pub chaos_factor: f32,
    pub branch_probability: f32,
    pub strategy: GrowthStrategy,
}

impl Default for BridgeParams {
    fn default() -> Self {
        let growth = GrowthParams::default();
        Self {
            platform_distance: 500.0,
            height_diff: 0.0,
            node_budget: growth.node_budget,
            connectivity_radius: growth.connectivity_radius,
            structural_depth: growth.structural_depth,
            sag_arc: growth.sag_arc,
            growth_speed: 5,
            chaos_factor: growth.chaos_factor,
            branch_probability: growth.branch_probability,
            strategy: GrowthStrategy::default(),
        }
    }
}

impl BridgeParams {
    /// The subset consumed by a growth step.
    pub fn growth(&self) -> GrowthParams {
        GrowthParams {
            node_budget: self.node_budget,
            connectivity_radius: self.connectivity_radius,
            chaos_factor: self.chaos_factor,
            branch_probability: self.branch_probability,
            structural_depth: self.structural_depth,
            sag_arc: self.sag_arc,
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        ensure_finite("platformDistance", self.platform_distance)?;
        ensure_finite("heightDiff", self.height_diff)?;
        if !(1..=10).contains(&self.growth_speed) {
            return Err(BridgeError::GrowthSpeedOutOfRange {
                value: self.growth_speed,
            });
        }
        self.growth().validate()
    }

    /// Ticks between growth bursts.
    pub fn growth_interval(&self) -> u32 {
        6u32.saturating_sub(self.growth_speed / 2).max(1)
    }

    /// Growth steps per burst.
    pub fn steps_per_burst(&self) -> u32 {
        self.growth_speed.div_ceil(2).max(1)
    }
}

/// Named constants shaping the growth walk.
///
/// These are calibrated for visual density, not derived from anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthTuning {
    /// Hard cap on growth steps.
    pub max_steps: u32,
    /// Anchor nodes seeded on each platform.
    pub seeds_per_platform: u32,
    /// Tips closer than this to their target are considered arrived.
    pub arrival_distance: f32,
    /// Tips per front while far from the target.
    pub far_tip_count: usize,
    /// Tips per front once the lead tip is within `near_band`.
    pub near_tip_count: usize,
    pub near_band: f32,
    /// Branch probability multiplier inside the near band.
    pub near_branch_scale: f32,
    /// Chaos multiplier inside the near band.
    pub near_chaos_scale: f32,
    /// Maximum angular offset as a fraction of pi at chaos 100.
    pub chaos_spread: f32,
    pub max_step_length: f32,
    /// Fraction of the remaining distance covered by one step.
    pub step_fraction: f32,
    /// Random extra length added to every step.
    pub step_jitter: f32,
    /// Depth jitter as a fraction of the structural depth.
    pub depth_jitter_scale: f32,
    /// Vertical offset per unit of sag arc.
    pub sag_scale: f32,
    /// Generations considered recent for fallback tips.
    pub recent_generations: u32,
    /// Halt once a front's lead tip is within the arrival distance.
    pub halt_on_arrival: bool,
}

impl Default for GrowthTuning {
    fn default() -> Self {
        Self {
            max_steps: 200,
            seeds_per_platform: 3,
            arrival_distance: 30.0,
            far_tip_count: 5,
            near_tip_count: 3,
            near_band: 150.0,
            near_branch_scale: 0.5,
            near_chaos_scale: 0.5,
            chaos_spread: 0.3,
            max_step_length: 60.0,
            step_fraction: 0.25,
            step_jitter: 20.0,
            depth_jitter_scale: 0.5,
            sag_scale: 0.02,
            recent_generations: 2,
            halt_on_arrival: true,
        }
    }
}

impl GrowthTuning {
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_seeds_per_platform(mut self, seeds: u32) -> Self {
        self.seeds_per_platform = seeds;
        self
    }

    pub fn with_tip_counts(mut self, far: usize, near: usize) -> Self {
        self.far_tip_count = far;
        self.near_tip_count = near;
        self
    }

    pub fn with_halt_on_arrival(mut self, halt: bool) -> Self {
        self.halt_on_arrival = halt;
        self
    }
}
