//! BridgeSession - the owned engine state behind the host façade.
//!
//! A session owns the lattice, the platforms, every pass that reads or
//! mutates them, and the seeded random source. All mutation goes through the
//! command methods here; the host only reads results back.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::analysis::{
    BridgeStats, IntegrityChecker, IntegrityConfig, IntegrityReport, RoadConfig, RoadExtractor,
};
use crate::error::BridgeError;
use crate::graph::{
    BridgeGraph, ConnectivityBuilder, ConnectivityConfig, DistanceMetric, NodeId, NodeState, Origin,
    Platforms, WorldBounds,
};
use crate::growth::{
    BridgeParams, GrowthEngine, GrowthState, GrowthStrategy, GrowthTuning, MANUAL_GENERATION,
};
use crate::physics::{PhysicsRelaxer, RelaxConfig, GROWING_STIFFNESS, SETTLED_STIFFNESS};
use crate::spatial::SpatialIndex;

/// Pointer pick radius: node size 6 plus 5 units of slack.
pub const DEFAULT_HIT_RADIUS: f32 = 11.0;

/// Component configuration for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionConfig {
    pub tuning: GrowthTuning,
    pub connectivity: ConnectivityConfig,
    pub relax: RelaxConfig,
    pub integrity: IntegrityConfig,
    pub road: RoadConfig,
}

/// What a single frame tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickOutcome {
    /// Growth steps run this tick.
    pub steps: u32,
    /// Growth halted during this tick.
    pub halted: bool,
    /// Edges removed by the break pass.
    pub broken: usize,
}

pub struct BridgeSession {
    graph: BridgeGraph,
    platforms: Option<Platforms>,
    bounds: WorldBounds,
    params: BridgeParams,

    growth: GrowthEngine,
    connectivity: ConnectivityBuilder,
    relaxer: PhysicsRelaxer,
    integrity: IntegrityChecker,
    road: RoadExtractor,

    rng: StdRng,
    road_nodes: Vec<NodeId>,
    last_integrity: IntegrityReport,

    /// Hit-test index, rebuilt lazily once positions have changed.
    hit_index: SpatialIndex,
    hit_index_dirty: bool,

    ticks: u64,
}

impl BridgeSession {
    /// Create a session with default components.
    pub fn new(bounds: WorldBounds, seed: u64) -> Self {
        Self::with_config(bounds, seed, SessionConfig::default())
    }

    pub fn with_config(bounds: WorldBounds, seed: u64, config: SessionConfig) -> Self {
        let params = BridgeParams::default();
        Self {
            graph: BridgeGraph::with_capacity(params.node_budget as usize, 0),
            platforms: None,
            bounds,
            params,
            growth: GrowthEngine::new(config.tuning, params.strategy),
            connectivity: ConnectivityBuilder::new(config.connectivity),
            relaxer: PhysicsRelaxer::new(config.relax),
            integrity: IntegrityChecker::new(config.integrity),
            road: RoadExtractor::new(config.road),
            rng: StdRng::seed_from_u64(seed),
            road_nodes: Vec::new(),
            last_integrity: IntegrityReport::default(),
            hit_index: SpatialIndex::new(),
            hit_index_dirty: false,
            ticks: 0,
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn params(&self) -> &BridgeParams {
        &self.params
    }

    /// Replace the parameter bag. Platform geometry only applies on the next
    /// `create_platforms`.
    pub fn set_params(&mut self, params: BridgeParams) -> Result<(), BridgeError> {
        params.validate()?;
        self.growth.set_strategy(params.strategy);
        self.params = params;
        Ok(())
    }

    pub fn set_growth_strategy(&mut self, strategy: GrowthStrategy) {
        self.params.strategy = strategy;
        self.growth.set_strategy(strategy);
    }

    /// Switch the distance metric and rebuild edges under it.
    pub fn set_distance_metric(&mut self, metric: DistanceMetric) {
        self.graph.set_metric(metric);
        self.rebuild_connectivity(self.params.connectivity_radius);
    }

    /// Restart the random source.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Clear nodes, edges, platforms and growth state.
    pub fn reset(&mut self) {
        self.graph.clear();
        self.platforms = None;
        self.growth.reset();
        self.road_nodes.clear();
        self.last_integrity = IntegrityReport::default();
        self.hit_index.clear();
        self.hit_index_dirty = false;
        self.ticks = 0;
        debug!("session reset");
    }

    /// Lay out both platforms, discarding any previous pair.
    pub fn create_platforms(
        &mut self,
        bounds: WorldBounds,
        distance: f32,
        height_diff: f32,
    ) -> Platforms {
        let platforms = Platforms::around_center(bounds, distance, height_diff);
        self.bounds = bounds;
        self.platforms = Some(platforms);
        debug!("platforms created: gap {distance}, height diff {height_diff}");
        platforms
    }

    /// Seed anchors on both platforms and enter the growing state.
    /// Returns the number of seeds placed.
    pub fn create_seed_nodes(&mut self) -> usize {
        let Some(platforms) = self.platforms else {
            warn!("create_seed_nodes ignored: no platforms");
            return 0;
        };
        if self.graph.states().iter().any(|s| s.is_platform()) {
            warn!("create_seed_nodes ignored: seeds already present");
            return 0;
        }

        let seeds = self
            .growth
            .create_seed_nodes(&mut self.graph, &platforms, &self.params.growth(), &mut self.rng);
        self.rebuild_connectivity(self.params.connectivity_radius);
        self.growth.start();
        seeds.len()
    }

    /// Reset, lay out platforms from the current parameters and seed them.
    pub fn generate(&mut self) -> usize {
        self.reset();
        self.create_platforms(self.bounds, self.params.platform_distance, self.params.height_diff);
        let seeds = self.create_seed_nodes();
        info!(
            "generating bridge: gap {}, budget {}, {:?}",
            self.params.platform_distance, self.params.node_budget, self.params.strategy
        );
        seeds
    }

    /// One growth step. Returns false once growth has halted.
    pub fn step(&mut self) -> bool {
        let was_halted = matches!(self.growth.state(), GrowthState::Halted(_));
        let continues = self.growth.step(
            &mut self.graph,
            self.platforms.as_ref(),
            &self.params.growth(),
            &self.connectivity,
            &mut self.rng,
        );
        self.hit_index_dirty = true;

        if !continues && !was_halted {
            self.compute_integrity();
            self.extract_road();
        }
        continues
    }

    /// Recompute all edges for `radius`. Returns the edge count.
    pub fn rebuild_connectivity(&mut self, radius: f32) -> usize {
        self.connectivity.rebuild(&mut self.graph, radius)
    }

    /// One relaxation pass with the given stiffness.
    pub fn relax(&mut self, stiffness: f32) {
        self.relaxer.relax(&mut self.graph, self.bounds, stiffness);
        self.hit_index_dirty = true;
    }

    /// Remove overstretched edges. Refused while growth is running.
    pub fn break_overstretched(&mut self, threshold: f32) -> usize {
        if self.growth.is_growing() {
            warn!("break_overstretched ignored while growing");
            return 0;
        }
        self.integrity.break_overstretched(&mut self.graph, threshold)
    }

    pub fn compute_integrity(&mut self) -> IntegrityReport {
        self.last_integrity = self.integrity.check(&self.graph, self.platforms.as_ref());
        self.last_integrity
    }

    /// Select road nodes. Empty without platforms.
    pub fn extract_road(&mut self) -> &[NodeId] {
        self.road_nodes = match &self.platforms {
            Some(platforms) => self.road.extract(&self.graph, platforms),
            None => Vec::new(),
        };
        &self.road_nodes
    }

    /// Place a reinforcement node and rebuild connectivity around it.
    /// Refused (returns `None`) while growth is running.
    pub fn add_manual_node(&mut self, x: f32, y: f32) -> Option<NodeId> {
        if self.growth.is_growing() {
            warn!("add_manual_node ignored while growing");
            return None;
        }
        let z = (self.rng.random::<f32>() - 0.5) * self.params.structural_depth;
        let id = self
            .graph
            .add_node((x, y, z), MANUAL_GENERATION, NodeState::new(), Origin::Manual);
        self.rebuild_connectivity(self.params.connectivity_radius);
        self.hit_index_dirty = true;
        Some(id)
    }

    /// Drag a free node to a new position. Anchors refuse to move.
    pub fn drag_node(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        match self.graph.state(id) {
            Some(state) if !state.is_immobile() => {
                self.hit_index_dirty = true;
                self.graph.move_node(id, x, y)
            }
            _ => false,
        }
    }

    /// One animation frame: growth on its cadence, then relaxation, then
    /// (once growth has stopped) the break pass.
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;
        let mut outcome = TickOutcome::default();

        if self.growth.is_growing() && self.ticks % self.params.growth_interval() as u64 == 0 {
            for _ in 0..self.params.steps_per_burst() {
                outcome.steps += 1;
                if !self.step() {
                    outcome.halted = true;
                    break;
                }
            }
        }

        let growing = self.growth.is_growing();
        let stiffness = if growing { GROWING_STIFFNESS } else { SETTLED_STIFFNESS };
        self.relax(stiffness);

        if !growing {
            outcome.broken =
                self.break_overstretched(self.integrity.config().break_threshold);
        }
        outcome
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn graph(&self) -> &BridgeGraph {
        &self.graph
    }

    pub fn platforms(&self) -> Option<&Platforms> {
        self.platforms.as_ref()
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn growth(&self) -> &GrowthEngine {
        &self.growth
    }

    pub fn is_growing(&self) -> bool {
        self.growth.is_growing()
    }

    pub fn road_nodes(&self) -> &[NodeId] {
        &self.road_nodes
    }

    /// Integrity as of the last `compute_integrity`.
    pub fn last_integrity(&self) -> IntegrityReport {
        self.last_integrity
    }

    /// Current statistics, with a fresh integrity check.
    pub fn stats(&self) -> BridgeStats {
        BridgeStats::collect(
            &self.graph,
            self.params.platform_distance,
            self.params.node_budget,
            self.growth.steps_taken(),
            self.integrity.check(&self.graph, self.platforms.as_ref()),
        )
    }

    /// Nearest node within `max_distance` of a point.
    pub fn find_node_at(&mut self, x: f32, y: f32, max_distance: f32) -> Option<NodeId> {
        if self.hit_index_dirty || self.hit_index.len() != self.graph.node_count() {
            self.hit_index.rebuild(&self.graph);
            self.hit_index_dirty = false;
        }
        self.hit_index.nearest_within(x, y, max_distance)
    }
}
