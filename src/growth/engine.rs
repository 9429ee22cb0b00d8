//! Vine growth engine.
//!
//! Grows the lattice as a biased random walk: every step picks the most
//! advanced nodes of each growth front as tips and extends each tip toward
//! the front's target. The bias always points at the target while step length
//! and angular noise shrink near it, so fronts tend to converge without any
//! backtracking. Bad branches are never removed here.
//!
//! # State machine
//!
//! `Idle -> Growing -> Halted(reason)`. `Halted` is terminal until `reset`.

use std::f32::consts::PI;
use std::fmt;

use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use super::config::{GrowthParams, GrowthStrategy, GrowthTuning};
use crate::graph::{BridgeGraph, ConnectivityBuilder, NodeId, NodeState, Origin, Platforms, Side};

/// Why growth stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HaltReason {
    /// The node budget is used up.
    NodeBudget,
    /// The step cap was hit.
    StepBudget,
    /// Every front's lead tip arrived at its target.
    TargetReached,
    /// No front had a tip to grow from.
    NoTips,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HaltReason::NodeBudget => "node budget reached",
            HaltReason::StepBudget => "step budget reached",
            HaltReason::TargetReached => "target reached",
            HaltReason::NoTips => "no growth tips",
        };
        f.write_str(text)
    }
}

/// Lifecycle of a growth run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GrowthState {
    #[default]
    Idle,
    Growing,
    Halted(HaltReason),
}

/// A growth front: the nodes of one origin walking toward one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Front {
    pub origin: Origin,
    pub side: Side,
    /// Midpoint of the front's own platform edge.
    pub home: (f32, f32),
    pub target: (f32, f32),
}

impl Front {
    /// Fronts grown under a strategy.
    pub fn for_strategy(strategy: GrowthStrategy, platforms: &Platforms) -> Vec<Front> {
        match strategy {
            GrowthStrategy::Unidirectional => vec![Front {
                origin: Origin::Left,
                side: Side::Left,
                home: platforms.facing_midpoint(Side::Left),
                target: platforms.facing_midpoint(Side::Right),
            }],
            GrowthStrategy::Bidirectional => {
                let left = platforms.facing_midpoint(Side::Left);
                let right = platforms.facing_midpoint(Side::Right);
                let middle = ((left.0 + right.0) / 2.0, (left.1 + right.1) / 2.0);
                vec![
                    Front {
                        origin: Origin::Left,
                        side: Side::Left,
                        home: left,
                        target: middle,
                    },
                    Front {
                        origin: Origin::Right,
                        side: Side::Right,
                        home: right,
                        target: middle,
                    },
                ]
            }
        }
    }

    fn distance_from(&self, x: f32, y: f32) -> f32 {
        let dx = self.target.0 - x;
        let dy = self.target.1 - y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Procedural growth driver.
#[derive(Debug, Clone, Default)]
pub struct GrowthEngine {
    tuning: GrowthTuning,
    strategy: GrowthStrategy,
    state: GrowthState,
    step: u32,
}

impl GrowthEngine {
    pub fn new(tuning: GrowthTuning, strategy: GrowthStrategy) -> Self {
        Self {
            tuning,
            strategy,
            state: GrowthState::Idle,
            step: 0,
        }
    }

    pub fn tuning(&self) -> &GrowthTuning {
        &self.tuning
    }

    pub fn strategy(&self) -> GrowthStrategy {
        self.strategy
    }

    /// Switch strategy. Takes effect on the next step.
    pub fn set_strategy(&mut self, strategy: GrowthStrategy) {
        self.strategy = strategy;
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    pub fn is_growing(&self) -> bool {
        self.state == GrowthState::Growing
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        match self.state {
            GrowthState::Halted(reason) => Some(reason),
            _ => None,
        }
    }

    /// Growth steps completed so far.
    pub fn steps_taken(&self) -> u32 {
        self.step
    }

    /// Back to `Idle` with the step counter at zero.
    pub fn reset(&mut self) {
        self.state = GrowthState::Idle;
        self.step = 0;
    }

    /// Enter `Growing` from `Idle`. No effect once halted.
    pub fn start(&mut self) {
        if self.state == GrowthState::Idle {
            self.state = GrowthState::Growing;
        }
    }

    /// Seed anchor nodes on the gap-facing edge of both platforms.
    ///
    /// Seeds are fixed platform nodes of generation 0 and count against the
    /// node budget like any other node.
    pub fn create_seed_nodes<R: Rng>(
        &self,
        graph: &mut BridgeGraph,
        platforms: &Platforms,
        params: &GrowthParams,
        rng: &mut R,
    ) -> Vec<NodeId> {
        let budget = params.node_budget as usize;
        let count = self.tuning.seeds_per_platform;
        let mut seeds = Vec::with_capacity(count as usize * 2);

        for (side, origin) in [(Side::Left, Origin::Left), (Side::Right, Origin::Right)] {
            let platform = platforms.get(side);
            let x = platforms.facing_edge_x(side);
            for i in 0..count {
                if graph.node_count() >= budget {
                    break;
                }
                let y = platform.y + platform.height * (i + 1) as f32 / (count + 1) as f32;
                let z = (rng.random::<f32>() - 0.5)
                    * params.structural_depth
                    * self.tuning.depth_jitter_scale;
                seeds.push(graph.add_node((x, y, z), 0, NodeState::anchor(), origin));
            }
        }

        debug!("seeded {} anchor nodes", seeds.len());
        seeds
    }

    /// Run one growth step.
    ///
    /// Returns true while growth continues. Halt conditions are checked both
    /// before and after growing, so the call that exhausts a budget already
    /// returns false.
    pub fn step<R: Rng>(
        &mut self,
        graph: &mut BridgeGraph,
        platforms: Option<&Platforms>,
        params: &GrowthParams,
        connectivity: &ConnectivityBuilder,
        rng: &mut R,
    ) -> bool {
        if matches!(self.state, GrowthState::Halted(_)) {
            return false;
        }
        let Some(platforms) = platforms else {
            self.halt(HaltReason::NoTips);
            return false;
        };
        self.state = GrowthState::Growing;

        let fronts = Front::for_strategy(self.strategy, platforms);
        if let Some(reason) = self.check_halt(graph, &fronts, params) {
            self.halt(reason);
            return false;
        }

        let before = graph.node_count();
        let mut any_tips = false;
        for front in &fronts {
            let tips = self.select_tips(graph, front);
            if tips.is_empty() {
                continue;
            }
            any_tips = true;
            self.grow_front(graph, front, &tips, params, rng);
        }

        if !any_tips {
            self.halt(HaltReason::NoTips);
            return false;
        }

        self.step += 1;
        connectivity.rebuild(graph, params.connectivity_radius);
        debug!(
            "growth step {}: +{} nodes ({} total, {} edges)",
            self.step,
            graph.node_count() - before,
            graph.node_count(),
            graph.edge_count()
        );

        if let Some(reason) = self.check_halt(graph, &fronts, params) {
            self.halt(reason);
            return false;
        }
        true
    }

    fn halt(&mut self, reason: HaltReason) {
        info!("growth halted after {} steps: {reason}", self.step);
        self.state = GrowthState::Halted(reason);
    }

    fn check_halt(
        &self,
        graph: &BridgeGraph,
        fronts: &[Front],
        params: &GrowthParams,
    ) -> Option<HaltReason> {
        if graph.node_count() >= params.node_budget as usize {
            return Some(HaltReason::NodeBudget);
        }
        if self.step >= self.tuning.max_steps {
            return Some(HaltReason::StepBudget);
        }
        if self.tuning.halt_on_arrival
            && !fronts.is_empty()
            && fronts.iter().all(|front| {
                Self::lead_distance(graph, front)
                    .is_some_and(|d| d < self.tuning.arrival_distance)
            })
        {
            return Some(HaltReason::TargetReached);
        }
        None
    }

    /// Distance to the target of the front's closest node.
    fn lead_distance(graph: &BridgeGraph, front: &Front) -> Option<f32> {
        graph
            .node_ids()
            .filter(|&id| graph.origin(id) == Some(front.origin))
            .filter_map(|id| graph.position(id))
            .map(|(x, y)| front.distance_from(x, y))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Pick this step's tips for a front.
    ///
    /// Step 0 grows from the front's seeds. Later steps take the free nodes
    /// furthest along the axis from the seed centroid to the target; if none
    /// has moved past the seeds, the most recent generations are used.
    fn select_tips(&self, graph: &BridgeGraph, front: &Front) -> Vec<NodeId> {
        let members: Vec<NodeId> = graph
            .node_ids()
            .filter(|&id| graph.origin(id) == Some(front.origin))
            .collect();

        if self.step == 0 {
            return members
                .into_iter()
                .filter(|&id| graph.state(id).is_some_and(|s| s.is_platform()))
                .collect();
        }

        let count = match Self::lead_distance(graph, front) {
            Some(d) if d <= self.tuning.near_band => self.tuning.near_tip_count,
            _ => self.tuning.far_tip_count,
        };
        let is_free = |id: &NodeId| graph.state(*id).is_some_and(|s| !s.is_immobile());

        let axis = Self::growth_axis(graph, front, &members);
        let mut ranked: Vec<(NodeId, f32)> = members
            .iter()
            .copied()
            .filter(is_free)
            .filter_map(|id| graph.position(id).map(|p| (id, axis.project(p))))
            .filter(|&(_, progress)| progress > 0.0)
            .collect();

        if !ranked.is_empty() {
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            return ranked.into_iter().take(count).map(|(id, _)| id).collect();
        }

        let oldest = self.step.saturating_sub(self.tuning.recent_generations);
        let mut recent: Vec<NodeId> = members
            .into_iter()
            .filter(is_free)
            .filter(|&id| graph.generation(id).is_some_and(|g| g >= oldest))
            .collect();
        recent.sort_by(|a, b| b.cmp(a));
        recent.truncate(count);
        recent
    }

    fn growth_axis(graph: &BridgeGraph, front: &Front, members: &[NodeId]) -> Axis {
        let seeds: Vec<(f32, f32)> = members
            .iter()
            .filter(|&&id| graph.state(id).is_some_and(|s| s.is_platform()))
            .filter_map(|&id| graph.position(id))
            .collect();

        let origin = if seeds.is_empty() {
            front.home
        } else {
            let n = seeds.len() as f32;
            let (sx, sy) = seeds
                .iter()
                .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
            (sx / n, sy / n)
        };
        Axis::new(origin, front.target)
    }

    fn grow_front<R: Rng>(
        &self,
        graph: &mut BridgeGraph,
        front: &Front,
        tips: &[NodeId],
        params: &GrowthParams,
        rng: &mut R,
    ) {
        let budget = params.node_budget as usize;
        let t = &self.tuning;
        let generation = self.step + 1;

        for &tip in tips {
            if graph.node_count() >= budget {
                return;
            }
            let Some((tx, ty, tz)) = graph.position3(tip) else {
                continue;
            };

            let dx = front.target.0 - tx;
            let dy = front.target.1 - ty;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < t.arrival_distance {
                continue;
            }

            let near = dist <= t.near_band;
            let branch_probability = if near {
                params.branch_probability * t.near_branch_scale
            } else {
                params.branch_probability
            };
            let chaos = if near {
                params.chaos_factor / 100.0 * t.near_chaos_scale
            } else {
                params.chaos_factor / 100.0
            };

            let branches = if rng.random::<f32>() * 100.0 < branch_probability {
                2
            } else {
                1
            };
            let heading = dy.atan2(dx);

            for _ in 0..branches {
                if graph.node_count() >= budget {
                    return;
                }
                let angle = heading + (rng.random::<f32>() - 0.5) * PI * chaos * t.chaos_spread;
                let jitter = rng.random::<f32>() * t.step_jitter;
                let length = (dist * t.step_fraction).min(t.max_step_length) + jitter;

                let x = tx + angle.cos() * length;
                let y = ty + angle.sin() * length + params.sag_arc * t.sag_scale;
                let z = tz
                    + (rng.random::<f32>() - 0.5) * params.structural_depth * t.depth_jitter_scale;

                graph.add_node((x, y, z), generation, NodeState::new(), front.origin);
            }
        }
    }
}

/// Unit direction from a front's seeds to its target.
#[derive(Debug, Clone, Copy)]
struct Axis {
    origin: (f32, f32),
    target: (f32, f32),
    dir: Option<(f32, f32)>,
}

impl Axis {
    fn new(origin: (f32, f32), target: (f32, f32)) -> Self {
        let dx = target.0 - origin.0;
        let dy = target.1 - origin.1;
        let len = (dx * dx + dy * dy).sqrt();
        let dir = (len > 0.0).then(|| (dx / len, dy / len));
        Self { origin, target, dir }
    }

    /// Progress of a point along the axis. A degenerate axis ranks by
    /// closeness to the target instead.
    fn project(&self, (x, y): (f32, f32)) -> f32 {
        match self.dir {
            Some((ux, uy)) => (x - self.origin.0) * ux + (y - self.origin.1) * uy,
            None => {
                let dx = self.target.0 - x;
                let dy = self.target.1 - y;
                1.0 / (1.0 + (dx * dx + dy * dy).sqrt())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::WorldBounds;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn platforms(distance: f32) -> Platforms {
        Platforms::around_center(WorldBounds::new(1000.0, 600.0), distance, 0.0)
    }

    fn seeded(
        engine: &GrowthEngine,
        platforms: &Platforms,
        params: &GrowthParams,
        rng: &mut StdRng,
    ) -> BridgeGraph {
        let mut graph = BridgeGraph::new();
        engine.create_seed_nodes(&mut graph, platforms, params, rng);
        graph
    }

    fn run_to_halt(
        engine: &mut GrowthEngine,
        graph: &mut BridgeGraph,
        platforms: &Platforms,
        params: &GrowthParams,
        rng: &mut StdRng,
    ) -> u32 {
        let connectivity = ConnectivityBuilder::default();
        let mut calls = 0;
        while engine.step(graph, Some(platforms), params, &connectivity, rng) {
            calls += 1;
            assert!(calls < 10_000, "growth never halted");
        }
        calls + 1
    }

    #[test]
    fn test_seed_nodes_on_facing_edges() {
        let platforms = platforms(500.0);
        let engine = GrowthEngine::default();
        let mut rng = StdRng::seed_from_u64(1);
        let graph = seeded(&engine, &platforms, &GrowthParams::default(), &mut rng);

        assert_eq!(graph.node_count(), 6);
        for id in graph.node_ids() {
            let state = graph.state(id).unwrap();
            assert!(state.is_platform() && state.is_fixed());
            assert_eq!(graph.generation(id), Some(0));
            assert!(graph.position3(id).unwrap().2.abs() <= 15.0);
        }

        let left: Vec<_> = graph
            .node_ids()
            .filter(|&id| graph.origin(id) == Some(Origin::Left))
            .collect();
        assert_eq!(left.len(), 3);
        let (x, y) = graph.position(left[0]).unwrap();
        assert_eq!(x, platforms.left.right());
        assert_eq!(y, platforms.left.y + 20.0);
        assert_eq!(graph.position(NodeId(3)).unwrap().0, platforms.right.x);
    }

    #[test]
    fn test_seeds_respect_budget() {
        let platforms = platforms(500.0);
        let engine = GrowthEngine::default();
        let mut rng = StdRng::seed_from_u64(1);
        let params = GrowthParams::default().with_node_budget(4);
        let graph = seeded(&engine, &platforms, &params, &mut rng);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_node_budget_is_never_exceeded() {
        let platforms = platforms(500.0);
        let params = GrowthParams::default()
            .with_node_budget(40)
            .with_branch_probability(100.0);
        let mut engine = GrowthEngine::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut graph = seeded(&engine, &platforms, &params, &mut rng);

        run_to_halt(&mut engine, &mut graph, &platforms, &params, &mut rng);
        assert_eq!(graph.node_count(), 40);
        assert_eq!(engine.halt_reason(), Some(HaltReason::NodeBudget));
        assert!(!engine.is_growing());
    }

    #[test]
    fn test_step_budget() {
        let platforms = platforms(800.0);
        let params = GrowthParams::default().with_node_budget(100_000);
        let tuning = GrowthTuning::default().with_max_steps(3).with_halt_on_arrival(false);
        let mut engine = GrowthEngine::new(tuning, GrowthStrategy::Unidirectional);
        let connectivity = ConnectivityBuilder::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut graph = seeded(&engine, &platforms, &params, &mut rng);

        assert!(engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng));
        assert!(engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng));
        assert!(!engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng));
        assert_eq!(engine.halt_reason(), Some(HaltReason::StepBudget));
        assert_eq!(engine.steps_taken(), 3);

        // Halted is terminal.
        assert!(!engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng));
        assert_eq!(engine.steps_taken(), 3);
    }

    #[test]
    fn test_generations_follow_steps() {
        let platforms = platforms(500.0);
        let params = GrowthParams::default();
        let mut engine = GrowthEngine::default();
        let connectivity = ConnectivityBuilder::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut graph = seeded(&engine, &platforms, &params, &mut rng);

        engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng);
        let grown: Vec<_> = graph.node_ids().skip(6).collect();
        assert!((3..=6).contains(&grown.len()));
        for id in grown {
            assert_eq!(graph.generation(id), Some(1));
            assert_eq!(graph.origin(id), Some(Origin::Left));
            assert!(!graph.state(id).unwrap().is_immobile());
        }
        assert!(graph.edge_count() > 0);
    }

    #[test]
    fn test_no_seeds_halts_immediately() {
        let platforms = platforms(500.0);
        let mut engine = GrowthEngine::default();
        let connectivity = ConnectivityBuilder::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut graph = BridgeGraph::new();

        let params = GrowthParams::default();
        assert!(!engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng));
        assert_eq!(engine.halt_reason(), Some(HaltReason::NoTips));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_no_platforms_halts() {
        let mut engine = GrowthEngine::default();
        let connectivity = ConnectivityBuilder::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut graph = BridgeGraph::new();

        assert!(!engine.step(&mut graph, None, &GrowthParams::default(), &connectivity, &mut rng));
        assert_eq!(engine.state(), GrowthState::Halted(HaltReason::NoTips));
    }

    #[test]
    fn test_target_reached_when_platforms_touch() {
        let platforms = platforms(20.0);
        let params = GrowthParams::default();
        let mut engine = GrowthEngine::default();
        let connectivity = ConnectivityBuilder::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut graph = seeded(&engine, &platforms, &params, &mut rng);

        assert!(!engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng));
        assert_eq!(engine.halt_reason(), Some(HaltReason::TargetReached));
    }

    #[test]
    fn test_bidirectional_grows_both_fronts() {
        let platforms = platforms(600.0);
        let params = GrowthParams::default().with_node_budget(200);
        let mut engine = GrowthEngine::new(GrowthTuning::default(), GrowthStrategy::Bidirectional);
        let connectivity = ConnectivityBuilder::default();
        let mut rng = StdRng::seed_from_u64(6);
        let mut graph = seeded(&engine, &platforms, &params, &mut rng);

        engine.step(&mut graph, Some(&platforms), &params, &connectivity, &mut rng);
        let grown_from = |origin| {
            graph
                .node_ids()
                .filter(|&id| graph.generation(id) == Some(1) && graph.origin(id) == Some(origin))
                .count()
        };
        assert!(grown_from(Origin::Left) >= 3);
        assert!(grown_from(Origin::Right) >= 3);

        // Right-front nodes head left, toward the middle of the gap.
        let middle_x = (platforms.left.right() + platforms.right.x) / 2.0;
        for id in graph.node_ids().filter(|&id| graph.origin(id) == Some(Origin::Right)) {
            assert!(graph.position(id).unwrap().0 >= middle_x);
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let platforms = platforms(500.0);
        let params = GrowthParams::default();
        let run = |seed| {
            let mut engine = GrowthEngine::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut graph = seeded(&engine, &platforms, &params, &mut rng);
            run_to_halt(&mut engine, &mut graph, &platforms, &params, &mut rng);
            (graph.positions_x().to_vec(), graph.positions_y().to_vec(), graph.edge_count())
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_reset() {
        let platforms = platforms(500.0);
        let params = GrowthParams::default();
        let mut engine = GrowthEngine::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut graph = seeded(&engine, &platforms, &params, &mut rng);
        run_to_halt(&mut engine, &mut graph, &platforms, &params, &mut rng);

        engine.reset();
        assert_eq!(engine.state(), GrowthState::Idle);
        assert_eq!(engine.steps_taken(), 0);
        engine.start();
        assert!(engine.is_growing());
    }

    #[test]
    fn test_axis_projection() {
        let axis = Axis::new((0.0, 0.0), (10.0, 0.0));
        assert_eq!(axis.project((5.0, 3.0)), 5.0);
        assert!(axis.project((-1.0, 0.0)) < 0.0);

        let degenerate = Axis::new((1.0, 1.0), (1.0, 1.0));
        assert!(degenerate.project((1.0, 2.0)) > degenerate.project((1.0, 5.0)));
    }
}
