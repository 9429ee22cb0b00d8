//! Structural integrity: anchor-to-anchor reachability and edge breaking.
//!
//! Reachability is a multi-source BFS over the edge topology, seeded with
//! every left anchor and stopped at the first right anchor it dequeues. The
//! percentage is a crude density heuristic that saturates at 100; it says
//! nothing about path quality.

use std::collections::HashSet;

use log::info;
use petgraph::visit::{Bfs, VisitMap};
use serde::Serialize;

use crate::graph::{BridgeGraph, NodeId, Platform, Platforms};

/// Integrity settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrityConfig {
    /// How far from its platform rectangle a platform node may sit and still
    /// count as an anchor (default: 5).
    pub anchor_tolerance: f32,
    /// Edges longer than `rest * break_threshold` snap (default: 1.6).
    pub break_threshold: f32,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            anchor_tolerance: 5.0,
            break_threshold: 1.6,
        }
    }
}

impl IntegrityConfig {
    pub fn with_anchor_tolerance(mut self, tolerance: f32) -> Self {
        self.anchor_tolerance = tolerance;
        self
    }

    pub fn with_break_threshold(mut self, threshold: f32) -> Self {
        self.break_threshold = threshold;
        self
    }
}

/// Result of an integrity check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub reachable: bool,
    /// Density score in [0, 100]; zero when unreachable.
    pub percentage: f32,
}

impl IntegrityReport {
    pub const UNREACHABLE: IntegrityReport = IntegrityReport {
        reachable: false,
        percentage: 0.0,
    };
}

#[derive(Debug, Clone, Default)]
pub struct IntegrityChecker {
    config: IntegrityConfig,
}

impl IntegrityChecker {
    pub fn new(config: IntegrityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IntegrityConfig {
        &self.config
    }

    /// Check whether the two anchor clusters are connected.
    pub fn check(&self, graph: &BridgeGraph, platforms: Option<&Platforms>) -> IntegrityReport {
        let Some(platforms) = platforms else {
            return IntegrityReport::UNREACHABLE;
        };

        let left = self.anchors(graph, &platforms.left);
        let right: HashSet<NodeId> = self.anchors(graph, &platforms.right).into_iter().collect();
        if left.is_empty() || right.is_empty() {
            return IntegrityReport::UNREACHABLE;
        }

        if !Self::reaches(graph, &left, &right) {
            return IntegrityReport::UNREACHABLE;
        }

        IntegrityReport {
            reachable: true,
            percentage: Self::density(graph),
        }
    }

    /// Platform nodes within the anchor tolerance of `platform`.
    pub fn anchors(&self, graph: &BridgeGraph, platform: &Platform) -> Vec<NodeId> {
        let tolerance = self.config.anchor_tolerance;
        graph
            .node_ids()
            .filter(|&id| graph.state(id).is_some_and(|s| s.is_platform()))
            .filter(|&id| {
                graph
                    .position(id)
                    .is_some_and(|(x, y)| platform.distance_to(x, y) <= tolerance)
            })
            .collect()
    }

    fn reaches(graph: &BridgeGraph, sources: &[NodeId], goals: &HashSet<NodeId>) -> bool {
        let topology = graph.topology();
        let Some(&first) = sources.first() else {
            return false;
        };

        let mut bfs = Bfs::new(topology, BridgeGraph::index_of(first));
        for &source in &sources[1..] {
            let index = BridgeGraph::index_of(source);
            if bfs.discovered.visit(index) {
                bfs.stack.push_back(index);
            }
        }

        while let Some(index) = bfs.next(topology) {
            if goals.contains(&topology[index]) {
                return true;
            }
        }
        false
    }

    /// `min(100, edges / (0.1 * n(n-1)/2) * 100)`.
    fn density(graph: &BridgeGraph) -> f32 {
        let n = graph.node_count() as f32;
        let possible = n * (n - 1.0) / 2.0;
        if possible <= 0.0 {
            return 0.0;
        }
        (graph.edge_count() as f32 / (0.1 * possible) * 100.0).min(100.0)
    }

    /// Remove every edge stretched past `threshold` times its rest length.
    /// Returns the number of edges removed.
    pub fn break_overstretched(&self, graph: &mut BridgeGraph, threshold: f32) -> usize {
        let broken =
            graph.retain_edges(|g, edge| !edge.is_overstretched(g.edge_length(edge), threshold));
        if broken > 0 {
            info!("{broken} edges broke");
        }
        broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeState, Origin, WorldBounds};

    fn platforms() -> Platforms {
        // Facing edges at x = 250 and x = 750, centre y = 300.
        Platforms::around_center(WorldBounds::new(1000.0, 600.0), 500.0, 0.0)
    }

    fn anchor(graph: &mut BridgeGraph, x: f32, y: f32, origin: Origin) -> NodeId {
        graph.add_node((x, y, 0.0), 0, NodeState::anchor(), origin)
    }

    fn free(graph: &mut BridgeGraph, x: f32, y: f32) -> NodeId {
        graph.add_node((x, y, 0.0), 1, NodeState::new(), Origin::Left)
    }

    /// Left anchor, a chain of free nodes every 100 units, right anchor.
    fn chain(graph: &mut BridgeGraph) -> Vec<NodeId> {
        let mut ids = vec![anchor(graph, 250.0, 300.0, Origin::Left)];
        for i in 1..5 {
            ids.push(free(graph, 250.0 + 100.0 * i as f32, 300.0));
        }
        ids.push(anchor(graph, 750.0, 300.0, Origin::Right));
        for pair in ids.windows(2) {
            graph.connect(pair[0], pair[1], 100.0);
        }
        ids
    }

    #[test]
    fn test_connected_chain_is_reachable() {
        let mut graph = BridgeGraph::new();
        chain(&mut graph);

        let report = IntegrityChecker::default().check(&graph, Some(&platforms()));
        assert!(report.reachable);
        // 5 edges out of 15 possible pairs saturates the density score.
        assert_eq!(report.percentage, 100.0);
    }

    #[test]
    fn test_gap_is_unreachable() {
        let mut graph = BridgeGraph::new();
        let ids = chain(&mut graph);
        graph.disconnect(ids[2], ids[3]);

        let report = IntegrityChecker::default().check(&graph, Some(&platforms()));
        assert_eq!(report, IntegrityReport::UNREACHABLE);
    }

    #[test]
    fn test_any_left_anchor_can_start() {
        let mut graph = BridgeGraph::new();
        let ids = chain(&mut graph);
        graph.disconnect(ids[0], ids[1]);
        let second = anchor(&mut graph, 250.0, 320.0, Origin::Left);
        graph.connect(second, ids[1], 100.0);

        assert!(IntegrityChecker::default().check(&graph, Some(&platforms())).reachable);
    }

    #[test]
    fn test_missing_anchors() {
        let mut graph = BridgeGraph::new();
        let a = anchor(&mut graph, 250.0, 300.0, Origin::Left);
        let b = free(&mut graph, 350.0, 300.0);
        graph.connect(a, b, 100.0);

        let checker = IntegrityChecker::default();
        assert_eq!(checker.check(&graph, Some(&platforms())), IntegrityReport::UNREACHABLE);
        assert_eq!(checker.check(&graph, None), IntegrityReport::UNREACHABLE);
    }

    #[test]
    fn test_anchor_tolerance() {
        let mut graph = BridgeGraph::new();
        anchor(&mut graph, 254.0, 300.0, Origin::Left);
        anchor(&mut graph, 260.0, 300.0, Origin::Left);
        free(&mut graph, 250.0, 300.0);

        let checker = IntegrityChecker::default();
        assert_eq!(checker.anchors(&graph, &platforms().left), vec![NodeId(0)]);
    }

    #[test]
    fn test_density_score() {
        let mut graph = BridgeGraph::new();
        chain(&mut graph);
        for i in 0..40 {
            free(&mut graph, 300.0 + i as f32, 500.0);
        }
        // 46 nodes -> 1035 possible pairs; 5 edges / 103.5 ~ 4.8%.
        let report = IntegrityChecker::default().check(&graph, Some(&platforms()));
        assert!(report.reachable);
        assert!((report.percentage - 500.0 / 103.5).abs() < 1e-3);
    }

    #[test]
    fn test_break_threshold() {
        let mut graph = BridgeGraph::new();
        let a = free(&mut graph, 0.0, 0.0);
        let b = free(&mut graph, 161.0, 0.0);
        let c = free(&mut graph, 0.0, 100.0);
        let d = free(&mut graph, 159.0, 100.0);
        graph.connect(a, b, 100.0);
        graph.connect(c, d, 100.0);

        let broken = IntegrityChecker::default().break_overstretched(&mut graph, 1.6);
        assert_eq!(broken, 1);
        assert!(!graph.are_connected(a, b));
        assert!(graph.are_connected(c, d));
        assert!(graph.connections(a).is_empty());
        assert!(graph.connections(b).is_empty());
    }
}
