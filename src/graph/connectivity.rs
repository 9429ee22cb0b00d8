//! Connectivity builder: derives the edge set from node positions.
//!
//! Every pass is a full recompute. All edges are dropped, then every pair of
//! nodes within the connectivity radius is connected with a fresh rest length
//! equal to its current distance. Small graphs compare all pairs; larger ones
//! go through a [`SpatialGrid`] built over the current positions.

use std::collections::HashSet;

use log::debug;

use super::engine::BridgeGraph;
use super::node::NodeId;
use crate::spatial::SpatialGrid;

/// Configuration for the connectivity pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityConfig {
    /// Node count up to which all pairs are compared directly (default: 50).
    pub brute_force_limit: usize,
    /// Cell size of the spatial grid (default: 150).
    pub cell_size: f32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            brute_force_limit: 50,
            cell_size: 150.0,
        }
    }
}

impl ConnectivityConfig {
    pub fn with_brute_force_limit(mut self, limit: usize) -> Self {
        self.brute_force_limit = limit;
        self
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }
}

/// Rebuilds the edge set of a [`BridgeGraph`].
#[derive(Debug, Clone, Default)]
pub struct ConnectivityBuilder {
    config: ConnectivityConfig,
}

impl ConnectivityBuilder {
    pub fn new(config: ConnectivityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectivityConfig {
        &self.config
    }

    /// Recompute all edges for `radius`. Returns the resulting edge count.
    ///
    /// A non-positive or non-finite radius leaves the graph without edges.
    pub fn rebuild(&self, graph: &mut BridgeGraph, radius: f32) -> usize {
        graph.clear_edges();

        if !(radius.is_finite() && radius > 0.0) || graph.node_count() < 2 {
            return 0;
        }

        if graph.node_count() <= self.config.brute_force_limit {
            Self::connect_all_pairs(graph, radius);
        } else {
            self.connect_with_grid(graph, radius);
        }

        debug!(
            "connectivity rebuilt: {} nodes, {} edges (radius {radius})",
            graph.node_count(),
            graph.edge_count()
        );
        graph.edge_count()
    }

    fn connect_all_pairs(graph: &mut BridgeGraph, radius: f32) {
        let n = graph.node_count() as u32;
        for i in 0..n {
            for j in (i + 1)..n {
                Self::connect_if_within(graph, NodeId(i), NodeId(j), radius);
            }
        }
    }

    fn connect_with_grid(&self, graph: &mut BridgeGraph, radius: f32) {
        let Some((min_x, min_y, max_x, max_y)) = graph.get_bounds() else {
            return;
        };

        let mut grid = SpatialGrid::new(min_x, min_y, max_x, max_y, self.config.cell_size);
        for id in graph.node_ids() {
            let (x, y) = (graph.positions_x()[id.index()], graph.positions_y()[id.index()]);
            grid.insert(id, x, y);
        }

        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
        let ids: Vec<NodeId> = graph.node_ids().collect();
        for a in ids {
            let (x, y) = (graph.positions_x()[a.index()], graph.positions_y()[a.index()]);
            for b in grid.query(x, y, radius) {
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                if !seen.insert(key) {
                    continue;
                }
                Self::connect_if_within(graph, key.0, key.1, radius);
            }
        }
    }

    fn connect_if_within(graph: &mut BridgeGraph, a: NodeId, b: NodeId, radius: f32) {
        if let Some(distance) = graph.distance(a, b) {
            if distance <= radius {
                graph.connect(a, b, distance);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DistanceMetric, NodeState, Origin};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_graph(count: usize, seed: u64) -> BridgeGraph {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = BridgeGraph::new();
        for _ in 0..count {
            let position = (
                rng.random_range(0.0..600.0),
                rng.random_range(0.0..400.0),
                rng.random_range(-30.0..30.0),
            );
            graph.add_node(position, 1, NodeState::new(), Origin::Left);
        }
        graph
    }

    fn assert_consistent(graph: &BridgeGraph) {
        let mut total = 0;
        for id in graph.node_ids() {
            let connections = graph.connections(id);
            total += connections.len();
            for other in connections {
                assert!(graph.connections(other).contains(&id), "{id} -> {other} not symmetric");
            }
        }
        assert_eq!(graph.edge_count() * 2, total);
    }

    #[test]
    fn test_brute_force_small_graph() {
        let mut graph = BridgeGraph::new();
        let a = graph.add_node((0.0, 0.0, 0.0), 0, NodeState::anchor(), Origin::Left);
        let b = graph.add_node((30.0, 40.0, 0.0), 1, NodeState::new(), Origin::Left);
        let c = graph.add_node((200.0, 0.0, 0.0), 1, NodeState::new(), Origin::Left);

        let edges = ConnectivityBuilder::default().rebuild(&mut graph, 50.0);
        assert_eq!(edges, 1);
        assert!(graph.are_connected(a, b));
        assert!(!graph.are_connected(a, c));
        assert_eq!(graph.edges()[0].rest_length, 50.0);
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let base = random_graph(180, 11);
        let radius = 70.0;

        let mut with_grid = random_graph(180, 11);
        ConnectivityBuilder::default().rebuild(&mut with_grid, radius);

        let mut brute = random_graph(180, 11);
        ConnectivityBuilder::new(ConnectivityConfig::default().with_brute_force_limit(usize::MAX))
            .rebuild(&mut brute, radius);

        assert!(with_grid.edge_count() > 0);
        assert_eq!(with_grid.edge_count(), brute.edge_count());
        for id in base.node_ids() {
            let mut a = with_grid.connections(id);
            let mut b = brute.connections(id);
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
        assert_consistent(&with_grid);
    }

    #[test]
    fn test_far_outlier_keeps_grid_bounded() {
        let with_outlier = |far: f32| {
            let mut graph = random_graph(60, 5);
            let id = graph.add_node((far, 200.0, 0.0), 1, NodeState::new(), Origin::Manual);
            (graph, id)
        };
        for far in [1e30, 3e38] {
            let (mut graph, outlier) = with_outlier(far);
            let (mut brute, _) = with_outlier(far);

            let everything = ConnectivityConfig::default().with_brute_force_limit(usize::MAX);
            ConnectivityBuilder::default().rebuild(&mut graph, 70.0);
            ConnectivityBuilder::new(everything).rebuild(&mut brute, 70.0);

            assert!(graph.connections(outlier).is_empty());
            assert_eq!(graph.edge_count(), brute.edge_count());
            assert_consistent(&graph);
        }
    }

    #[test]
    fn test_rebuild_discards_previous_edges() {
        let mut graph = random_graph(80, 3);
        let builder = ConnectivityBuilder::default();

        let wide = builder.rebuild(&mut graph, 150.0);
        let narrow = builder.rebuild(&mut graph, 40.0);
        assert!(narrow < wide);
        assert_consistent(&graph);

        for edge in graph.edges() {
            assert!(edge.rest_length <= 40.0);
        }
    }

    #[test]
    fn test_degenerate_radius() {
        let mut graph = random_graph(20, 5);
        let builder = ConnectivityBuilder::default();
        builder.rebuild(&mut graph, 100.0);

        assert_eq!(builder.rebuild(&mut graph, 0.0), 0);
        assert_eq!(builder.rebuild(&mut graph, -5.0), 0);
        assert_eq!(builder.rebuild(&mut graph, f32::NAN), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_depth_weighted_metric() {
        let mut graph = BridgeGraph::new();
        let a = graph.add_node((0.0, 0.0, 0.0), 0, NodeState::new(), Origin::Left);
        let b = graph.add_node((40.0, 0.0, 60.0), 0, NodeState::new(), Origin::Left);

        let builder = ConnectivityBuilder::default();
        builder.rebuild(&mut graph, 50.0);
        assert!(graph.are_connected(a, b));

        graph.set_metric(DistanceMetric::DepthWeighted);
        builder.rebuild(&mut graph, 50.0);
        assert!(!graph.are_connected(a, b));
    }
}
