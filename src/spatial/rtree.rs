//! R-tree hit-test index using the rstar crate.
//!
//! The uniform grid answers the bulk radius queries of the connectivity
//! pass; this index answers the renderer's pointer queries ("which node is
//! under the cursor"), where a bulk-loaded R*-tree gives O(log n) lookups.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::graph::{BridgeGraph, NodeId};

/// A node position stored in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
}

impl NodePoint {
    pub fn new(id: NodeId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Hit-test index over node positions.
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load the index from the graph's current positions.
    pub fn rebuild(&mut self, graph: &BridgeGraph) {
        let points: Vec<_> = graph
            .node_ids()
            .zip(graph.positions_x().iter().zip(graph.positions_y()))
            .map(|(id, (&x, &y))| NodePoint::new(id, x, y))
            .collect();

        self.tree = RTree::bulk_load(points);
    }

    /// Find the nearest node within a maximum distance.
    pub fn nearest_within(&self, x: f32, y: f32, max_distance: f32) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|point| point.distance_2(&[x, y]) <= max_distance_sq)
            .map(|point| point.id)
    }

    /// Clear all nodes from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
