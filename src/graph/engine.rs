//! BridgeGraph - node arena and edge topology.
//!
//! Topology is stored in petgraph's StableGraph (undirected, edge weight =
//! rest length). Per-node attributes live in SoA (Structure of Arrays)
//! buffers so the renderer can read positions through zero-copy views.
//!
//! Nodes are only ever appended and the whole graph is cleared at once, so a
//! node's `NodeId` is also its petgraph index and its slot in every buffer.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Undirected;

use super::edge::{DistanceMetric, Edge};
use super::node::{Node, NodeId, NodeState, Origin};

/// Undirected topology; node weight is the node's id, edge weight its rest length.
pub type Topology = StableGraph<NodeId, f32, Undirected>;

/// Mutable view over the buffers the physics pass integrates.
pub struct MotionBuffers<'a> {
    pub pos_x: &'a mut [f32],
    pub pos_y: &'a mut [f32],
    pub vel_x: &'a mut [f32],
    pub vel_y: &'a mut [f32],
    pub states: &'a [NodeState],
}

/// The bridge lattice: nodes, their attributes, and the derived edge set.
pub struct BridgeGraph {
    /// Edge topology.
    graph: Topology,

    /// X positions (SoA layout)
    pos_x: Vec<f32>,

    /// Y positions (SoA layout)
    pos_y: Vec<f32>,

    /// Depth offsets, cosmetic only (SoA layout)
    pos_z: Vec<f32>,

    /// X velocities (SoA layout)
    vel_x: Vec<f32>,

    /// Y velocities (SoA layout)
    vel_y: Vec<f32>,

    /// Growth wave that created each node
    generations: Vec<u32>,

    /// Fixed / platform flags
    states: Vec<NodeState>,

    /// Growth front each node belongs to
    origins: Vec<Origin>,

    /// Metric used for edge lengths
    metric: DistanceMetric,
}

impl BridgeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            pos_z: Vec::with_capacity(node_capacity),
            vel_x: Vec::with_capacity(node_capacity),
            vel_y: Vec::with_capacity(node_capacity),
            generations: Vec::with_capacity(node_capacity),
            states: Vec::with_capacity(node_capacity),
            origins: Vec::with_capacity(node_capacity),
            metric: DistanceMetric::default(),
        }
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Append a node and return its id. Velocity starts at zero.
    pub fn add_node(
        &mut self,
        position: (f32, f32, f32),
        generation: u32,
        state: NodeState,
        origin: Origin,
    ) -> NodeId {
        let id = NodeId(self.pos_x.len() as u32);
        let index = self.graph.add_node(id);
        debug_assert_eq!(index.index(), id.index());

        self.pos_x.push(position.0);
        self.pos_y.push(position.1);
        self.pos_z.push(position.2);
        self.vel_x.push(0.0);
        self.vel_y.push(0.0);
        self.generations.push(generation);
        self.states.push(state);
        self.origins.push(origin);
        id
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.pos_x.len()
    }

    /// Whether `id` refers to an existing node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.pos_x.len()
    }

    /// Iterate over all node ids in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.pos_x.len() as u32).map(NodeId)
    }

    /// Get a node's (x, y) position.
    pub fn position(&self, id: NodeId) -> Option<(f32, f32)> {
        self.contains(id)
            .then(|| (self.pos_x[id.index()], self.pos_y[id.index()]))
    }

    /// Get a node's (x, y, z) position.
    pub fn position3(&self, id: NodeId) -> Option<(f32, f32, f32)> {
        self.contains(id).then(|| {
            let i = id.index();
            (self.pos_x[i], self.pos_y[i], self.pos_z[i])
        })
    }

    /// Get a node's velocity.
    pub fn velocity(&self, id: NodeId) -> Option<(f32, f32)> {
        self.contains(id)
            .then(|| (self.vel_x[id.index()], self.vel_y[id.index()]))
    }

    /// Get a node's state flags.
    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.states.get(id.index()).copied()
    }

    /// Get the growth front a node belongs to.
    pub fn origin(&self, id: NodeId) -> Option<Origin> {
        self.origins.get(id.index()).copied()
    }

    /// Get the generation that created a node.
    pub fn generation(&self, id: NodeId) -> Option<u32> {
        self.generations.get(id.index()).copied()
    }

    /// Snapshot of a single node, including its connection list.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        if !self.contains(id) {
            return None;
        }
        let i = id.index();
        let state = self.states[i];
        Some(Node {
            id,
            x: self.pos_x[i],
            y: self.pos_y[i],
            z: self.pos_z[i],
            vx: self.vel_x[i],
            vy: self.vel_y[i],
            generation: self.generations[i],
            is_fixed: state.is_fixed(),
            is_platform: state.is_platform(),
            origin: self.origins[i],
            connections: self.connections(id),
        })
    }

    /// Snapshots of every node.
    pub fn nodes(&self) -> Vec<Node> {
        self.node_ids().filter_map(|id| self.node(id)).collect()
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Metric used to measure edge lengths.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Change the metric. Existing rest lengths are kept until the next rebuild.
    pub fn set_metric(&mut self, metric: DistanceMetric) {
        self.metric = metric;
    }

    /// Distance between two nodes under the current metric.
    pub fn distance(&self, a: NodeId, b: NodeId) -> Option<f32> {
        Some(self.metric.distance(self.position3(a)?, self.position3(b)?))
    }

    /// Connect two nodes. Idempotent: returns false if already connected,
    /// if `a == b`, or if either node is unknown.
    pub fn connect(&mut self, a: NodeId, b: NodeId, rest_length: f32) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        let (ia, ib) = (Self::index_of(a), Self::index_of(b));
        if self.graph.find_edge(ia, ib).is_some() {
            return false;
        }
        self.graph.add_edge(ia, ib, rest_length);
        true
    }

    /// Remove the edge between two nodes, if present.
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        match self.graph.find_edge(Self::index_of(a), Self::index_of(b)) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    /// Whether two nodes are connected.
    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.contains(a)
            && self.contains(b)
            && self
                .graph
                .find_edge(Self::index_of(a), Self::index_of(b))
                .is_some()
    }

    /// Drop every edge. Nodes are untouched.
    pub fn clear_edges(&mut self) {
        self.graph.clear_edges();
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Connection list of a node (symmetric by construction).
    pub fn connections(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.graph
            .neighbors(Self::index_of(id))
            .map(|n| self.graph[n])
            .collect()
    }

    /// Number of connections of a node.
    pub fn degree(&self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        self.graph.neighbors(Self::index_of(id)).count()
    }

    /// Current edge list.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|e| Edge::new(self.graph[e.source()], self.graph[e.target()], *e.weight()))
            .collect()
    }

    /// Current length of an edge under the graph's metric.
    pub fn edge_length(&self, edge: &Edge) -> f32 {
        self.distance(edge.a, edge.b).unwrap_or(0.0)
    }

    /// Remove every edge for which `keep` returns false. Returns the number removed.
    pub fn retain_edges<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Self, &Edge) -> bool,
    {
        let this: &Self = self;
        let doomed: Vec<EdgeIndex> = this
            .graph
            .edge_references()
            .filter(|e| {
                let edge =
                    Edge::new(this.graph[e.source()], this.graph[e.target()], *e.weight());
                !keep(this, &edge)
            })
            .map(|e| e.id())
            .collect();

        for edge in &doomed {
            self.graph.remove_edge(*edge);
        }
        doomed.len()
    }

    /// Move a node, zeroing its velocity and resetting the rest length of
    /// every incident edge to its new current length.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        if !self.contains(id) {
            return false;
        }
        let i = id.index();
        self.pos_x[i] = x;
        self.pos_y[i] = y;
        self.vel_x[i] = 0.0;
        self.vel_y[i] = 0.0;

        let index = Self::index_of(id);
        let incident: Vec<(EdgeIndex, NodeId)> = self
            .graph
            .edges(index)
            .map(|e| {
                let other = if e.source() == index { e.target() } else { e.source() };
                (e.id(), self.graph[other])
            })
            .collect();

        for (edge, other) in incident {
            if let Some(length) = self.distance(id, other) {
                self.graph[edge] = length;
            }
        }
        true
    }

    /// Read access to the topology for graph traversals.
    pub fn topology(&self) -> &Topology {
        &self.graph
    }

    #[inline]
    pub(crate) fn index_of(id: NodeId) -> NodeIndex {
        NodeIndex::new(id.index())
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Get X positions slice.
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Get Y positions slice.
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    /// Get depth offsets slice.
    pub fn positions_z(&self) -> &[f32] {
        &self.pos_z
    }

    /// Get node state flags slice.
    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    /// Mutable position/velocity buffers for the physics pass.
    pub fn motion_mut(&mut self) -> MotionBuffers<'_> {
        MotionBuffers {
            pos_x: &mut self.pos_x,
            pos_y: &mut self.pos_y,
            vel_x: &mut self.vel_x,
            vel_y: &mut self.vel_y,
            states: &self.states,
        }
    }

    /// Edge endpoints as a flat [a0, b0, a1, b1, ...] array.
    pub fn edge_pairs(&self) -> Vec<u32> {
        let mut pairs = Vec::with_capacity(self.graph.edge_count() * 2);
        for edge in self.edges() {
            pairs.push(edge.a.0);
            pairs.push(edge.b.0);
        }
        pairs
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Get the bounding box (min_x, min_y, max_x, max_y) of all nodes.
    pub fn get_bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.pos_x.is_empty() {
            return None;
        }

        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for (&x, &y) in self.pos_x.iter().zip(&self.pos_y) {
            if x < min_x { min_x = x; }
            if x > max_x { max_x = x; }
            if y < min_y { min_y = y; }
            if y > max_y { max_y = y; }
        }

        Some((min_x, min_y, max_x, max_y))
    }

    /// Clear all nodes and edges, resetting ids to zero.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.pos_x.clear();
        self.pos_y.clear();
        self.pos_z.clear();
        self.vel_x.clear();
        self.vel_y.clear();
        self.generations.clear();
        self.states.clear();
        self.origins.clear();
    }
}

impl Default for BridgeGraph {
    fn default() -> Self {
        Self::new()
    }
}
