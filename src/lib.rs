//! Vine Bridge - WASM Module
//!
//! Procedural bridge growth for the Vine Bridge canvas demo. A lattice of
//! nodes grows from one platform toward the other as a biased random walk,
//! edges are derived from node proximity, a spring pass relaxes the result,
//! and a reachability check reports whether the two platforms are joined.
//! The module is compiled to WebAssembly and exposes a JavaScript-friendly
//! API via wasm-bindgen; drawing stays on the JavaScript side.
//!
//! # Architecture
//!
//! - `graph`: node/edge storage on petgraph's StableGraph with SoA buffers,
//!   platforms, and the connectivity builder
//! - `spatial`: uniform grid for radius queries, R-tree for hit testing
//! - `growth`: parameters and the vine growth engine
//! - `physics`: spring relaxation
//! - `analysis`: integrity, road extraction and statistics
//! - `session`: the owned engine state driven by the façade below

use js_sys::Float32Array;
use log::Level;
use wasm_bindgen::prelude::*;

pub mod analysis;
pub mod error;
pub mod graph;
pub mod growth;
pub mod physics;
pub mod session;
pub mod spatial;

use analysis::edge_strains;
use error::BridgeError;
use graph::{DistanceMetric, NodeId, WorldBounds};
use growth::{BridgeParams, GrowthStrategy};
use session::{BridgeSession, DEFAULT_HIT_RADIUS};

/// Initialize the WASM module: console logging and readable panics.
#[wasm_bindgen(start)]
pub fn init() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
}

/// Main entry point for the bridge engine.
///
/// Wraps a [`BridgeSession`] and provides the public API exposed to
/// JavaScript.
#[wasm_bindgen]
pub struct VineBridgeWasm {
    session: BridgeSession,
}

#[wasm_bindgen]
impl VineBridgeWasm {
    /// Create an engine for a canvas of the given size.
    ///
    /// `seed` drives every random draw, so equal seeds replay identically.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, seed: u32) -> Self {
        Self {
            session: BridgeSession::new(WorldBounds::new(width, height), seed as u64),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the parameter bag. Missing keys take their defaults.
    #[wasm_bindgen(js_name = setParams)]
    pub fn set_params(&mut self, params: JsValue) -> Result<(), JsError> {
        let params: BridgeParams = serde_wasm_bindgen::from_value(params)
            .map_err(|e| BridgeError::InvalidParams(e.to_string()))?;
        self.session.set_params(params)?;
        Ok(())
    }

    /// Current parameter bag.
    #[wasm_bindgen(js_name = getParams)]
    pub fn get_params(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(self.session.params())?)
    }

    /// Select `"unidirectional"` or `"bidirectional"` growth.
    #[wasm_bindgen(js_name = setGrowthStrategy)]
    pub fn set_growth_strategy(&mut self, strategy: &str) -> Result<(), JsError> {
        let strategy = match strategy {
            "unidirectional" => GrowthStrategy::Unidirectional,
            "bidirectional" => GrowthStrategy::Bidirectional,
            other => {
                let message = format!("unknown growth strategy {other:?}");
                return Err(BridgeError::InvalidParams(message).into());
            }
        };
        self.session.set_growth_strategy(strategy);
        Ok(())
    }

    /// Measure edges with the depth-weighted metric instead of planar distance.
    #[wasm_bindgen(js_name = setDepthWeighted)]
    pub fn set_depth_weighted(&mut self, enabled: bool) {
        let metric = if enabled {
            DistanceMetric::DepthWeighted
        } else {
            DistanceMetric::Planar
        };
        self.session.set_distance_metric(metric);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Clear all nodes, edges, platforms and growth state.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Restart the random source so the next `generate` replays `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.session.reseed(seed as u64);
    }

    /// Lay out both platforms around the centre of the canvas.
    #[wasm_bindgen(js_name = createPlatforms)]
    pub fn create_platforms(&mut self, width: f32, height: f32, distance: f32, height_diff: f32) {
        self.session
            .create_platforms(WorldBounds::new(width, height), distance, height_diff);
    }

    /// Seed anchor nodes. Returns the number of seeds placed.
    #[wasm_bindgen(js_name = createSeedNodes)]
    pub fn create_seed_nodes(&mut self) -> u32 {
        self.session.create_seed_nodes() as u32
    }

    /// Reset, create platforms from the current parameters and seed them.
    pub fn generate(&mut self) -> u32 {
        self.session.generate() as u32
    }

    /// Run one growth step. Returns false once growth has halted.
    pub fn step(&mut self) -> bool {
        self.session.step()
    }

    /// Advance one animation frame. Returns `{steps, halted, broken}`.
    pub fn tick(&mut self) -> Result<JsValue, JsError> {
        let outcome = self.session.tick();
        Ok(serde_wasm_bindgen::to_value(&outcome)?)
    }

    /// Recompute every edge for `radius`. Returns the edge count.
    #[wasm_bindgen(js_name = rebuildConnectivity)]
    pub fn rebuild_connectivity(&mut self, radius: f32) -> u32 {
        self.session.rebuild_connectivity(radius) as u32
    }

    /// One spring relaxation pass.
    pub fn relax(&mut self, stiffness: f32) {
        self.session.relax(stiffness);
    }

    /// Remove overstretched edges. Returns the number broken.
    #[wasm_bindgen(js_name = breakOverstretched)]
    pub fn break_overstretched(&mut self, threshold: f32) -> u32 {
        self.session.break_overstretched(threshold) as u32
    }

    /// Returns `{reachable, percentage}`.
    #[wasm_bindgen(js_name = computeIntegrity)]
    pub fn compute_integrity(&mut self) -> Result<JsValue, JsError> {
        let report = self.session.compute_integrity();
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Select road nodes, sorted by x.
    #[wasm_bindgen(js_name = extractRoad)]
    pub fn extract_road(&mut self) -> Vec<u32> {
        self.session.extract_road().iter().map(|id| id.0).collect()
    }

    /// Road nodes from the last extraction.
    #[wasm_bindgen(js_name = getRoadNodes)]
    pub fn get_road_nodes(&self) -> Vec<u32> {
        self.session.road_nodes().iter().map(|id| id.0).collect()
    }

    /// Place a reinforcement node. Returns its id, or `undefined` while
    /// growth is running.
    #[wasm_bindgen(js_name = addManualNode)]
    pub fn add_manual_node(&mut self, x: f32, y: f32) -> Option<u32> {
        self.session.add_manual_node(x, y).map(|id| id.0)
    }

    /// Drag a free node. Returns false for anchors and unknown ids.
    #[wasm_bindgen(js_name = dragNode)]
    pub fn drag_node(&mut self, node_id: u32, x: f32, y: f32) -> bool {
        self.session.drag_node(NodeId(node_id), x, y)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[wasm_bindgen(js_name = isGrowing)]
    pub fn is_growing(&self) -> bool {
        self.session.is_growing()
    }

    /// Why growth stopped, if it has.
    #[wasm_bindgen(js_name = haltReason)]
    pub fn halt_reason(&self) -> Option<String> {
        self.session.growth().halt_reason().map(|reason| reason.to_string())
    }

    /// Stats panel numbers.
    pub fn stats(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.session.stats())?)
    }

    /// Snapshot of one node, or `undefined`.
    #[wasm_bindgen(js_name = getNode)]
    pub fn get_node(&self, node_id: u32) -> Result<JsValue, JsError> {
        match self.session.graph().node(NodeId(node_id)) {
            Some(node) => Ok(serde_wasm_bindgen::to_value(&node)?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Every live node, ordered by id.
    #[wasm_bindgen(js_name = getNodes)]
    pub fn get_nodes(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.session.graph().nodes())?)
    }

    /// `{left, right}` platform rectangles, or `undefined`.
    #[wasm_bindgen(js_name = getPlatforms)]
    pub fn get_platforms(&self) -> Result<JsValue, JsError> {
        match self.session.platforms() {
            Some(platforms) => Ok(serde_wasm_bindgen::to_value(platforms)?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Node under the pointer, within `max_distance` (default 11).
    #[wasm_bindgen(js_name = findNodeAt)]
    pub fn find_node_at(&mut self, x: f32, y: f32, max_distance: Option<f32>) -> Option<u32> {
        self.session
            .find_node_at(x, y, max_distance.unwrap_or(DEFAULT_HIT_RADIUS))
            .map(|id| id.0)
    }

    /// Neighbour ids of a node.
    #[wasm_bindgen(js_name = getConnections)]
    pub fn get_connections(&self, node_id: u32) -> Vec<u32> {
        self.session
            .graph()
            .connections(NodeId(node_id))
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.session.graph().node_count() as u32
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.session.graph().edge_count() as u32
    }

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for drawing, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.session.graph().positions_x()) }
    }

    /// Get a zero-copy view of Y positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for drawing, do not store.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.session.graph().positions_y()) }
    }

    /// Get a zero-copy view of depth offsets.
    #[wasm_bindgen(js_name = getPositionsZView)]
    pub fn get_positions_z_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.session.graph().positions_z()) }
    }

    /// Get the length of the positions buffers.
    #[wasm_bindgen(js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.session.graph().positions_x().len()
    }

    /// Edge endpoints as [a0, b0, a1, b1, ...].
    #[wasm_bindgen(js_name = getEdgePairs)]
    pub fn get_edge_pairs(&self) -> Vec<u32> {
        self.session.graph().edge_pairs()
    }

    /// Rest length per edge, in `getEdgePairs` order.
    #[wasm_bindgen(js_name = getEdgeRestLengths)]
    pub fn get_edge_rest_lengths(&self) -> Vec<f32> {
        self.session
            .graph()
            .edges()
            .iter()
            .map(|edge| edge.rest_length)
            .collect()
    }

    /// Strain per edge, in `getEdgePairs` order.
    #[wasm_bindgen(js_name = getEdgeStrains)]
    pub fn get_edge_strains(&self) -> Vec<f32> {
        edge_strains(self.session.graph())
    }

    /// Packed flag byte per node (bit 0 fixed, bit 1 platform).
    #[wasm_bindgen(js_name = getNodeFlags)]
    pub fn get_node_flags(&self) -> Vec<u8> {
        self.session
            .graph()
            .states()
            .iter()
            .map(|state| state.bits())
            .collect()
    }

    /// Bounding box [minX, minY, maxX, maxY] of all nodes.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.session
            .graph()
            .get_bounds()
            .map(|(min_x, min_y, max_x, max_y)| vec![min_x, min_y, max_x, max_y])
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::graph::Side;
    use crate::growth::HaltReason;

    fn session(seed: u64) -> BridgeSession {
        BridgeSession::new(WorldBounds::new(1000.0, 600.0), seed)
    }

    fn tick_until_halted(session: &mut BridgeSession) {
        for _ in 0..2000 {
            if session.tick().halted {
                return;
            }
        }
        panic!("growth never halted");
    }

    /// Full pipeline: generate, animate until halt, then read everything
    /// the stats panel and renderer need.
    #[test]
    fn test_generate_animate_and_report() {
        let mut session = session(2024);
        session.generate();
        tick_until_halted(&mut session);

        let graph = session.graph();
        assert!(graph.node_count() <= 80);
        for id in graph.node_ids() {
            for other in graph.connections(id) {
                assert!(graph.connections(other).contains(&id));
            }
        }

        let stats = session.stats();
        assert_eq!(stats.node_count, graph.node_count());
        assert_eq!(stats.edge_count, graph.edge_count());
        assert!(stats.progress <= 100);
        assert!(stats.growth_steps > 0);

        let road = session.road_nodes();
        let xs: Vec<f32> = road.iter().map(|&id| graph.position(id).unwrap().0).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        for &id in road {
            assert!(!graph.state(id).unwrap().is_platform());
        }
    }

    #[test]
    fn test_reachability_across_seeds() {
        let reached = (0..10)
            .filter(|&seed| {
                let mut session = session(seed);
                session.generate();
                while session.step() {}
                session.compute_integrity().reachable
            })
            .count();
        assert!(reached >= 1, "no seed produced a connected bridge");
    }

    #[test]
    fn test_bidirectional_pipeline() {
        let mut session = session(77);
        session.set_growth_strategy(GrowthStrategy::Bidirectional);
        session.generate();
        while session.step() {}

        let graph = session.graph();
        let grown = |origin| {
            graph
                .node_ids()
                .filter(|&id| graph.origin(id) == Some(origin) && graph.generation(id) > Some(0))
                .count()
        };
        assert!(grown(graph::Origin::Left) > 0);
        assert!(grown(graph::Origin::Right) > 0);
        assert!(session.growth().halt_reason().is_some());
    }

    #[test]
    fn test_manual_reinforcement_after_growth() {
        let mut session = session(5);
        session.generate();
        while session.step() {}
        let edges_before = session.graph().edge_count();

        let (x, y) = session.platforms().unwrap().facing_midpoint(Side::Left);
        let id = session.add_manual_node(x + 40.0, y).unwrap();
        assert!(session.graph().edge_count() > edges_before);

        assert!(session.drag_node(id, x + 60.0, y + 10.0));
        for edge in session.graph().edges() {
            if edge.a == id || edge.b == id {
                let current = session.graph().edge_length(&edge);
                assert!((current - edge.rest_length).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_degenerate_inputs_are_terminal_states() {
        let mut session = session(1);
        let params = BridgeParams {
            node_budget: 0,
            connectivity_radius: 0.0,
            ..BridgeParams::default()
        };
        session.set_params(params).unwrap();

        assert_eq!(session.generate(), 0);
        assert!(!session.step());
        assert_eq!(session.growth().halt_reason(), Some(HaltReason::NodeBudget));
        assert!(!session.compute_integrity().reachable);
        assert!(session.extract_road().is_empty());
        assert_eq!(session.rebuild_connectivity(-1.0), 0);
    }

    #[test]
    fn test_same_seed_replays() {
        let run = |seed| {
            let mut session = session(seed);
            session.generate();
            for _ in 0..120 {
                session.tick();
            }
            (
                session.graph().positions_x().to_vec(),
                session.graph().positions_y().to_vec(),
                session.graph().edge_pairs(),
            )
        };
        assert_eq!(run(31), run(31));
    }
}
