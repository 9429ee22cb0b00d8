//! Road extraction: the top profile of the grown lattice.
//!
//! The gap between the platforms is cut into equal vertical strips. Each
//! strip picks its highest node, preferring nodes above the average height of
//! the lattice (y grows downward). The pick is kept only if it has at least
//! one connection; a strip whose top node is isolated contributes nothing.

use log::debug;

use crate::graph::{BridgeGraph, NodeId, Platforms};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadConfig {
    /// Number of strips across the gap (default: 30).
    pub segments: usize,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self { segments: 30 }
    }
}

impl RoadConfig {
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoadExtractor {
    config: RoadConfig,
}

impl RoadExtractor {
    pub fn new(config: RoadConfig) -> Self {
        Self { config }
    }

    /// Select road nodes, sorted by x and free of duplicates.
    pub fn extract(&self, graph: &BridgeGraph, platforms: &Platforms) -> Vec<NodeId> {
        let bridge: Vec<(NodeId, f32, f32)> = graph
            .node_ids()
            .filter(|&id| graph.state(id).is_some_and(|s| !s.is_platform()))
            .filter_map(|id| graph.position(id).map(|(x, y)| (id, x, y)))
            .collect();

        let (start, end) = platforms.span();
        if bridge.is_empty() || self.config.segments == 0 || !(end > start) {
            return Vec::new();
        }

        let average_y = bridge.iter().map(|&(_, _, y)| y).sum::<f32>() / bridge.len() as f32;

        let width = (end - start) / self.config.segments as f32;
        let last = self.config.segments - 1;
        let mut road: Vec<(NodeId, f32)> = Vec::new();

        for segment in 0..self.config.segments {
            let lo = start + segment as f32 * width;
            let hi = if segment == last { end } else { lo + width };
            let in_segment = bridge
                .iter()
                .filter(|&&(_, x, _)| x >= lo && (x < hi || (segment == last && x <= hi)));

            let topmost = |above_only: bool| {
                in_segment
                    .clone()
                    .filter(|&&(_, _, y)| !above_only || y < average_y)
                    .min_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)))
                    .copied()
            };

            match topmost(true).or_else(|| topmost(false)) {
                Some((id, x, _)) if graph.degree(id) > 0 => road.push((id, x)),
                _ => {}
            }
        }

        road.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        road.dedup_by_key(|entry| entry.0);
        debug!("road extracted: {} nodes", road.len());
        road.into_iter().map(|(id, _)| id).collect()
    }
}
