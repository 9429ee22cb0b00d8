//! Summary statistics and per-edge strain.

use serde::Serialize;

use super::integrity::IntegrityReport;
use crate::graph::{BridgeGraph, NodeId, StrainBand};

/// Numbers shown in the stats panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Configured gap between the platforms.
    pub span: f32,
    /// Share of the node budget used, rounded, capped at 100.
    pub progress: u32,
    pub average_connections: f32,
    pub most_connected: Option<NodeId>,
    pub most_connected_degree: usize,
    pub growth_steps: u32,
    pub integrity: IntegrityReport,
}

impl BridgeStats {
    pub fn collect(
        graph: &BridgeGraph,
        span: f32,
        node_budget: u32,
        growth_steps: u32,
        integrity: IntegrityReport,
    ) -> Self {
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();

        let progress = if node_budget == 0 {
            100
        } else {
            ((node_count as f32 / node_budget as f32) * 100.0).round().min(100.0) as u32
        };

        let average_connections = if node_count == 0 {
            0.0
        } else {
            (edge_count * 2) as f32 / node_count as f32
        };

        // Lowest id wins ties.
        let (most_connected, most_connected_degree) = graph
            .node_ids()
            .map(|id| (id, graph.degree(id)))
            .fold((None, 0), |best, (id, degree)| {
                if best.0.is_none() || degree > best.1 {
                    (Some(id), degree)
                } else {
                    best
                }
            });

        Self {
            node_count,
            edge_count,
            span,
            progress,
            average_connections,
            most_connected,
            most_connected_degree,
            growth_steps,
            integrity,
        }
    }
}

/// Strain of every edge, in `BridgeGraph::edges` order.
pub fn edge_strains(graph: &BridgeGraph) -> Vec<f32> {
    graph
        .edges()
        .iter()
        .map(|edge| edge.strain(graph.edge_length(edge)))
        .collect()
}

/// Strain band of every edge, in `BridgeGraph::edges` order.
pub fn strain_bands(graph: &BridgeGraph) -> Vec<StrainBand> {
    edge_strains(graph)
        .into_iter()
        .map(StrainBand::classify)
        .collect()
}
