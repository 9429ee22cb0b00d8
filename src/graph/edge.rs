//! Edge type and related structures.
//!
//! Edges are derived data: the connectivity builder throws the whole set
//! away and recomputes it from node positions. Each edge has:
//! - The two endpoint node IDs (unordered)
//! - A rest length captured when the edge was created

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Strain above which an edge counts as under tension.
pub const TENSION_STRAIN: f32 = 0.15;

/// Strain below which an edge counts as compressed.
pub const COMPRESSION_STRAIN: f32 = -0.05;

/// An undirected spring between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    /// Natural length of the spring, fixed at creation time.
    pub rest_length: f32,
}

impl Edge {
    /// Create an edge, storing the endpoints in canonical (min, max) order.
    pub fn new(a: NodeId, b: NodeId, rest_length: f32) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { a, b, rest_length }
    }

    /// Canonical unordered pair key.
    #[inline]
    pub fn key(&self) -> (NodeId, NodeId) {
        (self.a, self.b)
    }

    /// Relative elongation for a given current length.
    ///
    /// Zero-length rest edges (coincident endpoints at creation) report no strain.
    pub fn strain(&self, current_length: f32) -> f32 {
        if self.rest_length > 0.0 {
            (current_length - self.rest_length) / self.rest_length
        } else {
            0.0
        }
    }

    /// True when `current_length` exceeds the rest length times `threshold`.
    #[inline]
    pub fn is_overstretched(&self, current_length: f32, threshold: f32) -> bool {
        current_length > self.rest_length * threshold
    }
}

/// Coarse stress classification used for stress colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StrainBand {
    Tension,
    Compression,
    Neutral,
}

impl StrainBand {
    /// Classify a strain value.
    pub fn classify(strain: f32) -> Self {
        if strain > TENSION_STRAIN {
            StrainBand::Tension
        } else if strain < COMPRESSION_STRAIN {
            StrainBand::Compression
        } else {
            StrainBand::Neutral
        }
    }
}

/// How distance between two nodes is measured for connectivity and edge lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceMetric {
    /// 2-D Euclidean distance; depth is ignored.
    #[default]
    Planar,
    /// `sqrt(dx² + dy² + 0.5·dz²)`, as used by the particle background.
    DepthWeighted,
}

impl DistanceMetric {
    /// Distance between two points given as (x, y, z).
    #[inline]
    pub fn distance(self, a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        match self {
            DistanceMetric::Planar => (dx * dx + dy * dy).sqrt(),
            DistanceMetric::DepthWeighted => {
                let dz = b.2 - a.2;
                (dx * dx + dy * dy + dz * dz * 0.5).sqrt()
            }
        }
    }
}
