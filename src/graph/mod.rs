//! Graph data structures and operations.
//!
//! This module provides the bridge lattice using petgraph's StableGraph for
//! the edge topology, with Structure of Arrays (SoA) layout for positions and
//! velocities so the renderer and the physics pass can walk flat buffers.

mod connectivity;
mod edge;
mod engine;
mod node;
mod platform;

pub use connectivity::{ConnectivityBuilder, ConnectivityConfig};
pub use edge::{DistanceMetric, Edge, StrainBand, COMPRESSION_STRAIN, TENSION_STRAIN};
pub use engine::{BridgeGraph, MotionBuffers, Topology};
pub use node::{Node, NodeId, NodeState, Origin};
pub use platform::{Platform, Platforms, Side, WorldBounds, PLATFORM_HEIGHT, PLATFORM_WIDTH};
