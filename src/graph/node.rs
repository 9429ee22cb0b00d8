//! Node type and related structures.
//!
//! Nodes are the vertices of the bridge lattice. Each node has:
//! - A unique identifier, assigned sequentially and never reused
//! - Position (x, y) in world space plus a cosmetic depth offset z
//! - Velocity (vx, vy) for the spring relaxation
//! - The growth generation that created it
//! - Fixed / platform flags (anchors never move)

use std::fmt;

use serde::Serialize;

/// Node identifier.
///
/// Nodes are never removed individually, so the id doubles as the node's
/// slot in the SoA buffers and its petgraph index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot of this node in the SoA buffers.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Node state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const FIXED: u8 = 0b0000_0001;
    const PLATFORM: u8 = 0b0000_0010;

    /// Create a new default node state (free, not a platform anchor).
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// State for a platform anchor: platform nodes are always fixed.
    #[inline]
    pub fn anchor() -> Self {
        Self {
            flags: Self::FIXED | Self::PLATFORM,
        }
    }

    /// Raw flag byte, as exported to the renderer.
    #[inline]
    pub fn bits(self) -> u8 {
        self.flags
    }

    /// Check if the node is excluded from physics.
    #[inline]
    pub fn is_fixed(self) -> bool {
        self.flags & Self::FIXED != 0
    }

    /// Set the fixed state.
    #[inline]
    pub fn set_fixed(&mut self, fixed: bool) {
        if fixed {
            self.flags |= Self::FIXED;
        } else {
            self.flags &= !Self::FIXED;
        }
    }

    /// Check if the node is a platform anchor.
    #[inline]
    pub fn is_platform(self) -> bool {
        self.flags & Self::PLATFORM != 0
    }

    /// Set the platform state. Marking a node as platform also fixes it.
    #[inline]
    pub fn set_platform(&mut self, platform: bool) {
        if platform {
            self.flags |= Self::PLATFORM | Self::FIXED;
        } else {
            self.flags &= !Self::PLATFORM;
        }
    }

    /// True when the node must never move: fixed or platform.
    #[inline]
    pub fn is_immobile(self) -> bool {
        self.flags & (Self::FIXED | Self::PLATFORM) != 0
    }
}

/// Which growth front created a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    /// Seeded on, or grown from, the left platform.
    Left,
    /// Seeded on, or grown from, the right platform.
    Right,
    /// Placed through the manual-node extension point.
    Manual,
}

/// Read-only snapshot of a node, handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub generation: u32,
    pub is_fixed: bool,
    pub is_platform: bool,
    pub origin: Origin,
    pub connections: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "Node(42)");
    }

    #[test]
    fn test_node_id_conversion() {
        let id: NodeId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_node_state_default() {
        let state = NodeState::new();
        assert!(!state.is_fixed());
        assert!(!state.is_platform());
        assert!(!state.is_immobile());
    }

    #[test]
    fn test_platform_implies_fixed() {
        let mut state = NodeState::new();
        state.set_platform(true);
        assert!(state.is_platform());
        assert!(state.is_fixed());

        state.set_platform(false);
        assert!(!state.is_platform());
        assert!(state.is_fixed());

        state.set_fixed(false);
        assert!(!state.is_immobile());
    }

    #[test]
    fn test_anchor_state() {
        let state = NodeState::anchor();
        assert!(state.is_fixed());
        assert!(state.is_platform());
        assert_eq!(state.bits(), 0b11);
    }
}
