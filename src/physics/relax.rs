//! Mass-spring relaxation.
//!
//! Cosmetic only: edges act as Hooke springs around their rest length,
//! gravity pulls free nodes down, and velocities are damped and capped. There
//! is no failure mode; the pass either settles or oscillates inside the cap.

use crate::graph::{BridgeGraph, WorldBounds};

/// Stiffness used while growth is running.
pub const GROWING_STIFFNESS: f32 = 0.02;

/// Stiffness used once growth has halted.
pub const SETTLED_STIFFNESS: f32 = 0.015;

/// Integration constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxConfig {
    /// Velocity multiplier per tick (default: 0.9).
    pub damping: f32,
    /// Speed cap (default: 3).
    pub max_velocity: f32,
    /// Added to vertical velocity every tick (default: 0.12, y points down).
    pub gravity: f32,
    /// Distance free nodes keep from the world border (default: 50).
    pub margin: f32,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            damping: 0.9,
            max_velocity: 3.0,
            gravity: 0.12,
            margin: 50.0,
        }
    }
}

impl RelaxConfig {
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f32) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }
}

/// Spring relaxation over a [`BridgeGraph`].
#[derive(Debug, Clone, Default)]
pub struct PhysicsRelaxer {
    config: RelaxConfig,
}

impl PhysicsRelaxer {
    pub fn new(config: RelaxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelaxConfig {
        &self.config
    }

    /// One full tick: spring forces, then integration and wall clamping.
    pub fn relax(&self, graph: &mut BridgeGraph, bounds: WorldBounds, stiffness: f32) {
        self.apply_edge_forces(graph, stiffness);
        self.integrate(graph, bounds);
    }

    /// Accumulate spring forces into velocities.
    ///
    /// Force magnitude is `(current - rest) * stiffness` along the planar edge
    /// direction, equal and opposite on both ends. Edges whose endpoints
    /// coincide in the plane are skipped. Immobile nodes end with zero velocity.
    pub fn apply_edge_forces(&self, graph: &mut BridgeGraph, stiffness: f32) {
        let impulses: Vec<(usize, usize, f32, f32)> = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let (ax, ay) = graph.position(edge.a)?;
                let (bx, by) = graph.position(edge.b)?;
                let dx = bx - ax;
                let dy = by - ay;
                let planar = (dx * dx + dy * dy).sqrt();
                if planar == 0.0 {
                    return None;
                }
                let force = (graph.edge_length(edge) - edge.rest_length) * stiffness;
                Some((edge.a.index(), edge.b.index(), dx / planar * force, dy / planar * force))
            })
            .collect();

        let motion = graph.motion_mut();
        for (a, b, fx, fy) in impulses {
            if !motion.states[a].is_immobile() {
                motion.vel_x[a] += fx;
                motion.vel_y[a] += fy;
            }
            if !motion.states[b].is_immobile() {
                motion.vel_x[b] -= fx;
                motion.vel_y[b] -= fy;
            }
        }

        for (i, state) in motion.states.iter().enumerate() {
            if state.is_immobile() {
                motion.vel_x[i] = 0.0;
                motion.vel_y[i] = 0.0;
            }
        }
    }

    /// Gravity, damping, speed cap, position update and wall clamping.
    pub fn integrate(&self, graph: &mut BridgeGraph, bounds: WorldBounds) {
        let RelaxConfig {
            damping,
            max_velocity,
            gravity,
            margin,
        } = self.config;
        let motion = graph.motion_mut();

        for (i, state) in motion.states.iter().enumerate() {
            if state.is_immobile() {
                continue;
            }

            let mut vx = motion.vel_x[i] * damping;
            let mut vy = (motion.vel_y[i] + gravity) * damping;

            let speed = (vx * vx + vy * vy).sqrt();
            if speed > max_velocity {
                vx = vx / speed * max_velocity;
                vy = vy / speed * max_velocity;
            }

            let mut x = motion.pos_x[i] + vx;
            let mut y = motion.pos_y[i] + vy;

            if x < margin {
                x = margin;
                vx = 0.0;
            }
            if x > bounds.width - margin {
                x = bounds.width - margin;
                vx = 0.0;
            }
            if y < margin {
                y = margin;
                vy = 0.0;
            }
            if y > bounds.height - margin {
                y = bounds.height - margin;
                vy = 0.0;
            }

            motion.pos_x[i] = x;
            motion.pos_y[i] = y;
            motion.vel_x[i] = vx;
            motion.vel_y[i] = vy;
        }
    }
}
