//! Spring relaxation of the grown lattice.

mod relax;

pub use relax::{PhysicsRelaxer, RelaxConfig, GROWING_STIFFNESS, SETTLED_STIFFNESS};
