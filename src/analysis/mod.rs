//! Post-growth analysis of the lattice.
//!
//! - [`integrity`]: anchor reachability, density score and edge breaking
//! - [`road`]: top-profile road extraction
//! - [`stats`]: summary numbers and edge strain

pub mod integrity;
pub mod road;
pub mod stats;

pub use integrity::{IntegrityChecker, IntegrityConfig, IntegrityReport};
pub use road::{RoadConfig, RoadExtractor};
pub use stats::{edge_strains, strain_bands, BridgeStats};
