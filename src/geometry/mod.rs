//! Simulation geometry: enclosure, discretization and dielectric blocks.

mod dielectric;
mod domain;

pub use dielectric::{validate_regions, DielectricRegion, OverlapPolicy};
pub use domain::{Discretization, GridShape, SimulationDomain};
