//! # tmz-fdtd
//!
//! Two-dimensional transverse-magnetic (TMz) FDTD solver for a rectangular,
//! perfectly conducting enclosure loaded with axis-aligned dielectric blocks.
//!
//! The solver works on a staggered Yee grid:
//! - `E_z` lives on the primary nodes, `Nx × Ny`
//! - `H_x` is offset half a cell in y, `Nx × (Ny-1)`
//! - `H_y` is offset half a cell in x, `(Nx-1) × Ny`
//!
//! and advances the fields with the leapfrog scheme (H at half-integer
//! times, E at integer times). The enclosure walls are PEC: the outermost
//! ring of `E_z` nodes is never updated and stays exactly zero.
//!
//! ## Example
//!
//! ```no_run
//! use tmz_fdtd::fdtd::{Simulation, SimulationConfig, SourceProfile, Waveform};
//! use tmz_fdtd::geometry::{DielectricRegion, Discretization, SimulationDomain};
//!
//! let source = SourceProfile::new(0.4, 0.5, Waveform::gaussian_pulse(1.0, 4e-10, 1e-10));
//! let lambda_min = source.min_wavelength(4.0);
//! let config = SimulationConfig::new(
//!     SimulationDomain::new(1.0, 1.0, 2e-9),
//!     Discretization::from_wavelength(lambda_min, 25.0, 0.9),
//!     source,
//! )
//! .with_dielectric(DielectricRegion::new(0.5, 0.0, 0.5, 1.0, 4.0))
//! .with_probe_titled(0.45, 0.5, "incident side")
//! .with_probe_titled(0.55, 0.5, "transmitted side");
//!
//! let mut sim = Simulation::new(config)?;
//! let output = sim.run()?;
//! for point in &output.measurements {
//!     println!("{}: {} samples", point.title, point.e_z.len());
//! }
//! # Ok::<(), tmz_fdtd::Error>(())
//! ```

#![warn(missing_docs)]

pub mod analysis;
pub mod arrays;
pub mod constants;
pub mod fdtd;
pub mod geometry;

/// Error type for the solver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Step sizes or derived grid dimensions are unusable.
    #[error("invalid discretization: {0}")]
    InvalidDiscretization(String),

    /// A region, source or probe lies outside the enclosure.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// Two dielectric regions share a positive area.
    #[error("dielectric regions {first} and {second} overlap")]
    Overlap {
        /// Index of the earlier region
        first: usize,
        /// Index of the later region
        second: usize,
    },

    /// Unknown source-profile selector or missing profile parameter.
    #[error("unsupported source profile: {0}")]
    UnsupportedProfile(String),

    /// Dielectric region with non-physical parameters.
    #[error("invalid dielectric region: {0}")]
    InvalidRegion(String),

    /// Configuration or state error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Field values left the representable range.
    #[error("numerical error: {0}")]
    Numerical(String),
}

/// Result type alias for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
