//! Physical constants (SI units).

use std::f64::consts::PI;

/// Vacuum permittivity [F/m].
pub const EPS0: f64 = 8.854e-12;

/// Vacuum permeability [H/m].
pub const MU0: f64 = 4.0 * PI * 1e-7;

/// Speed of light in vacuum [m/s].
///
/// Used for wavelength estimates, the Courant limit and interference times.
/// The update equations themselves only see `EPS0` and `MU0`.
pub const C0: f64 = 299_792_458.0;
