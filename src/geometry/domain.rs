//! Enclosure size, step sizes and the grid they produce.

use crate::arrays::Dimensions;
use crate::constants::C0;
use crate::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// Rectangular PEC enclosure `[0, x_length] × [0, y_length]` simulated over
/// `[0, t_length)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationDomain {
    /// Width of the enclosure [m]
    pub x_length: f64,
    /// Height of the enclosure [m]
    pub y_length: f64,
    /// Simulated duration [s]
    pub t_length: f64,
}

impl SimulationDomain {
    /// Create a domain. Values are checked when a grid is resolved.
    pub fn new(x_length: f64, y_length: f64, t_length: f64) -> Self {
        Self {
            x_length,
            y_length,
            t_length,
        }
    }

    /// Whether `(x, y)` lies inside the closed enclosure, allowing a
    /// relative slack of `1e-9` on the far walls.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let slack_x = 1e-9 * self.x_length;
        let slack_y = 1e-9 * self.y_length;
        x >= 0.0 && y >= 0.0 && x <= self.x_length + slack_x && y <= self.y_length + slack_y
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("x_length", self.x_length),
            ("y_length", self.y_length),
            ("t_length", self.t_length),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidDiscretization(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Spatial and temporal step sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discretization {
    /// Cell size along x [m]
    pub dx: f64,
    /// Cell size along y [m]
    pub dy: f64,
    /// Time step [s]
    pub dt: f64,
}

impl Discretization {
    /// Create a discretization from explicit step sizes.
    pub fn new(dx: f64, dy: f64, dt: f64) -> Self {
        Self { dx, dy, dt }
    }

    /// Largest stable time step for cells of size `dx × dy` in vacuum.
    ///
    /// `dt_max = 1 / (c · sqrt(1/dx² + 1/dy²))`
    pub fn courant_limit(dx: f64, dy: f64) -> f64 {
        1.0 / (C0 * (1.0 / (dx * dx) + 1.0 / (dy * dy)).sqrt())
    }

    /// Square cells sized from the shortest wavelength the source radiates.
    ///
    /// `dx = dy = lambda_min / cells_per_wavelength` and
    /// `dt = courant_fraction · dt_max`.
    pub fn from_wavelength(lambda_min: f64, cells_per_wavelength: f64, courant_fraction: f64) -> Self {
        if !(20.0..=30.0).contains(&cells_per_wavelength) {
            warn!(
                "{} cells per wavelength is outside the usual 20..30 range",
                cells_per_wavelength
            );
        }
        let delta = lambda_min / cells_per_wavelength;
        Self {
            dx: delta,
            dy: delta,
            dt: courant_fraction * Self::courant_limit(delta, delta),
        }
    }

    /// `dt` relative to the Courant limit. Values above 1 diverge.
    pub fn courant_number(&self) -> f64 {
        self.dt / Self::courant_limit(self.dx, self.dy)
    }

    /// Validate step sizes against `domain` and derive the grid.
    ///
    /// Fails with [`Error::InvalidDiscretization`] before anything is
    /// allocated when a step is non-positive or a dimension ends up below 2.
    pub fn resolve(&self, domain: &SimulationDomain) -> Result<GridShape> {
        for (name, value) in [("dx", self.dx), ("dy", self.dy), ("dt", self.dt)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidDiscretization(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        domain.validate()?;

        let nx = count(domain.x_length / self.dx, "x_length / dx")? + 1;
        let ny = count(domain.y_length / self.dy, "y_length / dy")? + 1;
        let nt = count(domain.t_length / self.dt, "t_length / dt")?;

        for (name, value) in [("Nx", nx), ("Ny", ny), ("Nt", nt)] {
            if value < 2 {
                return Err(Error::InvalidDiscretization(format!(
                    "{name} = {value}, at least 2 required"
                )));
            }
        }

        Ok(GridShape {
            nx,
            ny,
            nt,
            dx: self.dx,
            dy: self.dy,
            dt: self.dt,
        })
    }
}

fn count(ratio: f64, what: &str) -> Result<usize> {
    if !ratio.is_finite() || ratio >= usize::MAX as f64 {
        return Err(Error::InvalidDiscretization(format!(
            "{what} is not representable ({ratio})"
        )));
    }
    Ok(ratio.floor() as usize)
}

/// Resolved grid: node counts plus the step sizes that produced them.
///
/// Positions map to nodes by truncation, `i = floor(x / dx)`, everywhere in
/// the crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    /// `E_z` nodes along x
    pub nx: usize,
    /// `E_z` nodes along y
    pub ny: usize,
    /// Number of time samples
    pub nt: usize,
    /// Cell size along x [m]
    pub dx: f64,
    /// Cell size along y [m]
    pub dy: f64,
    /// Time step [s]
    pub dt: f64,
}

impl GridShape {
    /// Shape of `E_z`.
    pub fn ez_dims(&self) -> Dimensions {
        Dimensions::new(self.nx, self.ny)
    }

    /// Shape of `H_x`.
    pub fn hx_dims(&self) -> Dimensions {
        Dimensions::new(self.nx, self.ny - 1)
    }

    /// Shape of `H_y`.
    pub fn hy_dims(&self) -> Dimensions {
        Dimensions::new(self.nx - 1, self.ny)
    }

    /// Shape of the cell grid (one entry per cell between four nodes).
    pub fn cell_dims(&self) -> Dimensions {
        Dimensions::new(self.nx - 1, self.ny - 1)
    }

    /// Node containing position `(x, y)`, clamped to the grid.
    pub fn node_index(&self, x: f64, y: f64) -> (usize, usize) {
        let i = ((x / self.dx).floor().max(0.0) as usize).min(self.nx - 1);
        let j = ((y / self.dy).floor().max(0.0) as usize).min(self.ny - 1);
        (i, j)
    }

    /// Whether `(i, j)` is an interior node, i.e. not on a PEC wall.
    pub fn is_interior(&self, i: usize, j: usize) -> bool {
        i > 0 && j > 0 && i + 1 < self.nx && j + 1 < self.ny
    }

    /// Time of the `n`-th `E_z` sample.
    pub fn time_e(&self, n: usize) -> f64 {
        n as f64 * self.dt
    }

    /// Time of the `n`-th `H` sample.
    pub fn time_h(&self, n: usize) -> f64 {
        (n as f64 + 0.5) * self.dt
    }

    /// Total `E_z` nodes.
    pub fn num_nodes(&self) -> usize {
        self.nx * self.ny
    }

    /// Courant number of this grid.
    pub fn courant_number(&self) -> f64 {
        self.dt / Discretization::courant_limit(self.dx, self.dy)
    }

    /// Highest frequency the time step can represent [Hz].
    pub fn nyquist_frequency(&self) -> f64 {
        0.5 / self.dt
    }

    /// Bytes held by the three field arrays and the permittivity maps.
    pub fn memory_bytes(&self) -> usize {
        let ez = self.ez_dims().total();
        let hx = self.hx_dims().total();
        let hy = self.hy_dims().total();
        let eps = self.cell_dims().total() + ez;
        (ez + hx + hy + eps) * std::mem::size_of::<f64>()
    }

    /// Human-readable memory estimate.
    pub fn memory_display(&self) -> String {
        let bytes = self.memory_bytes() as f64;
        if bytes >= 1024.0 * 1024.0 * 1024.0 {
            format!("{:.2} GiB", bytes / (1024.0 * 1024.0 * 1024.0))
        } else if bytes >= 1024.0 * 1024.0 {
            format!("{:.2} MiB", bytes / (1024.0 * 1024.0))
        } else {
            format!("{:.2} KiB", bytes / 1024.0)
        }
    }
}
