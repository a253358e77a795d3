//! Staggered TMz field state and the leapfrog update.
//!
//! One call to [`FieldState::step`] advances `H` by a full step to
//! `t = (n - ½)·dt` and then `E_z` to `t = n·dt`, in this fixed order:
//! 1. `H_y` from the x-differences of `E_z`
//! 2. `H_x` from the y-differences of `E_z`
//! 3. interior `E_z` from the curl of `H`
//! 4. soft current injection at the source node
//!
//! The outer ring of `E_z` nodes is never written, which is what keeps the
//! tangential electric field at the PEC walls at exactly zero. Within one
//! sub-step no cell depends on another, so each sweep is a plain stencil.

use crate::arrays::Field2D;
use crate::constants::{EPS0, MU0};
use crate::fdtd::operator::Operator;
use crate::geometry::GridShape;

/// Current values of `E_z`, `H_x` and `H_y`. No history is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    ez: Field2D,
    hx: Field2D,
    hy: Field2D,
    timestep: u64,
}

impl FieldState {
    /// All-zero fields sized for `shape`.
    pub fn new(shape: &GridShape) -> Self {
        Self {
            ez: Field2D::new(shape.ez_dims()),
            hx: Field2D::new(shape.hx_dims()),
            hy: Field2D::new(shape.hy_dims()),
            timestep: 0,
        }
    }

    /// `E_z` at `t = n·dt`, shape `Nx × Ny`.
    pub fn ez(&self) -> &Field2D {
        &self.ez
    }

    /// `H_x` at `t = (n - ½)·dt`, shape `Nx × (Ny-1)`.
    ///
    /// Probe series label this value `(n + ½)·dt`; see
    /// [`MeasurementPoint`](crate::fdtd::MeasurementPoint).
    pub fn hx(&self) -> &Field2D {
        &self.hx
    }

    /// `H_y` at `t = (n - ½)·dt`, shape `(Nx-1) × Ny`.
    pub fn hy(&self) -> &Field2D {
        &self.hy
    }

    /// Index `n` of the last completed step (0 before stepping).
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    /// Zero all fields and rewind to step 0.
    pub fn reset(&mut self) {
        self.ez.clear();
        self.hx.clear();
        self.hy.clear();
        self.timestep = 0;
    }

    /// Advance one full leapfrog step, injecting `current` (evaluated at
    /// `(n - ½)·dt` by the caller) at `source`.
    pub fn step(&mut self, op: &Operator, source: (usize, usize), current: f64) {
        self.update_hy(op);
        self.update_hx(op);
        self.update_ez(op);
        let (i, j) = source;
        self.inject(i, j, current * op.source_coefficient(i, j));
        self.timestep += 1;
    }

    /// `H_y[i,j] += dt/(μ0·dx) · (E_z[i+1,j] - E_z[i,j])`
    fn update_hy(&mut self, op: &Operator) {
        let cy = op.h_coefficients().cy;
        let nx = self.ez.dimensions().nx;
        for i in 0..nx - 1 {
            let ez_i = self.ez.column(i);
            let ez_ip1 = self.ez.column(i + 1);
            let hy_i = self.hy.column_mut(i);
            for ((h, &e1), &e0) in hy_i.iter_mut().zip(ez_ip1).zip(ez_i) {
                *h += cy * (e1 - e0);
            }
        }
    }

    /// `H_x[i,j] -= dt/(μ0·dy) · (E_z[i,j+1] - E_z[i,j])`
    fn update_hx(&mut self, op: &Operator) {
        let cx = op.h_coefficients().cx;
        let nx = self.ez.dimensions().nx;
        for i in 0..nx {
            let ez_i = self.ez.column(i);
            let hx_i = self.hx.column_mut(i);
            for (h, e) in hx_i.iter_mut().zip(ez_i.windows(2)) {
                *h -= cx * (e[1] - e[0]);
            }
        }
    }

    /// Interior nodes only:
    /// `E_z += dt/(ε·dx) · (H_y[i,j] - H_y[i-1,j]) - dt/(ε·dy) · (H_x[i,j] - H_x[i,j-1])`
    fn update_ez(&mut self, op: &Operator) {
        let coeff = op.e_coefficients();
        let dims = self.ez.dimensions();
        for i in 1..dims.nx - 1 {
            let hy_i = self.hy.column(i);
            let hy_im1 = self.hy.column(i - 1);
            let hx_i = self.hx.column(i);
            let cb_x = coeff.cb_x.column(i);
            let cb_y = coeff.cb_y.column(i);
            let ez_i = self.ez.column_mut(i);
            for j in 1..dims.ny - 1 {
                ez_i[j] += cb_x[j] * (hy_i[j] - hy_im1[j]) - cb_y[j] * (hx_i[j] - hx_i[j - 1]);
            }
        }
    }

    /// Soft source: subtract the injected increment from the existing value.
    #[inline]
    fn inject(&mut self, i: usize, j: usize, increment: f64) {
        self.ez.add(i, j, -increment);
    }

    /// Whether every wall node of `E_z` is exactly zero.
    pub fn walls_are_zero(&self) -> bool {
        let dims = self.ez.dimensions();
        let first = self.ez.column(0);
        let last = self.ez.column(dims.nx - 1);
        if first.iter().chain(last).any(|&v| v != 0.0) {
            return false;
        }
        (1..dims.nx - 1).all(|i| {
            let col = self.ez.column(i);
            col[0] == 0.0 && col[dims.ny - 1] == 0.0
        })
    }

    /// Electric and magnetic energy per unit length in z [J/m].
    ///
    /// `½ Σ ε0·ε_r·E_z²·dx·dy` over interior nodes and
    /// `½ Σ μ0·(H_x² + H_y²)·dx·dy`.
    pub fn energy(&self, op: &Operator) -> (f64, f64) {
        let shape = op.shape();
        let area = shape.dx * shape.dy;
        let eps = op.permittivity();

        let mut e_sum = 0.0;
        for i in 1..shape.nx - 1 {
            let col = self.ez.column(i);
            for j in 1..shape.ny - 1 {
                e_sum += eps.at_node(i, j) * col[j] * col[j];
            }
        }
        let h_sum = self.hx.sum_squares() + self.hy.sum_squares();

        (0.5 * EPS0 * e_sum * area, 0.5 * MU0 * h_sum * area)
    }

    /// Whether all three arrays are finite.
    pub fn is_finite(&self) -> bool {
        self.ez.is_finite() && self.hx.is_finite() && self.hy.is_finite()
    }

    #[cfg(test)]
    pub(crate) fn ez_mut(&mut self) -> &mut Field2D {
        &mut self.ez
    }
}
