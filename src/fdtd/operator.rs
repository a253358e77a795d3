//! FDTD operator: resolved grid, material map and update coefficients.
//!
//! The operator is built once per run and never changes while the fields
//! are stepped. It folds `dt`, the cell sizes, the vacuum constants and the
//! node permittivity into per-node multipliers so the update loop only does
//! multiply-adds.

use crate::arrays::Field2D;
use crate::constants::{EPS0, MU0};
use crate::fdtd::permittivity::{AveragingMode, PermittivityMap};
use crate::geometry::{
    validate_regions, DielectricRegion, Discretization, GridShape, OverlapPolicy, SimulationDomain,
};
use crate::Result;

/// H-field update coefficients. Uniform because μ_r = 1 everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HFieldCoefficients {
    /// `dt / (μ0 · dx)`, applied to the x-difference of `E_z` in the `H_y` update
    pub cy: f64,
    /// `dt / (μ0 · dy)`, applied to the y-difference of `E_z` in the `H_x` update
    pub cx: f64,
}

/// Per-node E-field update coefficients.
///
/// Wall nodes hold zero; they are never updated.
#[derive(Debug, Clone, PartialEq)]
pub struct EFieldCoefficients {
    /// `dt / (ε0 · ε_r · dx)`
    pub cb_x: Field2D,
    /// `dt / (ε0 · ε_r · dy)`
    pub cb_y: Field2D,
}

/// Everything the field update needs that does not change over time.
#[derive(Debug, Clone)]
pub struct Operator {
    domain: SimulationDomain,
    shape: GridShape,
    permittivity: PermittivityMap,
    h_coeff: HFieldCoefficients,
    e_coeff: EFieldCoefficients,
}

impl Operator {
    /// Validate the geometry and precompute the coefficients.
    ///
    /// Discretization errors are reported before any array is allocated;
    /// region errors before the permittivity map is built.
    pub fn new(
        domain: SimulationDomain,
        discretization: Discretization,
        regions: &[DielectricRegion],
        averaging: AveragingMode,
        overlap: OverlapPolicy,
    ) -> Result<Self> {
        let shape = discretization.resolve(&domain)?;
        validate_regions(regions, &domain, overlap)?;

        let permittivity = PermittivityMap::build(regions, &shape, averaging);

        let dt = shape.dt;
        let h_coeff = HFieldCoefficients {
            cy: dt / (MU0 * shape.dx),
            cx: dt / (MU0 * shape.dy),
        };

        let mut cb_x = Field2D::new(shape.ez_dims());
        let mut cb_y = Field2D::new(shape.ez_dims());
        for i in 1..shape.nx - 1 {
            for j in 1..shape.ny - 1 {
                let eps = EPS0 * permittivity.at_node(i, j);
                cb_x.set(i, j, dt / (eps * shape.dx));
                cb_y.set(i, j, dt / (eps * shape.dy));
            }
        }

        Ok(Self {
            domain,
            shape,
            permittivity,
            h_coeff,
            e_coeff: EFieldCoefficients { cb_x, cb_y },
        })
    }

    /// Enclosure the operator was built for.
    pub fn domain(&self) -> &SimulationDomain {
        &self.domain
    }

    /// Resolved grid.
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Time step [s].
    pub fn timestep(&self) -> f64 {
        self.shape.dt
    }

    /// Material map.
    pub fn permittivity(&self) -> &PermittivityMap {
        &self.permittivity
    }

    /// H-field coefficients.
    pub fn h_coefficients(&self) -> &HFieldCoefficients {
        &self.h_coeff
    }

    /// E-field coefficients.
    pub fn e_coefficients(&self) -> &EFieldCoefficients {
        &self.e_coeff
    }

    /// Factor turning a line current [A] into an `E_z` increment at node
    /// `(i, j)`: `dt / (dx · dy · ε0 · ε_r(i, j))`.
    pub fn source_coefficient(&self, i: usize, j: usize) -> f64 {
        let s = &self.shape;
        s.dt / (s.dx * s.dy * EPS0 * self.permittivity.at_node(i, j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn build(regions: &[DielectricRegion]) -> Result<Operator> {
        Operator::new(
            SimulationDomain::new(1.0, 1.0, 1e-9),
            Discretization::new(0.125, 0.125, 1e-11),
            regions,
            AveragingMode::Averaged,
            OverlapPolicy::Reject,
        )
    }

    #[test]
    fn test_coefficients_vacuum() {
        let op = build(&[]).unwrap();
        let h = op.h_coefficients();
        assert!((h.cy - 1e-11 / (MU0 * 0.125)).abs() < 1e-20);
        assert_eq!(h.cx, h.cy);

        let e = op.e_coefficients();
        assert_eq!(e.cb_x.get(0, 3), 0.0);
        assert_eq!(e.cb_x.get(8, 3), 0.0);
        assert!((e.cb_x.get(3, 3) - 1e-11 / (EPS0 * 0.125)).abs() < 1e-6);
    }

    #[test]
    fn test_coefficients_scale_with_permittivity() {
        let op = build(&[DielectricRegion::new(0.0, 0.0, 1.0, 1.0, 4.0)]).unwrap();
        let vacuum = build(&[]).unwrap();
        let ratio = vacuum.e_coefficients().cb_y.get(4, 4) / op.e_coefficients().cb_y.get(4, 4);
        assert!((ratio - 4.0).abs() < 1e-12);
        let src_ratio = vacuum.source_coefficient(4, 4) / op.source_coefficient(4, 4);
        assert!((src_ratio - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_setup() {
        let overlapping = [
            DielectricRegion::new(0.0, 0.0, 0.5, 0.5, 2.0),
            DielectricRegion::new(0.25, 0.25, 0.5, 0.5, 3.0),
        ];
        assert!(matches!(build(&overlapping), Err(Error::Overlap { .. })));

        let outside = [DielectricRegion::new(0.75, 0.0, 0.5, 0.5, 2.0)];
        assert!(matches!(build(&outside), Err(Error::OutOfBounds(_))));
    }
}
