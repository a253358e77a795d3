//! Axis-aligned dielectric blocks.

use super::{GridShape, SimulationDomain};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Rectangle of constant relative permittivity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DielectricRegion {
    /// Lower-left corner, x [m]
    pub pos_x: f64,
    /// Lower-left corner, y [m]
    pub pos_y: f64,
    /// Extent along x [m]
    pub width: f64,
    /// Extent along y [m]
    pub height: f64,
    /// Relative permittivity
    pub eps_r: f64,
}

impl DielectricRegion {
    /// Create a region with lower-left corner `(pos_x, pos_y)`.
    pub fn new(pos_x: f64, pos_y: f64, width: f64, height: f64, eps_r: f64) -> Self {
        Self {
            pos_x,
            pos_y,
            width,
            height,
            eps_r,
        }
    }

    /// Check parameters and containment in `domain`.
    pub fn validate(&self, domain: &SimulationDomain) -> Result<()> {
        let values = [self.pos_x, self.pos_y, self.width, self.height, self.eps_r];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidRegion(format!("non-finite parameter in {self}")));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::InvalidRegion(format!("empty extent in {self}")));
        }
        if self.eps_r <= 0.0 {
            return Err(Error::InvalidRegion(format!("eps_r must be positive in {self}")));
        }
        if !domain.contains(self.pos_x, self.pos_y)
            || !domain.contains(self.pos_x + self.width, self.pos_y + self.height)
        {
            return Err(Error::OutOfBounds(format!(
                "{self} exceeds the {} x {} m enclosure",
                domain.x_length, domain.y_length
            )));
        }
        Ok(())
    }

    /// Whether the two rectangles share a positive area. Touching edges do
    /// not count.
    pub fn overlaps(&self, other: &DielectricRegion) -> bool {
        let x_overlap = (self.pos_x + self.width).min(other.pos_x + other.width)
            - self.pos_x.max(other.pos_x);
        let y_overlap = (self.pos_y + self.height).min(other.pos_y + other.height)
            - self.pos_y.max(other.pos_y);
        x_overlap > 0.0 && y_overlap > 0.0
    }

    /// Cell block `(i0..i1, j0..j1)` covered on `shape`.
    ///
    /// Corner and extent are truncated separately, so a region of width
    /// `w` always covers `floor(w / dx)` cells starting at `floor(x / dx)`.
    pub fn cell_footprint(&self, shape: &GridShape) -> (usize, usize, usize, usize) {
        let i0 = (self.pos_x / shape.dx).floor() as usize;
        let j0 = (self.pos_y / shape.dy).floor() as usize;
        let w = (self.width / shape.dx).floor() as usize;
        let h = (self.height / shape.dy).floor() as usize;
        (i0, i0 + w, j0, j0 + h)
    }
}

impl std::fmt::Display for DielectricRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "region(x: {}, y: {}, w: {}, h: {}, eps_r: {})",
            self.pos_x, self.pos_y, self.width, self.height, self.eps_r
        )
    }
}

/// What to do when two dielectric regions overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Fail with [`Error::Overlap`].
    #[default]
    Reject,
    /// Rasterize in order; later regions overwrite earlier ones.
    LastWriteWins,
}

/// Validate every region and check pairwise overlap under `policy`.
pub fn validate_regions(
    regions: &[DielectricRegion],
    domain: &SimulationDomain,
    policy: OverlapPolicy,
) -> Result<()> {
    for region in regions {
        region.validate(domain)?;
    }
    if policy == OverlapPolicy::Reject {
        for (first, a) in regions.iter().enumerate() {
            for (offset, b) in regions[first + 1..].iter().enumerate() {
                if a.overlaps(b) {
                    return Err(Error::Overlap {
                        first,
                        second: first + 1 + offset,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Discretization;

    fn domain() -> SimulationDomain {
        SimulationDomain::new(1.0, 1.0, 1e-9)
    }

    #[test]
    fn test_validate_bounds() {
        assert!(DielectricRegion::new(0.0, 0.0, 1.0, 1.0, 4.0).validate(&domain()).is_ok());
        assert!(matches!(
            DielectricRegion::new(0.5, 0.5, 0.6, 0.1, 4.0).validate(&domain()),
            Err(Error::OutOfBounds(_))
        ));
        assert!(matches!(
            DielectricRegion::new(-0.1, 0.5, 0.2, 0.1, 4.0).validate(&domain()),
            Err(Error::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_validate_parameters() {
        assert!(matches!(
            DielectricRegion::new(0.1, 0.1, 0.0, 0.1, 4.0).validate(&domain()),
            Err(Error::InvalidRegion(_))
        ));
        assert!(matches!(
            DielectricRegion::new(0.1, 0.1, 0.1, 0.1, -1.0).validate(&domain()),
            Err(Error::InvalidRegion(_))
        ));
        assert!(matches!(
            DielectricRegion::new(0.1, f64::INFINITY, 0.1, 0.1, 2.0).validate(&domain()),
            Err(Error::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_overlap_detection() {
        let a = DielectricRegion::new(0.0, 0.0, 0.5, 0.5, 2.0);
        let b = DielectricRegion::new(0.25, 0.25, 0.5, 0.5, 3.0);
        let touching = DielectricRegion::new(0.5, 0.0, 0.5, 0.5, 3.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&touching));
    }

    #[test]
    fn test_validate_regions_policy() {
        let regions = [
            DielectricRegion::new(0.0, 0.0, 0.5, 0.5, 2.0),
            DielectricRegion::new(0.5, 0.5, 0.5, 0.5, 2.0),
            DielectricRegion::new(0.25, 0.25, 0.5, 0.5, 3.0),
        ];
        match validate_regions(&regions, &domain(), OverlapPolicy::Reject) {
            Err(Error::Overlap { first, second }) => {
                assert_eq!((first, second), (0, 2));
            }
            other => panic!("expected overlap error, got {other:?}"),
        }
        assert!(validate_regions(&regions, &domain(), OverlapPolicy::LastWriteWins).is_ok());
    }

    #[test]
    fn test_cell_footprint_truncates() {
        let shape = Discretization::new(0.125, 0.125, 1e-11).resolve(&domain()).unwrap();
        let region = DielectricRegion::new(0.3, 0.0, 0.3, 1.0, 2.0);
        // 0.3 / 0.125 = 2.4 -> 2, width 2.4 -> 2 cells
        assert_eq!(region.cell_footprint(&shape), (2, 4, 0, 8));
    }
}
