//! Rasterized relative permittivity.
//!
//! Dielectric regions are painted onto the `(Nx-1) × (Ny-1)` cell grid.
//! Region edges then fall exactly on `E_z` nodes, where the permittivity is
//! ambiguous. [`AveragingMode`] picks how each interior node resolves it.

use crate::arrays::{Dimensions, Field2D};
use crate::geometry::{DielectricRegion, GridShape};
use log::debug;
use serde::{Deserialize, Serialize};

/// How interior `E_z` nodes sample the cell permittivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragingMode {
    /// Mean of the four cells sharing the node.
    #[default]
    Averaged,
    /// Cell to the lower left of the node, i.e. every region shifted by
    /// half a cell towards the origin.
    Shifted,
}

/// Permittivity on the cell grid and at the interior `E_z` nodes.
///
/// Built once before stepping and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PermittivityMap {
    cells: Field2D,
    nodes: Field2D,
    mode: AveragingMode,
}

impl PermittivityMap {
    /// Rasterize `regions` in order onto the grid of `shape`.
    ///
    /// Starts from vacuum; each region overwrites its truncated cell
    /// footprint, so with overlapping regions the last one wins.
    pub fn build(regions: &[DielectricRegion], shape: &GridShape, mode: AveragingMode) -> Self {
        let mut cells = Field2D::filled(shape.cell_dims(), 1.0);
        for region in regions {
            let (i0, i1, j0, j1) = region.cell_footprint(shape);
            debug!(
                "rasterizing {} onto cells [{}..{}) x [{}..{})",
                region, i0, i1, j0, j1
            );
            cells.fill_block(i0, i1, j0, j1, region.eps_r);
        }

        let cell_dims = shape.cell_dims();
        let node_dims = Dimensions::new(
            cell_dims.nx.saturating_sub(1),
            cell_dims.ny.saturating_sub(1),
        );
        let mut nodes = Field2D::new(node_dims);
        for a in 0..node_dims.nx {
            for b in 0..node_dims.ny {
                let value = match mode {
                    AveragingMode::Averaged => {
                        (cells.get(a, b)
                            + cells.get(a + 1, b)
                            + cells.get(a, b + 1)
                            + cells.get(a + 1, b + 1))
                            / 4.0
                    }
                    AveragingMode::Shifted => cells.get(a, b),
                };
                nodes.set(a, b, value);
            }
        }

        Self { cells, nodes, mode }
    }

    /// Relative permittivity seen by interior `E_z` node `(i, j)`.
    ///
    /// `i` in `1..Nx-1`, `j` in `1..Ny-1`.
    #[inline]
    pub fn at_node(&self, i: usize, j: usize) -> f64 {
        self.nodes.get(i - 1, j - 1)
    }

    /// Rasterized cell values, `(Nx-1) × (Ny-1)`.
    pub fn cells(&self) -> &Field2D {
        &self.cells
    }

    /// Node-sampled values, `(Nx-2) × (Ny-2)`; entry `(a, b)` belongs to
    /// `E_z` node `(a+1, b+1)`.
    pub fn nodes(&self) -> &Field2D {
        &self.nodes
    }

    /// Sampling mode used to build the map.
    pub fn mode(&self) -> AveragingMode {
        self.mode
    }

    /// Smallest and largest cell permittivity.
    pub fn range(&self) -> (f64, f64) {
        self.cells
            .as_slice()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Discretization, SimulationDomain};

    fn shape() -> GridShape {
        Discretization::new(0.125, 0.125, 1e-11)
            .resolve(&SimulationDomain::new(1.0, 1.0, 1e-9))
            .unwrap()
    }

    #[test]
    fn test_vacuum_map() {
        let map = PermittivityMap::build(&[], &shape(), AveragingMode::Averaged);
        assert_eq!(map.cells().dimensions(), Dimensions::new(8, 8));
        assert_eq!(map.nodes().dimensions(), Dimensions::new(7, 7));
        assert!(map.nodes().as_slice().iter().all(|&v| v == 1.0));
        assert_eq!(map.range(), (1.0, 1.0));
    }

    #[test]
    fn test_half_space_averaging() {
        // Dielectric fills x >= 0.5, i.e. cells i >= 4; the interface is node i = 4
        let region = DielectricRegion::new(0.5, 0.0, 0.5, 1.0, 5.0);
        let avg = PermittivityMap::build(&[region], &shape(), AveragingMode::Averaged);
        assert_eq!(avg.at_node(3, 4), 1.0);
        assert_eq!(avg.at_node(4, 4), 3.0);
        assert_eq!(avg.at_node(5, 4), 5.0);

        let shifted = PermittivityMap::build(&[region], &shape(), AveragingMode::Shifted);
        assert_eq!(shifted.at_node(3, 4), 1.0);
        assert_eq!(shifted.at_node(4, 4), 1.0);
        assert_eq!(shifted.at_node(5, 4), 5.0);
    }

    #[test]
    fn test_block_corner_averaging() {
        let region = DielectricRegion::new(0.25, 0.25, 0.25, 0.25, 9.0);
        let map = PermittivityMap::build(&[region], &shape(), AveragingMode::Averaged);
        // cells (2..4, 2..4) hold 9; node (2,2) touches one of them
        assert_eq!(map.at_node(2, 2), 3.0);
        assert_eq!(map.at_node(3, 3), 9.0);
        assert_eq!(map.at_node(4, 3), 5.0);
        assert_eq!(map.at_node(5, 5), 1.0);
    }

    #[test]
    fn test_last_write_wins() {
        let regions = [
            DielectricRegion::new(0.0, 0.0, 0.5, 0.5, 2.0),
            DielectricRegion::new(0.25, 0.25, 0.5, 0.5, 7.0),
        ];
        let map = PermittivityMap::build(&regions, &shape(), AveragingMode::Shifted);
        assert_eq!(map.cells().get(1, 1), 2.0);
        assert_eq!(map.cells().get(3, 3), 7.0);
        assert_eq!(map.cells().get(5, 5), 7.0);
    }
}
