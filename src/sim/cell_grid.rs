//! (eta, r)-binned material accumulation and its (z, r) remap.
//!
//! The cell grid integrates material contributions independently of the
//! per-trajectory totals. After the scan it can be cumulatively summed
//! outward in radius (shadow integration) and is remapped to a (z, r)
//! grid for contour display.

use crate::geom::vector::theta_to_eta;
use crate::sim::materials::Material;

/// One accumulation cell of the (eta, r) grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cell {
    pub rlength: f64,
    pub ilength: f64,
}

/// A (z, r)-indexed value grid produced by the remap.
#[derive(Debug, Clone)]
pub struct ZrGrid {
    pub n_z: usize,
    pub n_r: usize,
    pub z_max: f64,
    pub r_max: f64,
    values: Vec<f64>,
}

impl ZrGrid {
    pub fn new(n_z: usize, n_r: usize, z_max: f64, r_max: f64) -> Self {
        Self {
            n_z,
            n_r,
            z_max,
            r_max,
            values: vec![0.0; n_z * n_r],
        }
    }

    pub fn at(&self, iz: usize, ir: usize) -> f64 {
        self.values[iz * self.n_r + ir]
    }

    pub fn set(&mut self, iz: usize, ir: usize, value: f64) {
        self.values[iz * self.n_r + ir] = value;
    }

    /// Center of the given z bin.
    pub fn z_center(&self, iz: usize) -> f64 {
        (iz as f64 + 0.5) * self.z_max / self.n_z as f64
    }

    /// Center of the given r bin.
    pub fn r_center(&self, ir: usize) -> f64 {
        (ir as f64 + 0.5) * self.r_max / self.n_r as f64
    }
}

/// The (eta, r) accumulation grid.
///
/// Bin boundaries are explicit and partition the domain without gaps or
/// overlaps; the column (radius) boundaries are shared by every eta row.
#[derive(Debug, Clone)]
pub struct CellGrid {
    eta_edges: Vec<f64>,
    r_edges: Vec<f64>,
    /// Row-major: cells[row * n_r + col], row indexed by eta.
    cells: Vec<Cell>,
}

impl CellGrid {
    pub fn new(n_eta: usize, n_r: usize, eta_max: f64, r_max: f64) -> Self {
        let eta_edges = (0..=n_eta)
            .map(|i| i as f64 * eta_max / n_eta as f64)
            .collect();
        let r_edges = (0..=n_r).map(|i| i as f64 * r_max / n_r as f64).collect();
        Self {
            eta_edges,
            r_edges,
            cells: vec![Cell::default(); n_eta * n_r],
        }
    }

    pub fn n_eta(&self) -> usize {
        self.eta_edges.len() - 1
    }

    pub fn n_r(&self) -> usize {
        self.r_edges.len() - 1
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row * self.n_r() + col]
    }

    /// Adds a material contribution at the given (eta, r) position.
    /// Positions outside the grid are dropped.
    pub fn fill(&mut self, eta: f64, r: f64, material: Material) {
        let (Some(row), Some(col)) = (
            lookup_bin(&self.eta_edges, eta),
            lookup_bin(&self.r_edges, r),
        ) else {
            return;
        };
        let n_r = self.n_r();
        let cell = &mut self.cells[row * n_r + col];
        cell.rlength += material.radiation;
        cell.ilength += material.interaction;
    }

    /// Cumulative-sum pass along the radius axis within each eta row.
    ///
    /// After this pass each cell holds all material at or below its radius,
    /// so isolines drawn from the remapped grid show the material shadow
    /// seen from the interaction point.
    pub fn integrate_radially(&mut self) {
        let n_r = self.n_r();
        for row in 0..self.n_eta() {
            for col in 1..n_r {
                let prev = self.cells[row * n_r + col - 1];
                let cell = &mut self.cells[row * n_r + col];
                cell.rlength += prev.rlength;
                cell.ilength += prev.ilength;
            }
        }
    }

    /// Remaps the grid to (z, r) for contour display.
    ///
    /// For every destination bin center the implied pseudorapidity is
    /// `eta = -ln(tan(atan(r/z)/2))`; the source cell is found by a scan
    /// over the row boundaries, with the radius lookup shared across rows.
    /// Destination bins falling outside every source cell stay zero.
    /// Returns the radiation and interaction grids.
    pub fn remap(&self, n_z: usize, n_r: usize, z_max: f64, r_max: f64) -> (ZrGrid, ZrGrid) {
        let mut rad = ZrGrid::new(n_z, n_r, z_max, r_max);
        let mut int = ZrGrid::new(n_z, n_r, z_max, r_max);

        for ir in 0..n_r {
            let r = rad.r_center(ir);
            // Column boundaries are uniform, so this lookup holds for the
            // whole destination column.
            let Some(col) = lookup_bin(&self.r_edges, r) else {
                continue;
            };
            for iz in 0..n_z {
                let z = rad.z_center(iz);
                let eta = theta_to_eta(r.atan2(z));
                let Some(row) = lookup_bin(&self.eta_edges, eta) else {
                    continue;
                };
                let cell = self.cell(row, col);
                rad.set(iz, ir, cell.rlength);
                int.set(iz, ir, cell.ilength);
            }
        }
        (rad, int)
    }

    /// Merges another grid into this one (reduction step).
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.cells.len(), other.cells.len());
        for (c, o) in self.cells.iter_mut().zip(&other.cells) {
            c.rlength += o.rlength;
            c.ilength += o.ilength;
        }
    }
}

/// Finds the bin whose `[edge[i], edge[i+1])` interval contains x.
fn lookup_bin(edges: &[f64], x: f64) -> Option<usize> {
    if x < edges[0] || x >= edges[edges.len() - 1] {
        return None;
    }
    // Edges are sorted; binary scan for the containing interval.
    let idx = edges.partition_point(|e| *e <= x);
    Some(idx - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_bin() {
        let edges = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(lookup_bin(&edges, 0.0), Some(0));
        assert_eq!(lookup_bin(&edges, 0.5), Some(0));
        assert_eq!(lookup_bin(&edges, 1.0), Some(1));
        assert_eq!(lookup_bin(&edges, 2.9), Some(2));
        assert_eq!(lookup_bin(&edges, 3.0), None);
        assert_eq!(lookup_bin(&edges, -0.1), None);
    }

    #[test]
    fn test_fill_and_read() {
        let mut grid = CellGrid::new(5, 4, 2.5, 400.0);
        grid.fill(0.6, 150.0, Material::new(0.02, 0.01));
        let cell = grid.cell(1, 1);
        assert!((cell.rlength - 0.02).abs() < 1e-12);
        assert!((cell.ilength - 0.01).abs() < 1e-12);
        // Out-of-range fills are dropped silently
        grid.fill(3.0, 150.0, Material::new(1.0, 1.0));
        grid.fill(0.6, 500.0, Material::new(1.0, 1.0));
        assert!((grid.cell(1, 1).rlength - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_radially_monotonic() {
        let mut grid = CellGrid::new(2, 5, 2.0, 500.0);
        grid.fill(0.5, 50.0, Material::new(0.03, 0.01));
        grid.fill(0.5, 250.0, Material::new(0.02, 0.01));
        grid.fill(0.5, 450.0, Material::new(0.01, 0.01));
        grid.integrate_radially();
        for col in 1..grid.n_r() {
            assert!(grid.cell(0, col).rlength >= grid.cell(0, col - 1).rlength);
            assert!(grid.cell(0, col).ilength >= grid.cell(0, col - 1).ilength);
        }
        // Outermost cell holds the full column
        assert!((grid.cell(0, 4).rlength - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_remap_copies_source_cell() {
        let mut grid = CellGrid::new(10, 10, 2.5, 400.0);
        // The destination bin (z = 50, r = 100) implies eta ~ 0.48, which
        // falls in source row 1. Fill that cell and check that the value
        // shows up in the remap while every other bin stays zero.
        grid.fill(0.48, 100.0, Material::new(0.05, 0.02));
        let (rad, int) = grid.remap(10, 10, 1000.0, 400.0);
        let mut seen = 0;
        for iz in 0..10 {
            for ir in 0..10 {
                let v = rad.at(iz, ir);
                assert!(v == 0.0 || (v - 0.05).abs() < 1e-12);
                if v > 0.0 {
                    seen += 1;
                    assert!((int.at(iz, ir) - 0.02).abs() < 1e-12);
                }
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_remap_out_of_domain_left_zero() {
        let grid = CellGrid::new(4, 4, 1.0, 100.0);
        // Empty grid: every destination bin stays zero
        let (rad, _) = grid.remap(6, 6, 2000.0, 800.0);
        for iz in 0..6 {
            for ir in 0..6 {
                assert_eq!(rad.at(iz, ir), 0.0);
            }
        }
    }

    #[test]
    fn test_merge() {
        let mut a = CellGrid::new(2, 2, 1.0, 100.0);
        let mut b = CellGrid::new(2, 2, 1.0, 100.0);
        a.fill(0.2, 10.0, Material::new(0.01, 0.0));
        b.fill(0.2, 10.0, Material::new(0.02, 0.0));
        a.merge(&b);
        assert!((a.cell(0, 0).rlength - 0.03).abs() < 1e-12);
    }
}
