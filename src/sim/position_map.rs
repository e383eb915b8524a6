//! (z, r)-binned raw material sums and hit counts.
//!
//! The position map is a coarser companion to the cell grid: it records
//! where material was actually crossed and how often, and produces a
//! hit-count-normalized calibration map for the reporting layer.

use crate::sim::materials::Material;

/// Parallel (z, r) grids of raw material sums, fill counts and calibrated
/// averages. Radiation and interaction keep independent count arrays
/// because a fill only counts toward the component that contributed.
#[derive(Debug, Clone)]
pub struct PositionMap {
    n_z: usize,
    n_r: usize,
    z_max: f64,
    r_max: f64,
    rad_sum: Vec<f64>,
    rad_count: Vec<u32>,
    int_sum: Vec<f64>,
    int_count: Vec<u32>,
    rad_calibrated: Vec<f64>,
    int_calibrated: Vec<f64>,
}

impl PositionMap {
    pub fn new(n_z: usize, n_r: usize, z_max: f64, r_max: f64) -> Self {
        let n = n_z * n_r;
        Self {
            n_z,
            n_r,
            z_max,
            r_max,
            rad_sum: vec![0.0; n],
            rad_count: vec![0; n],
            int_sum: vec![0.0; n],
            int_count: vec![0; n],
            rad_calibrated: vec![0.0; n],
            int_calibrated: vec![0.0; n],
        }
    }

    pub fn n_z(&self) -> usize {
        self.n_z
    }

    pub fn n_r(&self) -> usize {
        self.n_r
    }

    /// Adds a raw material entry at position (r, z).
    ///
    /// Components that carried nothing do not bump their count, so the
    /// radiation and interaction count arrays can differ.
    pub fn fill_rz(&mut self, r: f64, z: f64, material: Material) {
        let Some(bin) = self.bin_of(z, r) else {
            return;
        };
        if material.radiation != 0.0 {
            self.rad_sum[bin] += material.radiation;
            self.rad_count[bin] += 1;
        }
        if material.interaction != 0.0 {
            self.int_sum[bin] += material.interaction;
            self.int_count[bin] += 1;
        }
    }

    /// Adds a raw material entry at transverse radius r along a trajectory
    /// with polar angle theta; z is derived as `r / tan(theta)`.
    pub fn fill_rt(&mut self, r: f64, theta: f64, material: Material) {
        self.fill_rz(r, r / theta.tan(), material);
    }

    /// Produces the calibrated per-bin averages.
    ///
    /// A count of 1 copies the raw sum (no division); a larger count
    /// divides; an empty bin keeps its prior value. Calling this twice
    /// without new fills changes nothing.
    pub fn normalize(&mut self) {
        for bin in 0..self.rad_sum.len() {
            match self.rad_count[bin] {
                0 => {}
                1 => self.rad_calibrated[bin] = self.rad_sum[bin],
                n => self.rad_calibrated[bin] = self.rad_sum[bin] / n as f64,
            }
            match self.int_count[bin] {
                0 => {}
                1 => self.int_calibrated[bin] = self.int_sum[bin],
                n => self.int_calibrated[bin] = self.int_sum[bin] / n as f64,
            }
        }
    }

    /// Calibrated radiation average at (iz, ir).
    pub fn radiation(&self, iz: usize, ir: usize) -> f64 {
        self.rad_calibrated[iz * self.n_r + ir]
    }

    /// Calibrated interaction average at (iz, ir).
    pub fn interaction(&self, iz: usize, ir: usize) -> f64 {
        self.int_calibrated[iz * self.n_r + ir]
    }

    /// Raw radiation fill count at (iz, ir).
    pub fn radiation_count(&self, iz: usize, ir: usize) -> u32 {
        self.rad_count[iz * self.n_r + ir]
    }

    /// Raw interaction fill count at (iz, ir).
    pub fn interaction_count(&self, iz: usize, ir: usize) -> u32 {
        self.int_count[iz * self.n_r + ir]
    }

    /// Merges raw sums and counts from another map (reduction step).
    /// Calibrated values are recomputed by the next `normalize` call.
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.rad_sum.len(), other.rad_sum.len());
        for bin in 0..self.rad_sum.len() {
            self.rad_sum[bin] += other.rad_sum[bin];
            self.rad_count[bin] += other.rad_count[bin];
            self.int_sum[bin] += other.int_sum[bin];
            self.int_count[bin] += other.int_count[bin];
        }
    }

    fn bin_of(&self, z: f64, r: f64) -> Option<usize> {
        if z < 0.0 || z >= self.z_max || r < 0.0 || r >= self.r_max {
            return None;
        }
        let iz = (z / self.z_max * self.n_z as f64) as usize;
        let ir = (r / self.r_max * self.n_r as f64) as usize;
        Some(iz.min(self.n_z - 1) * self.n_r + ir.min(self.n_r - 1))
    }
}
