//! 1D material-vs-eta histograms.
//!
//! These are the simple Fill(eta, value) sinks consumed by the reporting
//! layer. Each bin keeps the accumulated value and a fill count so the
//! reported curve is the mean contribution per trajectory.

use crate::sim::materials::Material;

/// A fixed-range profile histogram: per-bin value sums and fill counts.
#[derive(Debug, Clone)]
pub struct Profile1d {
    lo: f64,
    hi: f64,
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl Profile1d {
    pub fn new(n_bins: usize, lo: f64, hi: f64) -> Self {
        Self {
            lo,
            hi,
            sums: vec![0.0; n_bins],
            counts: vec![0; n_bins],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.sums.len()
    }

    /// Adds a value at position x. Out-of-range fills are dropped.
    pub fn fill(&mut self, x: f64, value: f64) {
        if let Some(bin) = self.bin_of(x) {
            self.sums[bin] += value;
            self.counts[bin] += 1;
        }
    }

    /// Mean value in the given bin, or 0 if the bin was never filled.
    pub fn value(&self, bin: usize) -> f64 {
        if self.counts[bin] == 0 {
            0.0
        } else {
            self.sums[bin] / self.counts[bin] as f64
        }
    }

    /// Center of the given bin.
    pub fn bin_center(&self, bin: usize) -> f64 {
        let width = (self.hi - self.lo) / self.n_bins() as f64;
        self.lo + (bin as f64 + 0.5) * width
    }

    fn bin_of(&self, x: f64) -> Option<usize> {
        if x < self.lo || x >= self.hi || self.sums.is_empty() {
            return None;
        }
        let frac = (x - self.lo) / (self.hi - self.lo);
        let bin = (frac * self.n_bins() as f64) as usize;
        Some(bin.min(self.n_bins() - 1))
    }

    /// Merges another histogram into this one (reduction step).
    pub fn merge(&mut self, other: &Self) {
        for (s, o) in self.sums.iter_mut().zip(&other.sums) {
            *s += o;
        }
        for (c, o) in self.counts.iter_mut().zip(&other.counts) {
            *c += o;
        }
    }
}

/// Paired radiation/interaction profiles filled together.
#[derive(Debug, Clone)]
pub struct RadIntProfiles {
    pub radiation: Profile1d,
    pub interaction: Profile1d,
}

impl RadIntProfiles {
    pub fn new(n_bins: usize, eta_max: f64) -> Self {
        Self {
            radiation: Profile1d::new(n_bins, 0.0, eta_max),
            interaction: Profile1d::new(n_bins, 0.0, eta_max),
        }
    }

    pub fn fill(&mut self, eta: f64, material: Material) {
        self.radiation.fill(eta, material.radiation);
        self.interaction.fill(eta, material.interaction);
    }

    pub fn merge(&mut self, other: &Self) {
        self.radiation.merge(&other.radiation);
        self.interaction.merge(&other.interaction);
    }
}

/// The per-category histogram set exposed to the reporting layer.
#[derive(Debug, Clone)]
pub struct CategoryHistograms {
    pub active_barrel: RadIntProfiles,
    pub active_endcap: RadIntProfiles,
    pub services_barrel: RadIntProfiles,
    pub services_endcap: RadIntProfiles,
    pub supports: RadIntProfiles,
    pub beam_pipe: RadIntProfiles,
    /// Sum of all in-volume contributions, beam pipe included.
    pub global: RadIntProfiles,
    /// Services and supports outside the tracking volume. These never
    /// enter the global curve or the cell grid.
    pub extra: RadIntProfiles,
}

impl CategoryHistograms {
    pub fn new(n_bins: usize, eta_max: f64) -> Self {
        Self {
            active_barrel: RadIntProfiles::new(n_bins, eta_max),
            active_endcap: RadIntProfiles::new(n_bins, eta_max),
            services_barrel: RadIntProfiles::new(n_bins, eta_max),
            services_endcap: RadIntProfiles::new(n_bins, eta_max),
            supports: RadIntProfiles::new(n_bins, eta_max),
            beam_pipe: RadIntProfiles::new(n_bins, eta_max),
            global: RadIntProfiles::new(n_bins, eta_max),
            extra: RadIntProfiles::new(n_bins, eta_max),
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.active_barrel.merge(&other.active_barrel);
        self.active_endcap.merge(&other.active_endcap);
        self.services_barrel.merge(&other.services_barrel);
        self.services_endcap.merge(&other.services_endcap);
        self.supports.merge(&other.supports);
        self.beam_pipe.merge(&other.beam_pipe);
        self.global.merge(&other.global);
        self.extra.merge(&other.extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_mean() {
        let mut h = Profile1d::new(10, 0.0, 2.5);
        h.fill(0.1, 0.02);
        h.fill(0.1, 0.04);
        assert!((h.value(0) - 0.03).abs() < 1e-12);
        // Unfilled bin reads zero
        assert_eq!(h.value(5), 0.0);
    }

    #[test]
    fn test_out_of_range_fill_dropped() {
        let mut h = Profile1d::new(10, 0.0, 2.5);
        h.fill(-0.1, 1.0);
        h.fill(2.5, 1.0);
        for bin in 0..h.n_bins() {
            assert_eq!(h.value(bin), 0.0);
        }
    }

    #[test]
    fn test_upper_edge_bin() {
        let mut h = Profile1d::new(4, 0.0, 2.0);
        h.fill(1.999, 0.5);
        assert!((h.value(3) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bin_center() {
        let h = Profile1d::new(5, 0.0, 2.5);
        assert!((h.bin_center(0) - 0.25).abs() < 1e-12);
        assert!((h.bin_center(4) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_merge() {
        let mut a = Profile1d::new(4, 0.0, 2.0);
        let mut b = Profile1d::new(4, 0.0, 2.0);
        a.fill(0.25, 0.02);
        b.fill(0.25, 0.04);
        a.merge(&b);
        assert!((a.value(0) - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_rad_int_pair() {
        let mut p = RadIntProfiles::new(4, 2.0);
        p.fill(0.5, Material::new(0.02, 0.01));
        assert!((p.radiation.value(1) - 0.02).abs() < 1e-12);
        assert!((p.interaction.value(1) - 0.01).abs() < 1e-12);
    }
}
