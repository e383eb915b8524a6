//! Shared accumulation state for one scan.

use crate::sim::cell_grid::CellGrid;
use crate::sim::elements::Tracker;
use crate::sim::histogram::CategoryHistograms;
use crate::sim::position_map::PositionMap;
use crate::sim::scan::ScanConfig;

/// Mutable accumulators written by every trajectory.
///
/// All shared scan state lives here and is passed by reference into the
/// accumulator calls, so the parallel scan can run one context per thread
/// and merge them with [`ScanContext::merge`]. Per-module occupancy is kept
/// here rather than on the modules themselves; the geometry stays borrowed
/// and immutable.
pub struct ScanContext {
    pub cell_grid: CellGrid,
    pub position_map: PositionMap,
    pub histograms: CategoryHistograms,
    /// Hit counters parallel to `tracker.layers[i].modules[j]`.
    pub occupancy: Vec<Vec<u32>>,
    /// Hit counters for the optional secondary (pixel) tracker pass.
    pub pixel_occupancy: Vec<Vec<u32>>,
}

fn occupancy_counters(tracker: &Tracker) -> Vec<Vec<u32>> {
    tracker
        .layers
        .iter()
        .map(|layer| vec![0; layer.modules.len()])
        .collect()
}

impl ScanContext {
    pub fn new(tracker: &Tracker, pixel: Option<&Tracker>, config: &ScanConfig) -> Self {
        let r_max = config.r_max(tracker);
        let z_max = config.z_max(tracker);
        Self {
            cell_grid: CellGrid::new(config.n_eta_cells, config.n_r_cells, config.eta_max, r_max),
            position_map: PositionMap::new(config.n_z_map, config.n_r_map, z_max, r_max),
            histograms: CategoryHistograms::new(config.n_eta_bins, config.eta_max),
            occupancy: occupancy_counters(tracker),
            pixel_occupancy: pixel.map(occupancy_counters).unwrap_or_default(),
        }
    }

    /// Merges the accumulators of another context (reduction step of the
    /// parallel scan).
    pub fn merge(&mut self, other: &Self) {
        self.cell_grid.merge(&other.cell_grid);
        self.position_map.merge(&other.position_map);
        self.histograms.merge(&other.histograms);
        for (mine, theirs) in self.occupancy.iter_mut().zip(&other.occupancy) {
            for (m, t) in mine.iter_mut().zip(theirs) {
                *m += t;
            }
        }
        for (mine, theirs) in self.pixel_occupancy.iter_mut().zip(&other.pixel_occupancy) {
            for (m, t) in mine.iter_mut().zip(theirs) {
                *m += t;
            }
        }
    }
}
