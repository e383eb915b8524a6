//! Eta-scan driver.
//!
//! Fans N straight trajectories over a pseudorapidity range at fixed
//! azimuth, dispatches each against the active and inactive elements of
//! the tracker, and owns the lifecycle of the shared accumulators.

use log::info;
use rayon::prelude::*;

use crate::geom::vector::eta_to_theta;
use crate::sim::accumulator::{accumulate_active, accumulate_inactive};
use crate::sim::cell_grid::ZrGrid;
use crate::sim::context::ScanContext;
use crate::sim::elements::{Orientation, ServiceCategory, Tracker};
use crate::sim::histogram::CategoryHistograms;
use crate::sim::materials::{
    BEAM_PIPE_INTERACTION, BEAM_PIPE_RADIATION, BEAM_PIPE_RADIUS, Material,
};
use crate::sim::position_map::PositionMap;
use crate::sim::track::{Hit, HitKind, InactiveGroup, Track};

/// Scan parameters with defaults usable for a full-size tracker.
pub struct ScanConfig {
    /// Number of trajectories over the eta range.
    pub n_tracks: usize,
    /// Upper bound of the scanned pseudorapidity range (lower bound is 0).
    pub eta_max: f64,
    /// Fixed azimuth of every trajectory.
    pub phi: f64,
    /// Bins of the per-category eta histograms.
    pub n_eta_bins: usize,
    /// Eta rows of the cell grid.
    pub n_eta_cells: usize,
    /// Radius columns of the cell grid.
    pub n_r_cells: usize,
    /// z bins of the position map and of the remapped isoline grids.
    pub n_z_map: usize,
    /// r bins of the position map and of the remapped isoline grids.
    pub n_r_map: usize,
    /// If `true`, apply the cumulative radial pass to the cell grid so the
    /// isolines show the material shadow rather than local density.
    pub shadow_integration: bool,
    /// Restrict the inactive accumulation to one category.
    pub category_filter: Option<ServiceCategory>,
    /// Radial extent of the grids; defaults to the tracker's max radius.
    pub map_r_max: Option<f64>,
    /// z extent of the grids; defaults to the tracker's max length.
    pub map_z_max: Option<f64>,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self {
            n_tracks: 100,
            eta_max: 2.5,
            phi: std::f64::consts::FRAC_PI_2,
            n_eta_bins: 50,
            n_eta_cells: 50,
            n_r_cells: 100,
            n_z_map: 200,
            n_r_map: 100,
            shadow_integration: true,
            category_filter: None,
            map_r_max: None,
            map_z_max: None,
        }
    }

    pub fn r_max(&self, tracker: &Tracker) -> f64 {
        self.map_r_max.unwrap_or(tracker.max_radius)
    }

    pub fn z_max(&self, tracker: &Tracker) -> f64 {
        self.map_z_max.unwrap_or(tracker.max_length)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the scan hands to the reporting layer and the resolution
/// estimator.
pub struct ScanResult {
    /// One populated, distance-sorted track per trajectory.
    pub tracks: Vec<Track>,
    /// Zero-material clones of the tracks, for the ideal-detector reference.
    pub ideal_tracks: Vec<Track>,
    /// Cell grid remapped to (z, r), radiation component.
    pub radiation_isolines: ZrGrid,
    /// Cell grid remapped to (z, r), interaction component.
    pub interaction_isolines: ZrGrid,
    /// Calibrated position map with its raw hit counts.
    pub position_map: PositionMap,
    pub histograms: CategoryHistograms,
    /// Per-module hit counts, parallel to the tracker layers.
    pub occupancy: Vec<Vec<u32>>,
    /// Per-module hit counts of the pixel pass (empty without one).
    pub pixel_occupancy: Vec<Vec<u32>>,
    /// Momentum list passed through for the resolution estimator.
    pub momenta: Vec<f64>,
    /// z-vertex smearing passed through for the resolution estimator.
    pub z_error: f64,
}

/// The eta-scan driver. Borrows the tracker (and the optional secondary
/// pixel tracker) for the duration of one scan.
pub struct EtaScan<'a> {
    tracker: &'a Tracker,
    pixel: Option<&'a Tracker>,
    config: ScanConfig,
}

impl<'a> EtaScan<'a> {
    pub fn new(tracker: &'a Tracker, config: ScanConfig) -> Self {
        Self {
            tracker,
            pixel: None,
            config,
        }
    }

    /// Adds a secondary (pixel) tracker scanned in a second pass with cell
    /// grid and histogram writes suppressed.
    pub fn with_pixel(mut self, pixel: &'a Tracker) -> Self {
        self.pixel = Some(pixel);
        self
    }

    /// Runs the scan: N trajectories over eta in [0, eta_max] at fixed
    /// azimuth, then the post-loop grid passes.
    pub fn run(&self) -> ScanResult {
        let n = self.config.n_tracks.max(1);
        let eta_step = if n > 1 {
            self.config.eta_max / (n - 1) as f64
        } else {
            self.config.eta_max
        };
        info!(
            "material scan: {} trajectories, eta in [0, {}], phi = {:.3}",
            n, self.config.eta_max, self.config.phi
        );

        // One context per rayon worker chain, merged by reduction. Tracks
        // carry their step index so the output order stays the eta order.
        let new_ctx = || ScanContext::new(self.tracker, self.pixel, &self.config);
        let (mut ctx, mut indexed) = (0..n)
            .into_par_iter()
            .fold(
                || (new_ctx(), Vec::new()),
                |(mut ctx, mut tracks), i| {
                    let track = self.scan_step(i, eta_step, &mut ctx);
                    tracks.push((i, track));
                    (ctx, tracks)
                },
            )
            .reduce(
                || (new_ctx(), Vec::new()),
                |(mut ctx_a, mut tracks_a), (ctx_b, tracks_b)| {
                    ctx_a.merge(&ctx_b);
                    tracks_a.extend(tracks_b);
                    (ctx_a, tracks_a)
                },
            );
        indexed.sort_by_key(|(i, _)| *i);

        let tracks: Vec<Track> = indexed.into_iter().map(|(_, t)| t).collect();
        let ideal_tracks: Vec<Track> = tracks.iter().map(Track::material_free_clone).collect();

        if self.config.shadow_integration {
            ctx.cell_grid.integrate_radially();
        }
        let (radiation_isolines, interaction_isolines) = ctx.cell_grid.remap(
            self.config.n_z_map,
            self.config.n_r_map,
            self.config.z_max(self.tracker),
            self.config.r_max(self.tracker),
        );
        ctx.position_map.normalize();

        info!("material scan done: {} tracks populated", tracks.len());

        ScanResult {
            tracks,
            ideal_tracks,
            radiation_isolines,
            interaction_isolines,
            position_map: ctx.position_map,
            histograms: ctx.histograms,
            occupancy: ctx.occupancy,
            pixel_occupancy: ctx.pixel_occupancy,
            momenta: self.tracker.momenta.clone(),
            z_error: self.tracker.z_error,
        }
    }

    /// Processes one trajectory: active layers, inactive groups, the
    /// synthetic beam-pipe hit, the optional pixel pass, and the final
    /// distance sort.
    fn scan_step(&self, i: usize, eta_step: f64, ctx: &mut ScanContext) -> Track {
        let eta = i as f64 * eta_step;
        let theta = eta_to_theta(eta);
        let mut track = Track::new(theta, eta, self.config.phi);

        accumulate_active(self.tracker, &mut track, ctx, false);
        for (elements, group) in [
            (&self.tracker.barrel_services, InactiveGroup::BarrelServices),
            (&self.tracker.endcap_services, InactiveGroup::EndcapServices),
            (&self.tracker.supports, InactiveGroup::Supports),
        ] {
            accumulate_inactive(
                elements,
                group,
                &mut track,
                ctx,
                self.config.category_filter,
                false,
            );
        }

        // Synthetic beam-pipe crossing, present on every trajectory
        let sin_theta = theta.sin();
        let beam_pipe = Material::new(
            BEAM_PIPE_RADIATION / sin_theta,
            BEAM_PIPE_INTERACTION / sin_theta,
        );
        ctx.histograms.beam_pipe.fill(eta, beam_pipe);
        ctx.histograms.global.fill(eta, beam_pipe);
        track.add_hit(Hit {
            distance: BEAM_PIPE_RADIUS / sin_theta,
            orientation: Orientation::Horizontal,
            kind: HitKind::Inactive,
            material: beam_pipe,
            element: None,
        });

        if let Some(pixel) = self.pixel {
            accumulate_active(pixel, &mut track, ctx, true);
            for (elements, group) in [
                (&pixel.barrel_services, InactiveGroup::BarrelServices),
                (&pixel.endcap_services, InactiveGroup::EndcapServices),
                (&pixel.supports, InactiveGroup::Supports),
            ] {
                accumulate_inactive(
                    elements,
                    group,
                    &mut track,
                    ctx,
                    self.config.category_filter,
                    true,
                );
            }
        }

        if !track.hits.is_empty() {
            track.sort_by_distance();
        }
        track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::elements::{Layer, Module};
    use std::f64::consts::FRAC_PI_2;

    fn toy_tracker() -> Tracker {
        let mut tracker = Tracker::new(400.0, 1200.0);
        tracker.layers.push(Layer::new(
            "barrel_1",
            vec![Module::barrel(
                100.0,
                -600.0,
                600.0,
                40.0,
                FRAC_PI_2,
                Material::new(0.02, 0.01),
            )],
        ));
        tracker.momenta = vec![1.0, 10.0, 100.0];
        tracker
    }

    #[test]
    fn test_single_track_scan() {
        // N = 1 over an empty tracker: exactly one track carrying exactly
        // the beam-pipe hit, fired at eta = 0.
        let tracker = Tracker::new(400.0, 1200.0);
        let mut config = ScanConfig::new();
        config.n_tracks = 1;
        let result = EtaScan::new(&tracker, config).run();
        assert_eq!(result.tracks.len(), 1);
        let track = &result.tracks[0];
        assert_eq!(track.hits.len(), 1);
        assert!(track.eta.abs() < 1e-12);
        // At theta = 90 deg the beam pipe is crossed at its radius
        assert!((track.hits[0].distance - BEAM_PIPE_RADIUS).abs() < 1e-9);
        assert!((track.hits[0].material.radiation - BEAM_PIPE_RADIATION).abs() < 1e-12);
    }

    #[test]
    fn test_eta_step_covers_range() {
        let tracker = toy_tracker();
        let mut config = ScanConfig::new();
        config.n_tracks = 6;
        config.eta_max = 2.5;
        let result = EtaScan::new(&tracker, config).run();
        assert_eq!(result.tracks.len(), 6);
        assert!(result.tracks[0].eta.abs() < 1e-12);
        assert!((result.tracks[5].eta - 2.5).abs() < 1e-12);
        // Steps are uniform
        assert!((result.tracks[1].eta - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tracks_sorted_by_distance() {
        let tracker = toy_tracker();
        let mut config = ScanConfig::new();
        config.n_tracks = 10;
        config.eta_max = 1.0;
        let result = EtaScan::new(&tracker, config).run();
        for track in &result.tracks {
            for pair in track.hits.windows(2) {
                assert!(pair[0].distance <= pair[1].distance);
            }
        }
    }

    #[test]
    fn test_additivity_with_beam_pipe() {
        let tracker = toy_tracker();
        let mut config = ScanConfig::new();
        config.n_tracks = 8;
        config.eta_max = 1.5;
        let result = EtaScan::new(&tracker, config).run();
        for track in &result.tracks {
            // Every hit is non-negative and the ledger is consistent
            for hit in &track.hits {
                assert!(hit.material.radiation >= 0.0);
                assert!(hit.material.interaction >= 0.0);
            }
            assert!(track.total_material().radiation > 0.0);
        }
    }

    #[test]
    fn test_ideal_tracks_are_material_free() {
        let tracker = toy_tracker();
        let mut config = ScanConfig::new();
        config.n_tracks = 4;
        let result = EtaScan::new(&tracker, config).run();
        assert_eq!(result.ideal_tracks.len(), result.tracks.len());
        for (track, ideal) in result.tracks.iter().zip(&result.ideal_tracks) {
            assert_eq!(track.hits.len(), ideal.hits.len());
            assert!(ideal.total_material().is_zero());
        }
    }

    #[test]
    fn test_momenta_passed_through() {
        let tracker = toy_tracker();
        let result = EtaScan::new(&tracker, ScanConfig::new()).run();
        assert_eq!(result.momenta, vec![1.0, 10.0, 100.0]);
    }

    #[test]
    fn test_occupancy_counts_crossings() {
        let tracker = toy_tracker();
        let mut config = ScanConfig::new();
        config.n_tracks = 20;
        config.eta_max = 1.0;
        let result = EtaScan::new(&tracker, config).run();
        // The long barrel module at r = 100 is crossed by every trajectory
        // up to eta(z = 600, r = 100), which is beyond eta = 1.
        assert_eq!(result.occupancy[0][0], 20);
    }

    #[test]
    fn test_pixel_pass_records_separately() {
        let tracker = toy_tracker();
        let pixel = toy_tracker();
        let mut config = ScanConfig::new();
        config.n_tracks = 5;
        config.eta_max = 1.0;
        let result = EtaScan::new(&tracker, config).with_pixel(&pixel).run();
        assert_eq!(result.pixel_occupancy[0][0], 5);
        // Pixel hits land on the same tracks
        for track in &result.tracks {
            assert!(track.hits.len() >= 3); // barrel + pixel barrel + beam pipe
        }
    }

    #[test]
    fn test_shadow_integration_monotonic_rows() {
        let tracker = toy_tracker();
        let mut config = ScanConfig::new();
        config.n_tracks = 50;
        config.eta_max = 2.0;
        config.shadow_integration = true;
        let result = EtaScan::new(&tracker, config).run();
        // Remapped isoline grids are non-negative everywhere
        for iz in 0..result.radiation_isolines.n_z {
            for ir in 0..result.radiation_isolines.n_r {
                assert!(result.radiation_isolines.at(iz, ir) >= 0.0);
                assert!(result.interaction_isolines.at(iz, ir) >= 0.0);
            }
        }
    }
}
