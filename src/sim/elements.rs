//! Detector element descriptions consumed by the scan.
//!
//! The geometry model owns module placement; the scan only sees the
//! flattened [`Tracker`] view defined here, borrowed for the duration of
//! one scan.

use crate::geom::vector::{Vec3, theta_to_eta};
use crate::sim::materials::Material;

/// Minimum module area below which the geometry is considered degenerate.
const AREA_EPS: f64 = 1e-9;

/// Subdetector family of an active element.
///
/// The family selects the angular scaling of traversed material: barrel
/// modules are crossed at `1/sin(theta)` times their nominal thickness,
/// endcap modules at `1/cos(theta)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subdetector {
    Barrel,
    Endcap,
}

impl Subdetector {
    /// Path-length scale factor for a trajectory with the given polar angle.
    pub fn path_scale(&self, theta: f64) -> f64 {
        match self {
            Subdetector::Barrel => 1.0 / theta.sin(),
            Subdetector::Endcap => 1.0 / theta.cos(),
        }
    }

    /// Surface orientation recorded on hits against this family.
    pub fn hit_orientation(&self) -> Orientation {
        match self {
            Subdetector::Barrel => Orientation::Horizontal,
            Subdetector::Endcap => Orientation::Vertical,
        }
    }
}

/// Orientation of a surface or volume with respect to the beam axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Parallel to the beam axis (tubes, barrel modules).
    Horizontal,
    /// Perpendicular to the beam axis (rings, endcap modules).
    Vertical,
}

/// Category of an inactive volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    Cabling,
    Cooling,
    Support,
    /// User-defined support: traversed path is clamped against the volume
    /// width instead of growing without bound near grazing angles.
    UserSupport,
    Unknown,
}

/// A sensor module: a planar quadrilateral with per-face material.
#[derive(Debug, Clone)]
pub struct Module {
    /// Corner positions in winding order.
    pub corners: [Vec3; 4],
    pub subdetector: Subdetector,
    /// Material of one module face, before angular scaling.
    pub material: Material,
    /// Largest z among the corners, cached for the forward-hemisphere cut.
    pub max_z: f64,
}

impl Module {
    pub fn new(corners: [Vec3; 4], subdetector: Subdetector, material: Material) -> Self {
        let max_z = corners.iter().map(|c| c.z).fold(f64::NEG_INFINITY, f64::max);
        Self {
            corners,
            subdetector,
            material,
            max_z,
        }
    }

    /// Builds a flat barrel module: a plate tangent to the cylinder of the
    /// given radius at azimuth `phi`, spanning `[z_min, z_max]` along the
    /// beam and `width` across.
    pub fn barrel(
        radius: f64,
        z_min: f64,
        z_max: f64,
        width: f64,
        phi: f64,
        material: Material,
    ) -> Self {
        let radial = Vec3::new(phi.cos(), phi.sin(), 0.0);
        let tangent = Vec3::new(-phi.sin(), phi.cos(), 0.0);
        let center = radial * radius;
        let half = tangent * (width / 2.0);
        let corners = [
            center + half * -1.0 + Vec3::new(0.0, 0.0, z_min),
            center + half + Vec3::new(0.0, 0.0, z_min),
            center + half + Vec3::new(0.0, 0.0, z_max),
            center + half * -1.0 + Vec3::new(0.0, 0.0, z_max),
        ];
        Self::new(corners, Subdetector::Barrel, material)
    }

    /// Builds a flat endcap module: a rectangular plate in the plane at
    /// the given z, spanning radii `[r_min, r_max]` around azimuth `phi`
    /// with constant `width` across.
    pub fn endcap(
        z: f64,
        r_min: f64,
        r_max: f64,
        width: f64,
        phi: f64,
        material: Material,
    ) -> Self {
        let radial = Vec3::new(phi.cos(), phi.sin(), 0.0);
        let tangent = Vec3::new(-phi.sin(), phi.cos(), 0.0);
        let half = tangent * (width / 2.0);
        let zvec = Vec3::new(0.0, 0.0, z);
        let corners = [
            radial * r_min + half * -1.0 + zvec,
            radial * r_min + half + zvec,
            radial * r_max + half + zvec,
            radial * r_max + half * -1.0 + zvec,
        ];
        Self::new(corners, Subdetector::Endcap, material)
    }

    /// Returns true if the module has (near) zero area.
    ///
    /// Degenerate modules are treated as always-missed so that a single
    /// malformed element cannot abort a long scan.
    pub fn is_degenerate(&self) -> bool {
        let c = self.corners;
        let area = (c[1] - c[0]).cross(c[2] - c[0]).length()
            + (c[2] - c[0]).cross(c[3] - c[0]).length();
        area / 2.0 < AREA_EPS
    }
}

/// One layer (or disk ring) of active modules.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub modules: Vec<Module>,
}

impl Layer {
    pub fn new(name: &str, modules: Vec<Module>) -> Self {
        Self {
            name: name.to_string(),
            modules,
        }
    }
}

/// An inactive volume: a tube (horizontal) or ring (vertical) of cables,
/// cooling or support material.
#[derive(Debug, Clone)]
pub struct InactiveElement {
    /// Inner radius of the tube/ring.
    pub inner_radius: f64,
    /// Radial width.
    pub r_width: f64,
    /// z position where the volume begins.
    pub z_offset: f64,
    /// Extent along the beam axis.
    pub z_length: f64,
    pub orientation: Orientation,
    pub category: ServiceCategory,
    /// Whether the volume lies inside the tracking volume and therefore
    /// contributes to the running total and the cell grid.
    pub in_tracking_volume: bool,
    /// Material of the full nominal traversal, before angular scaling.
    pub material: Material,
    /// Smallest pseudorapidity covered, cached at construction.
    pub eta_min: f64,
    /// Largest pseudorapidity covered, cached at construction.
    pub eta_max: f64,
}

impl InactiveElement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inner_radius: f64,
        r_width: f64,
        z_offset: f64,
        z_length: f64,
        orientation: Orientation,
        category: ServiceCategory,
        in_tracking_volume: bool,
        material: Material,
    ) -> Self {
        // Eta coverage window from the four (r, z) corners of the volume
        // cross-section. This is the cheap O(1) reject evaluated before any
        // exact intersection math.
        let r_out = inner_radius + r_width;
        let z_far = z_offset + z_length;
        let corner_eta = |r: f64, z: f64| theta_to_eta(r.atan2(z));
        let etas = [
            corner_eta(inner_radius, z_offset),
            corner_eta(inner_radius, z_far),
            corner_eta(r_out, z_offset),
            corner_eta(r_out, z_far),
        ];
        let eta_min = etas.iter().copied().fold(f64::INFINITY, f64::min);
        let eta_max = etas.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            inner_radius,
            r_width,
            z_offset,
            z_length,
            orientation,
            category,
            in_tracking_volume,
            material,
            eta_min,
            eta_max,
        }
    }

    /// Returns true if the trajectory pseudorapidity falls inside the
    /// coverage window.
    pub fn covers_eta(&self, eta: f64) -> bool {
        eta >= self.eta_min && eta <= self.eta_max
    }

    /// Returns true if any part of the volume lies at z >= 0. The scan
    /// only fires trajectories into the forward hemisphere.
    pub fn reaches_forward(&self) -> bool {
        self.z_offset + self.z_length > 0.0
    }

    /// Radius at the middle of the radial width.
    pub fn mid_radius(&self) -> f64 {
        self.inner_radius + self.r_width / 2.0
    }

    /// z at the middle of the z extent.
    pub fn mid_z(&self) -> f64 {
        self.z_offset + self.z_length / 2.0
    }

    /// Returns true if the volume dimensions are degenerate.
    pub fn is_degenerate(&self) -> bool {
        self.r_width <= 0.0 || self.z_length <= 0.0
    }
}

/// Flattened tracker view handed in by the geometry model.
///
/// Active layers are visited in storage order; the order only affects hit
/// numbering before the final per-track distance sort, not the material
/// sums.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    pub layers: Vec<Layer>,
    pub barrel_services: Vec<InactiveElement>,
    pub endcap_services: Vec<InactiveElement>,
    pub supports: Vec<InactiveElement>,
    /// Maximum tracking radius in mm.
    pub max_radius: f64,
    /// Maximum tracking half-length in mm.
    pub max_length: f64,
    /// z-vertex smearing, passed through to the resolution estimator.
    pub z_error: f64,
    /// Momenta (GeV) passed through unchanged to the resolution estimator.
    pub momenta: Vec<f64>,
}

impl Tracker {
    pub fn new(max_radius: f64, max_length: f64) -> Self {
        Self {
            max_radius,
            max_length,
            ..Default::default()
        }
    }
}
