//! Hit ledger for one trajectory.

use crate::sim::elements::Orientation;
use crate::sim::materials::Material;

/// Whether a hit was scored on a sensor module or on an inactive volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Active,
    Inactive,
}

/// Non-owning reference to the element struck by a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    /// Module index within an active layer.
    Module { layer: usize, index: usize },
    /// Element index within an inactive group.
    Service { group: InactiveGroup, index: usize },
}

/// The inactive-element collections of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactiveGroup {
    BarrelServices,
    EndcapServices,
    Supports,
}

/// One crossing of a detector element, annotated with the corrected
/// material seen by the trajectory.
#[derive(Debug, Clone)]
pub struct Hit {
    /// Distance from the origin to the crossing point in mm.
    pub distance: f64,
    pub orientation: Orientation,
    pub kind: HitKind,
    /// Material traversed, after angular scaling.
    pub material: Material,
    pub element: Option<ElementRef>,
}

/// Ordered hit ledger of one trajectory.
///
/// Hits are appended in element-iteration order and must be sorted by
/// distance before the track is handed to the resolution estimator.
#[derive(Debug, Clone)]
pub struct Track {
    /// Polar angle of the trajectory.
    pub theta: f64,
    /// Pseudorapidity of the trajectory.
    pub eta: f64,
    /// Azimuth of the trajectory.
    pub phi: f64,
    pub hits: Vec<Hit>,
}

impl Track {
    pub fn new(theta: f64, eta: f64, phi: f64) -> Self {
        Self {
            theta,
            eta,
            phi,
            hits: Vec::new(),
        }
    }

    pub fn add_hit(&mut self, hit: Hit) {
        self.hits.push(hit);
    }

    /// Sorts the hits by distance from the origin.
    pub fn sort_by_distance(&mut self) {
        self.hits
            .sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    /// Total material attached to the hits of this track.
    pub fn total_material(&self) -> Material {
        self.hits.iter().map(|h| h.material).sum()
    }

    /// Clone of this track with all hit materials zeroed, used by the
    /// resolution estimator as the ideal (massless detector) reference.
    pub fn material_free_clone(&self) -> Self {
        let mut clone = self.clone();
        for hit in &mut clone.hits {
            hit.material = Material::ZERO;
        }
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit_at(distance: f64, radiation: f64) -> Hit {
        Hit {
            distance,
            orientation: Orientation::Horizontal,
            kind: HitKind::Active,
            material: Material::new(radiation, radiation / 2.0),
            element: None,
        }
    }

    #[test]
    fn test_sort_by_distance() {
        let mut track = Track::new(1.0, 0.5, 1.5);
        track.add_hit(hit_at(300.0, 0.01));
        track.add_hit(hit_at(100.0, 0.02));
        track.add_hit(hit_at(200.0, 0.03));
        track.sort_by_distance();
        let distances: Vec<f64> = track.hits.iter().map(|h| h.distance).collect();
        assert_eq!(distances, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_total_material() {
        let mut track = Track::new(1.0, 0.5, 1.5);
        track.add_hit(hit_at(100.0, 0.02));
        track.add_hit(hit_at(200.0, 0.03));
        let total = track.total_material();
        assert!((total.radiation - 0.05).abs() < 1e-12);
        assert!((total.interaction - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_material_free_clone() {
        let mut track = Track::new(1.0, 0.5, 1.5);
        track.add_hit(hit_at(100.0, 0.02));
        let clone = track.material_free_clone();
        assert_eq!(clone.hits.len(), 1);
        assert!((clone.hits[0].distance - 100.0).abs() < 1e-12);
        assert!(clone.total_material().is_zero());
        // The original is untouched
        assert!(!track.total_material().is_zero());
    }
}
