//! Ray casting infrastructure.
//!
//! This module provides a Ray struct and the intersection tests used by the
//! material scan: an exact ray/quadrilateral test for planar detector
//! modules and closed-form cylinder/disk tests for tube- and ring-shaped
//! inactive volumes.

use log::trace;

use crate::geom::EPS;
use crate::geom::vector::Vec3;

/// Determinant threshold below which the triangle system is singular
/// (ray parallel to the module plane).
const DET_EPS: f64 = 1e-12;

/// Tolerance on the triangle coordinates, so crossings on the shared
/// diagonal of a quadrilateral are not lost to rounding.
const BARY_EPS: f64 = 1e-12;

/// A ray defined by an origin point and a direction vector.
///
/// The direction does not need to be normalized: all crossing distances
/// returned by the intersection tests are geometric distances, scaled by
/// the direction's own length.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Builds a ray from the origin of the detector frame with the given
    /// polar angle and azimuth.
    pub fn from_angles(theta: f64, phi: f64) -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::from_polar(theta, phi),
        }
    }

    /// Returns the point along the ray at parameter t.
    pub fn point_at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Calculates the crossing of this ray with a triangle (p1, p2, p3).
    ///
    /// Solves the 3x3 system `d = A * beta` where `d = origin - p1` and the
    /// columns of `A` are `(p2 - p1)`, `(p3 - p1)` and `-direction`. The
    /// first two components of the solution are the triangle coordinates
    /// (alpha, beta); the third is the ray parameter. The system is solved
    /// in closed form with Cramer's rule.
    ///
    /// Returns the crossing distance if the triangle is crossed at a
    /// positive distance, `None` otherwise. A singular system (ray parallel
    /// to the triangle plane) is a miss, not an error.
    pub fn cross_triangle(&self, p1: Vec3, p2: Vec3, p3: Vec3) -> Option<f64> {
        let a1 = p2 - p1;
        let a2 = p3 - p1;
        let a3 = self.direction * -1.0;
        let d = self.origin - p1;

        let det = a1.dot(a2.cross(a3));
        if det.abs() < DET_EPS {
            trace!("singular triangle system, ray parallel to module plane");
            return None;
        }

        let alpha = d.dot(a2.cross(a3)) / det;
        let beta = a1.dot(d.cross(a3)) / det;
        let gamma = a1.dot(a2.cross(d)) / det;

        if alpha >= -BARY_EPS && beta >= -BARY_EPS && alpha + beta <= 1.0 + BARY_EPS && gamma > EPS
        {
            // gamma is expressed in units of the direction vector
            Some(gamma * self.direction.length())
        } else {
            None
        }
    }

    /// Calculates the crossing of this ray with a planar quadrilateral
    /// given by its 4 corners in winding order.
    ///
    /// The quadrilateral is split into the triangles (0, 1, 2) and
    /// (0, 2, 3) sharing one diagonal. Returns the smallest positive
    /// crossing distance, or `None` if neither triangle is crossed.
    pub fn cross_quadrilateral(&self, corners: &[Vec3; 4]) -> Option<f64> {
        let first = self.cross_triangle(corners[0], corners[1], corners[2]);
        let second = self.cross_triangle(corners[0], corners[2], corners[3]);
        match (first, second) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Calculates the crossing of this ray with a cylinder barrel of the
    /// given radius, coaxial with z and spanning `[z_min, z_max]`.
    ///
    /// Returns the smallest positive crossing distance whose z lies within
    /// the span, or `None`.
    pub fn cross_cylinder(&self, radius: f64, z_min: f64, z_max: f64) -> Option<f64> {
        let (ox, oy) = (self.origin.x, self.origin.y);
        let (dx, dy) = (self.direction.x, self.direction.y);

        // |xy(origin) + t * xy(direction)|^2 = radius^2
        let a = dx * dx + dy * dy;
        let b = 2.0 * (ox * dx + oy * dy);
        let c = ox * ox + oy * oy - radius * radius;

        if a < EPS {
            return None; // ray parallel to the cylinder axis
        }

        let discr = b * b - 4.0 * a * c;
        if discr < 0.0 {
            return None;
        }
        let sq = discr.sqrt();

        // Smaller root first; both candidates checked against the z span.
        for t in [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)] {
            if t > EPS {
                let z = self.origin.z + t * self.direction.z;
                if z >= z_min && z <= z_max {
                    return Some(t * self.direction.length());
                }
            }
        }
        None
    }

    /// Calculates the crossing of this ray with a disk annulus at the
    /// given z, spanning radii `[r_min, r_max]`.
    pub fn cross_disk(&self, z: f64, r_min: f64, r_max: f64) -> Option<f64> {
        if self.direction.z.abs() < EPS {
            return None; // ray parallel to the disk plane
        }
        let t = (z - self.origin.z) / self.direction.z;
        if t <= EPS {
            return None;
        }
        let r = self.point_at(t).perp();
        if r >= r_min && r <= r_max {
            Some(t * self.direction.length())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    /// Square module at z = 10, spanning [0, 2] x [0, 2] in (x, y).
    fn make_xy_square() -> [Vec3; 4] {
        [
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(2.0, 0.0, 10.0),
            Vec3::new(2.0, 2.0, 10.0),
            Vec3::new(0.0, 2.0, 10.0),
        ]
    }

    #[test]
    fn test_cross_quadrilateral_hit() {
        let quad = make_xy_square();
        let ray = Ray::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        let d = ray.cross_quadrilateral(&quad);
        assert!(d.is_some());
        assert!((d.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_quadrilateral_miss() {
        let quad = make_xy_square();
        // Hits the plane but outside the corners
        let ray = Ray::new(Vec3::new(5.0, 5.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(ray.cross_quadrilateral(&quad).is_none());
        // Points away from the module
        let ray = Ray::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(ray.cross_quadrilateral(&quad).is_none());
    }

    #[test]
    fn test_cross_quadrilateral_parallel() {
        let quad = make_xy_square();
        // Ray in the module plane: singular system, treated as a miss
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 10.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.cross_quadrilateral(&quad).is_none());
    }

    #[test]
    fn test_cross_quadrilateral_non_unit_direction() {
        let quad = make_xy_square();
        // Distance must be geometric regardless of the direction length
        let ray = Ray::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 4.0));
        let d = ray.cross_quadrilateral(&quad);
        assert!((d.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_quadrilateral_both_triangles() {
        let quad = make_xy_square();
        // A point on the shared diagonal (0,0,10)-(2,2,10) is crossed by
        // both triangles; the distance must come out the same either way.
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.0, 0.0, 1.0));
        let d = ray.cross_quadrilateral(&quad);
        assert!((d.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_corner_rotation_symmetry() {
        // Rotating the corner list must not change the crossing distance
        // for a ray through the centroid along the normal.
        let quad = make_xy_square();
        let rotated = [quad[1], quad[2], quad[3], quad[0]];
        let ray = Ray::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        let d0 = ray.cross_quadrilateral(&quad).unwrap();
        let d1 = ray.cross_quadrilateral(&rotated).unwrap();
        assert!((d0 - d1).abs() < 1e-9);
    }

    #[test]
    fn test_cross_cylinder() {
        // Transverse ray from the origin crosses r = 100 at distance 100
        let ray = Ray::from_angles(FRAC_PI_2, FRAC_PI_2);
        let d = ray.cross_cylinder(100.0, -50.0, 50.0);
        assert!((d.unwrap() - 100.0).abs() < 1e-9);

        // z span excludes the crossing
        assert!(ray.cross_cylinder(100.0, 10.0, 50.0).is_none());

        // Ray along the axis never crosses the barrel
        let axial = Ray::from_angles(0.0, 0.0);
        assert!(axial.cross_cylinder(100.0, -50.0, 50.0).is_none());
    }

    #[test]
    fn test_cross_disk() {
        // 45 degree ray crosses the z = 100 plane at r = 100
        let theta = std::f64::consts::FRAC_PI_4;
        let ray = Ray::from_angles(theta, FRAC_PI_2);
        let d = ray.cross_disk(100.0, 50.0, 150.0);
        assert!(d.is_some());
        // Path length along the diagonal
        assert!((d.unwrap() - (2.0_f64).sqrt() * 100.0).abs() < 1e-9);

        // Annulus excludes the crossing radius
        assert!(ray.cross_disk(100.0, 150.0, 200.0).is_none());

        // Transverse ray never reaches the plane
        let flat = Ray::from_angles(FRAC_PI_2, FRAC_PI_2);
        assert!(flat.cross_disk(100.0, 0.0, 1000.0).is_none());
    }
}
