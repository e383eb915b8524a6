use crate::geom::EPS;
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// 3D vector in the detector frame.
///
/// The beam axis is z; the transverse plane is (x, y). Besides the usual
/// Cartesian operations, the vector exposes the collider coordinates used
/// throughout the scan: transverse radius (`perp`), azimuth (`phi`), polar
/// angle (`theta`) and pseudorapidity (`eta`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Converts pseudorapidity to polar angle: theta = 2*atan(e^-eta).
pub fn eta_to_theta(eta: f64) -> f64 {
    2.0 * (-eta).exp().atan()
}

/// Converts polar angle to pseudorapidity: eta = -ln(tan(theta/2)).
pub fn theta_to_eta(theta: f64) -> f64 {
    -(theta / 2.0).tan().ln()
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Builds a unit direction from polar angle and azimuth.
    pub fn from_polar(theta: f64, phi: f64) -> Self {
        Self {
            x: theta.sin() * phi.cos(),
            y: theta.sin() * phi.sin(),
            z: theta.cos(),
        }
    }

    /// Cross product between 2 vectors.
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Dot product between 2 vectors.
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the length of the vector.
    pub fn length(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// Transverse radius: distance from the beam axis.
    pub fn perp(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// Azimuthal angle in the transverse plane.
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Polar angle measured from the z axis.
    pub fn theta(&self) -> f64 {
        self.perp().atan2(self.z)
    }

    /// Pseudorapidity of the direction from the origin through this point.
    pub fn eta(&self) -> f64 {
        theta_to_eta(self.theta())
    }

    pub fn is_close(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPS
            && (self.y - other.y).abs() < EPS
            && (self.z - other.z).abs() < EPS
    }

    /// Normalizes the vector (divides by its length) and returns a copy.
    pub fn normalize(&self) -> Option<Self> {
        let len = self.length();
        if len < EPS {
            None
        } else {
            Some(Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            })
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Vec3({:.prec$}, {:.prec$}, {:.prec$})",
            self.x,
            self.y,
            self.z,
            prec = prec
        )
    }
}

// Implement +
impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

// Implement -
impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

// Implement *
impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
        }
    }
}
