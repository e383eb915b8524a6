use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Radiation length of the beam pipe wall, before angular scaling.
pub const BEAM_PIPE_RADIATION: f64 = 0.0023;

/// Interaction length of the beam pipe wall, before angular scaling.
pub const BEAM_PIPE_INTERACTION: f64 = 0.0019;

/// Transverse distance from the origin to the beam pipe wall in mm.
pub const BEAM_PIPE_RADIUS: f64 = 23.0;

/// Traversed material expressed in radiation and interaction lengths.
///
/// Both quantities are additive along a trajectory, so totals are built by
/// summing per-element contributions. Physical elements carry non-negative
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    /// Fraction of a radiation length.
    pub radiation: f64,
    /// Fraction of an interaction length.
    pub interaction: f64,
}

impl Material {
    pub const ZERO: Self = Self {
        radiation: 0.0,
        interaction: 0.0,
    };

    pub fn new(radiation: f64, interaction: f64) -> Self {
        Self {
            radiation,
            interaction,
        }
    }

    /// Returns a copy scaled by the given path-length factor.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            radiation: self.radiation * factor,
            interaction: self.interaction * factor,
        }
    }

    /// Returns true if neither component carries any material.
    pub fn is_zero(&self) -> bool {
        self.radiation == 0.0 && self.interaction == 0.0
    }
}

impl AddAssign for Material {
    fn add_assign(&mut self, other: Self) {
        self.radiation += other.radiation;
        self.interaction += other.interaction;
    }
}

impl Add for Material {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            radiation: self.radiation + other.radiation,
            interaction: self.interaction + other.interaction,
        }
    }
}

impl Sum for Material {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}
