use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A coordinate inside the volume, stored in array axis order (z, y, x).
///
/// Serializes as a plain `[z, y, x]` array so landmark lists read the same in
/// configuration files as they do in array indices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Point3D(pub [f64; 3]);

impl Point3D {
    pub const fn new(z: f64, y: f64, x: f64) -> Self {
        Self([z, y, x])
    }

    pub fn z(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    pub fn x(&self) -> f64 {
        self.0[2]
    }

    pub fn midpoint(&self, other: &Point3D) -> Point3D {
        (*self + *other) / 2.0
    }

    pub fn dot(&self, other: &Point3D) -> f64 {
        self.0[0] * other.0[0] + self.0[1] * other.0[1] + self.0[2] * other.0[2]
    }

    /// Cross product treating (z, y, x) as a right-handed basis.
    pub fn cross(&self, other: &Point3D) -> Point3D {
        let [a0, a1, a2] = self.0;
        let [b0, b1, b2] = other.0;
        Point3D([a1 * b2 - a2 * b1, a2 * b0 - a0 * b2, a0 * b1 - a1 * b0])
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Component-wise product, used to move between voxel and world units.
    pub fn scale(&self, factors: [f64; 3]) -> Point3D {
        Point3D([
            self.0[0] * factors[0],
            self.0[1] * factors[1],
            self.0[2] * factors[2],
        ])
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(coords: [f64; 3]) -> Self {
        Self(coords)
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Point3D) -> Point3D {
        Point3D([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Point3D) -> Point3D {
        Point3D([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;

    fn mul(self, rhs: f64) -> Point3D {
        Point3D([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

impl Div<f64> for Point3D {
    type Output = Point3D;

    fn div(self, rhs: f64) -> Point3D {
        Point3D([self.0[0] / rhs, self.0[1] / rhs, self.0[2] / rhs])
    }
}
