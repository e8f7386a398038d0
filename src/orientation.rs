use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::point::Point3D;

#[derive(Debug, Error, PartialEq)]
pub enum OrientationError {
    #[error("Landmarks coincide at {0:?}, direction is undefined")]
    CoincidentLandmarks(Point3D),

    #[error("Landmark has non-finite coordinates: {0:?}")]
    NonFinite(Point3D),
}

/// Camera state applied to the viewer: Euler angles in degrees, the focal
/// center in world coordinates and the zoom in screen pixels per world unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
    pub center: Point3D,
    pub zoom: f64,
}

/// Orthonormal camera frame in world (z, y, x) coordinates.
///
/// `right` and `down` span the screen, `forward` points into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Point3D,
    pub down: Point3D,
    pub forward: Point3D,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            center: Point3D::default(),
            zoom: 1.0,
        }
    }
}

impl CameraPose {
    /// Screen axes for this pose.
    ///
    /// With zero angles the screen x axis follows world y, screen rows follow
    /// world x and the camera looks along world z. Yaw turns the screen x axis
    /// towards world x, pitch lifts it towards world z, roll spins the screen
    /// about `forward`.
    pub fn basis(&self) -> CameraBasis {
        let (sin_p, cos_p) = self.pitch.to_radians().sin_cos();
        let (sin_y, cos_y) = self.yaw.to_radians().sin_cos();
        let (sin_r, cos_r) = self.roll.to_radians().sin_cos();

        let right = Point3D::new(sin_p, cos_p * cos_y, cos_p * sin_y);
        let down = Point3D::new(0.0, -sin_y, cos_y);

        let rolled_right = right * cos_r + down * sin_r;
        let rolled_down = down * cos_r - right * sin_r;

        CameraBasis {
            right: rolled_right,
            down: rolled_down,
            forward: rolled_right.cross(&rolled_down),
        }
    }

    /// Project a world point to continuous screen coordinates (column, row)
    /// on a canvas of the given size.
    pub fn project(&self, point: &Point3D, width: u32, height: u32) -> (f64, f64) {
        let basis = self.basis();
        let offset = *point - self.center;
        let col = offset.dot(&basis.right) * self.zoom + width as f64 / 2.0;
        let row = offset.dot(&basis.down) * self.zoom + height as f64 / 2.0;
        (col, row)
    }
}

pub struct OrientationCalculator;

impl OrientationCalculator {
    /// Compute the pose that lays the line from `point1` to `point2` along the
    /// screen x axis, centered on their midpoint.
    ///
    /// Yaw is measured in the (y, x) plane from the y axis, pitch is the
    /// elevation of the direction above that plane. Roll is always zero: two
    /// points carry no twist information.
    ///
    /// # Errors
    ///
    /// Returns [`OrientationError::CoincidentLandmarks`] when both points are
    /// equal and [`OrientationError::NonFinite`] for NaN or infinite input.
    pub fn compute(
        point1: &Point3D,
        point2: &Point3D,
        zoom: f64,
    ) -> Result<CameraPose, OrientationError> {
        for point in [point1, point2] {
            if !point.is_finite() {
                return Err(OrientationError::NonFinite(*point));
            }
        }

        let direction = *point2 - *point1;
        if direction.norm() == 0.0 {
            return Err(OrientationError::CoincidentLandmarks(*point1));
        }

        let (dx, dy) = (direction.y(), direction.x());
        let yaw = dy.atan2(dx).to_degrees();

        let dz = direction.z();
        let pitch = dz.atan2(dx.hypot(dy)).to_degrees();

        Ok(CameraPose {
            pitch,
            yaw,
            roll: 0.0,
            center: point1.midpoint(point2),
            zoom,
        })
    }
}
