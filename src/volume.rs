use ndarray::{Array4, ArrayView2, ArrayView3, Axis, s};
use rayon::prelude::*;

/// A 3D+t intensity stack indexed as (time, z, y, x).
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array4<f32>,
    /// Voxel size in world units, (z, y, x)
    pub scale: [f64; 3],
    /// Intensities mapped to black and white when rendering
    pub contrast_limits: (f32, f32),
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(Array4::zeros((0, 0, 0, 0)))
    }
}

impl Volume {
    pub fn new(data: Array4<f32>) -> Self {
        let contrast_limits = Self::data_range(&data);
        Self {
            data,
            scale: [1.0; 3],
            contrast_limits,
        }
    }

    pub fn with_scale(mut self, scale: [f64; 3]) -> Self {
        self.scale = scale;
        self
    }

    /// Get the dimensions of the volume (time, depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }

    /// Spatial dimensions of one time point (depth, height, width)
    pub fn spatial_dim(&self) -> (usize, usize, usize) {
        let (_, depth, height, width) = self.data.dim();
        (depth, height, width)
    }

    pub fn time_points(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    /// The 3D stack at time index `t`, `None` past the end of the time axis.
    pub fn time_point(&self, t: usize) -> Option<ArrayView3<'_, f32>> {
        (t < self.time_points()).then(|| self.data.index_axis(Axis(0), t))
    }

    /// The z plane `z` of time index `t`.
    pub fn plane(&self, t: usize, z: usize) -> Option<ArrayView2<'_, f32>> {
        let (frames, depth, _, _) = self.data.dim();
        (t < frames && z < depth).then(|| self.data.slice(s![t, z, .., ..]))
    }

    /// Map an intensity to 0..=255 under the current contrast limits.
    #[inline]
    pub fn normalize_to_u8(&self, value: f32) -> u8 {
        let (low, high) = self.contrast_limits;
        let span = high - low;
        if span <= 0.0 {
            return if value > low { 255 } else { 0 };
        }
        (((value - low) / span) * 255.0).round().clamp(0.0, 255.0) as u8
    }

    fn data_range(data: &Array4<f32>) -> (f32, f32) {
        let range = data
            .as_slice()
            .map(|values| {
                values
                    .par_iter()
                    .fold(
                        || (f32::INFINITY, f32::NEG_INFINITY),
                        |(lo, hi), &v| (lo.min(v), hi.max(v)),
                    )
                    .reduce(
                        || (f32::INFINITY, f32::NEG_INFINITY),
                        |a, b| (a.0.min(b.0), a.1.max(b.1)),
                    )
            })
            .unwrap_or_else(|| {
                data.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
            });

        if range.0.is_finite() && range.1.is_finite() {
            range
        } else {
            (0.0, 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Volume {
        Volume::new(Array4::from_shape_fn((3, 2, 4, 5), |(t, z, y, x)| {
            (t * 1000 + z * 100 + y * 10 + x) as f32
        }))
    }

    #[test]
    fn contrast_limits_span_the_data() {
        let volume = ramp();
        assert_eq!(volume.contrast_limits, (0.0, 2134.0));
        assert_eq!(volume.dim(), (3, 2, 4, 5));
        assert_eq!(volume.spatial_dim(), (2, 4, 5));
    }

    #[test]
    fn time_point_views() {
        let volume = ramp();
        let stack = volume.time_point(2).unwrap();
        assert_eq!(stack[[1, 3, 4]], 2134.0);
        assert!(volume.time_point(3).is_none());
        assert_eq!(volume.plane(1, 1).unwrap()[[0, 0]], 1100.0);
        assert!(volume.plane(1, 2).is_none());
    }

    #[test]
    fn normalization_clamps_to_limits() {
        let mut volume = ramp();
        volume.contrast_limits = (100.0, 200.0);
        assert_eq!(volume.normalize_to_u8(50.0), 0);
        assert_eq!(volume.normalize_to_u8(150.0), 128);
        assert_eq!(volume.normalize_to_u8(400.0), 255);
    }

    #[test]
    fn constant_volume_does_not_divide_by_zero() {
        let volume = Volume::new(Array4::from_elem((1, 1, 2, 2), 7.0));
        assert_eq!(volume.contrast_limits, (7.0, 7.0));
        assert_eq!(volume.normalize_to_u8(7.0), 0);
    }

    #[test]
    fn empty_volume_has_no_time_points() {
        let volume = Volume::default();
        assert_eq!(volume.time_points(), 0);
        assert_eq!(volume.contrast_limits, (0.0, 0.0));
    }
}
