use ndarray::{ArrayView2, ArrayView3};

use crate::enums::Interpolation;

pub(crate) struct Interpolator;

impl Interpolator {
    /// Physical extent of a (depth, height, width) grid under a (z, y, x)
    /// voxel size.
    pub(crate) fn world_extent(scale: [f64; 3], dim: (usize, usize, usize)) -> [f64; 3] {
        [
            dim.0 as f64 * scale[0],
            dim.1 as f64 * scale[1],
            dim.2 as f64 * scale[2],
        ]
    }

    /// Sample a plane at continuous (y, x) voxel coordinates, `None` outside.
    pub(crate) fn sample_2d(
        slice: &ArrayView2<f32>,
        y: f32,
        x: f32,
        interpolation: Interpolation,
    ) -> Option<f32> {
        let (height, width) = slice.dim();
        if !Self::in_range(y, height) || !Self::in_range(x, width) {
            return None;
        }
        match interpolation {
            Interpolation::Nearest => {
                Some(slice[[Self::nearest(y, height), Self::nearest(x, width)]])
            }
            Interpolation::Linear => Some(Self::bilinear_interpolate(slice, y, x)),
        }
    }

    /// Sample a volume at continuous (z, y, x) voxel coordinates, `None`
    /// outside.
    pub(crate) fn sample_3d(
        volume: &ArrayView3<f32>,
        z: f32,
        y: f32,
        x: f32,
        interpolation: Interpolation,
    ) -> Option<f32> {
        let (depth, height, width) = volume.dim();
        if !Self::in_range(z, depth) || !Self::in_range(y, height) || !Self::in_range(x, width) {
            return None;
        }
        match interpolation {
            Interpolation::Nearest => Some(
                volume[[
                    Self::nearest(z, depth),
                    Self::nearest(y, height),
                    Self::nearest(x, width),
                ]],
            ),
            Interpolation::Linear => Some(Self::trilinear_interpolate(volume, z, y, x)),
        }
    }

    // Voxel centers sit on integer coordinates, so the valid range is the
    // half-voxel border around [0, len - 1].
    #[inline]
    fn in_range(coord: f32, len: usize) -> bool {
        len > 0 && coord >= -0.5 && coord <= len as f32 - 0.5
    }

    #[inline]
    fn nearest(coord: f32, len: usize) -> usize {
        (coord.round().max(0.0) as usize).min(len - 1)
    }

    #[inline]
    fn clamp_coord(coord: f32, len: usize) -> f32 {
        coord.clamp(0.0, (len - 1) as f32)
    }

    #[inline]
    pub(crate) fn bilinear_interpolate(slice: &ArrayView2<f32>, y: f32, x: f32) -> f32 {
        let (height, width) = slice.dim();
        let y = Self::clamp_coord(y, height);
        let x = Self::clamp_coord(x, width);

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f32;
        let dx = x - x0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v0 = slice[[y0, x0]].mul_add(one_minus_dx, slice[[y0, x1]] * dx);
        let v1 = slice[[y1, x0]].mul_add(one_minus_dx, slice[[y1, x1]] * dx);

        v0.mul_add(one_minus_dy, v1 * dy)
    }

    #[inline]
    pub(crate) fn trilinear_interpolate(volume: &ArrayView3<f32>, z: f32, y: f32, x: f32) -> f32 {
        let depth = volume.dim().0;
        let z = Self::clamp_coord(z, depth);
        let z0 = z.floor() as usize;
        let z1 = (z0 + 1).min(depth - 1);
        let dz = z - z0 as f32;

        let lower = Self::bilinear_interpolate(&volume.index_axis(ndarray::Axis(0), z0), y, x);
        if dz == 0.0 || z1 == z0 {
            return lower;
        }
        let upper = Self::bilinear_interpolate(&volume.index_axis(ndarray::Axis(0), z1), y, x);

        lower.mul_add(1.0 - dz, upper * dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn bilinear_midpoint_averages_corners() {
        let slice = Array2::from_shape_vec((2, 2), vec![0.0, 10.0, 20.0, 30.0]).unwrap();
        let v = Interpolator::bilinear_interpolate(&slice.view(), 0.5, 0.5);
        assert!((v - 15.0).abs() < 1e-5);
    }

    #[test]
    fn trilinear_blends_between_planes() {
        let mut volume = Array3::<f32>::zeros((2, 2, 2));
        volume.index_axis_mut(ndarray::Axis(0), 1).fill(100.0);
        let v = Interpolator::trilinear_interpolate(&volume.view(), 0.25, 0.5, 0.5);
        assert!((v - 25.0).abs() < 1e-4);
    }

    #[test]
    fn samples_outside_the_grid_are_none() {
        let volume = Array3::<f32>::ones((3, 4, 5));
        let view = volume.view();
        assert_eq!(
            Interpolator::sample_3d(&view, 1.0, 1.0, 5.0, Interpolation::Linear),
            None
        );
        assert_eq!(
            Interpolator::sample_3d(&view, -0.6, 1.0, 1.0, Interpolation::Nearest),
            None
        );
        assert_eq!(
            Interpolator::sample_3d(&view, 2.4, 3.4, 4.4, Interpolation::Nearest),
            Some(1.0)
        );
    }

    #[test]
    fn world_extent_applies_scale() {
        let extent = Interpolator::world_extent([2.0, 0.5, 0.5], (5, 100, 80));
        assert_eq!(extent, [10.0, 50.0, 40.0]);
    }
}
