use image::{ImageBuffer, Luma};
use rayon::prelude::*;

use crate::enums::{Interpolation, Rendering};
use crate::interpolator::Interpolator;
use crate::orientation::CameraPose;
use crate::point::Point3D;
use crate::volume::Volume;

pub type GrayImage = ImageBuffer<Luma<u8>, Vec<u8>>;

/// Upper bound on samples along one ray; longer rays get a coarser step.
const MAX_RAY_SAMPLES: usize = 1 << 14;

/// CPU ray caster producing one grayscale image per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    pub width: u32,
    pub height: u32,
    pub rendering: Rendering,
    pub interpolation: Interpolation,
    /// Distance between ray samples in world units
    pub step: f64,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rendering: Rendering::default(),
            interpolation: Interpolation::default(),
            step: 0.5,
        }
    }

    /// World position of the center of canvas pixel (col, row) on the plane
    /// through the pose center.
    fn pixel_origin(
        &self,
        pose: &CameraPose,
        right: &Point3D,
        down: &Point3D,
        col: u32,
        row: u32,
    ) -> Point3D {
        let u = (col as f64 + 0.5 - self.width as f64 / 2.0) / pose.zoom;
        let v = (row as f64 + 0.5 - self.height as f64 / 2.0) / pose.zoom;
        pose.center + *right * u + *down * v
    }

    /// Project the time point `t` of `volume` along the pose's forward axis.
    ///
    /// Returns `None` when `t` is outside the time axis.
    pub fn render_volumetric(
        &self,
        volume: &Volume,
        t: usize,
        pose: &CameraPose,
    ) -> Option<GrayImage> {
        let stack = volume.time_point(t)?;
        let basis = pose.basis();
        let scale = volume.scale;
        let extent = Interpolator::world_extent(scale, stack.dim());
        let lower = Point3D::new(-0.5 * scale[0], -0.5 * scale[1], -0.5 * scale[2]);
        let upper = Point3D::from(extent) + lower;
        let step = self.step.max(f64::EPSILON);

        let pixel_data: Vec<u8> = (0..self.height)
            .into_par_iter()
            .flat_map(|row| {
                (0..self.width)
                    .map(|col| {
                        let origin = self.pixel_origin(pose, &basis.right, &basis.down, col, row);
                        let Some((enter, exit)) =
                            ray_box(&origin, &basis.forward, &lower, &upper)
                        else {
                            return 0;
                        };

                        let span = exit - enter;
                        let step = step.max(span / MAX_RAY_SAMPLES as f64);
                        let samples = (span / step).floor() as usize + 1;

                        let mut max = f32::NEG_INFINITY;
                        let mut sum = 0.0f64;
                        let mut count = 0usize;
                        for i in 0..samples {
                            let world = origin + basis.forward * (enter + i as f64 * step);
                            if let Some(v) = Interpolator::sample_3d(
                                &stack,
                                (world.z() / scale[0]) as f32,
                                (world.y() / scale[1]) as f32,
                                (world.x() / scale[2]) as f32,
                                self.interpolation,
                            ) {
                                max = max.max(v);
                                sum += v as f64;
                                count += 1;
                            }
                        }

                        if count == 0 {
                            return 0;
                        }
                        let value = match self.rendering {
                            Rendering::MaximumIntensity => max,
                            Rendering::Average => (sum / count as f64) as f32,
                        };
                        volume.normalize_to_u8(value)
                    })
                    .collect::<Vec<u8>>()
            })
            .collect();

        ImageBuffer::from_raw(self.width, self.height, pixel_data)
    }

    /// Render z plane `z` of time point `t`, screen x following world x and
    /// screen rows following world y. Camera angles are ignored.
    pub fn render_planar(
        &self,
        volume: &Volume,
        t: usize,
        z: usize,
        pose: &CameraPose,
    ) -> Option<GrayImage> {
        let plane = volume.plane(t, z)?;
        let scale = volume.scale;

        let pixel_data: Vec<u8> = (0..self.height)
            .into_par_iter()
            .flat_map(|row| {
                (0..self.width)
                    .map(|col| {
                        let (x, y) = self.planar_world(pose, col, row);
                        Interpolator::sample_2d(
                            &plane,
                            (y / scale[1]) as f32,
                            (x / scale[2]) as f32,
                            self.interpolation,
                        )
                        .map_or(0, |v| volume.normalize_to_u8(v))
                    })
                    .collect::<Vec<u8>>()
            })
            .collect();

        ImageBuffer::from_raw(self.width, self.height, pixel_data)
    }

    fn planar_world(&self, pose: &CameraPose, col: u32, row: u32) -> (f64, f64) {
        let x = pose.center.x() + (col as f64 + 0.5 - self.width as f64 / 2.0) / pose.zoom;
        let y = pose.center.y() + (row as f64 + 0.5 - self.height as f64 / 2.0) / pose.zoom;
        (x, y)
    }

    /// Screen position (column, row) of a world point in planar display.
    pub fn project_planar(&self, point: &Point3D, pose: &CameraPose) -> (f64, f64) {
        let col = (point.x() - pose.center.x()) * pose.zoom + self.width as f64 / 2.0;
        let row = (point.y() - pose.center.y()) * pose.zoom + self.height as f64 / 2.0;
        (col, row)
    }
}

/// Parametric interval where `origin + s * direction` lies inside the box.
fn ray_box(
    origin: &Point3D,
    direction: &Point3D,
    lower: &Point3D,
    upper: &Point3D,
) -> Option<(f64, f64)> {
    let mut enter = f64::NEG_INFINITY;
    let mut exit = f64::INFINITY;
    for axis in 0..3 {
        let (o, d) = (origin.0[axis], direction.0[axis]);
        let (lo, hi) = (lower.0[axis], upper.0[axis]);
        if d.abs() < 1e-12 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (a, b) = ((lo - o) / d, (hi - o) / d);
        enter = enter.max(a.min(b));
        exit = exit.min(a.max(b));
    }
    (enter <= exit).then_some((enter, exit))
}
