//! Viewer capabilities and a headless implementation.
//!
//! Export code only talks to the small capability traits below, so it can be
//! driven by [`HeadlessViewer`] in production and by fakes in tests.

use std::path::Path;

use image::{DynamicImage, ImageResult, Rgb, RgbImage};
use thiserror::Error;

use crate::enums::DisplayMode;
use crate::orientation::CameraPose;
use crate::point::Point3D;
use crate::renderer::Renderer;
use crate::volume::Volume;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Time index {index} out of range for {len} time points")]
    TimeOutOfRange { index: usize, len: usize },

    #[error("Slice index {index} out of range for {len} slices")]
    SliceOutOfRange { index: usize, len: usize },

    #[error("Nothing to capture: no image layer or empty canvas")]
    EmptyCanvas,

    #[error("Capture failed: {message}")]
    Capture { message: String },
}

/// Accepts a camera pose.
pub trait PoseSettable {
    fn set_camera(&mut self, pose: CameraPose);
    fn camera(&self) -> CameraPose;
}

/// Has a time axis with a movable cursor.
pub trait TimeSeekable {
    fn time_points(&self) -> usize;
    fn current_time(&self) -> usize;
    fn set_time(&mut self, index: usize) -> Result<(), ViewerError>;
}

/// Renders its current state synchronously.
pub trait Capturable {
    fn capture(&mut self) -> Result<Frame, ViewerError>;
}

/// One rendered image of the viewer at a given time index.
#[derive(Debug, Clone)]
pub struct Frame {
    pub time_index: usize,
    pub image: RgbImage,
}

impl Frame {
    /// Encode to `path`; the extension selects the format.
    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        self.image.save(path)
    }
}

/// Labelled markers drawn on top of the image layer, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsLayer {
    pub name: String,
    pub points: Vec<Point3D>,
    /// Marker diameter in world units
    pub size: f64,
    pub face_color: [u8; 3],
}

/// Off-screen viewer: one image layer, any number of point layers, a camera
/// and a (time, z) cursor.
#[derive(Debug, Clone)]
pub struct HeadlessViewer {
    renderer: Renderer,
    image_name: Option<String>,
    volume: Volume,
    points: Vec<PointsLayer>,
    display: DisplayMode,
    camera: CameraPose,
    current_time: usize,
    current_slice: usize,
}

impl HeadlessViewer {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            image_name: None,
            volume: Volume::default(),
            points: Vec::new(),
            display: DisplayMode::Planar,
            camera: CameraPose::default(),
            current_time: 0,
            current_slice: 0,
        }
    }

    /// Show `volume`, resetting the cursor to the first time point and the
    /// middle slice and centering the camera on the stack.
    pub fn add_image(&mut self, volume: Volume, name: impl Into<String>) {
        let (depth, height, width) = volume.spatial_dim();
        let center = Point3D::new(
            (depth as f64 - 1.0).max(0.0) / 2.0,
            (height as f64 - 1.0).max(0.0) / 2.0,
            (width as f64 - 1.0).max(0.0) / 2.0,
        );
        self.camera.center = center.scale(volume.scale);
        self.current_time = 0;
        self.current_slice = depth / 2;
        self.volume = volume;
        self.image_name = Some(name.into());
        tracing::debug!(name = ?self.image_name, dim = ?self.volume.dim(), "added image layer");
    }

    pub fn add_points(&mut self, layer: PointsLayer) {
        tracing::debug!(name = %layer.name, count = layer.points.len(), "added points layer");
        self.points.push(layer);
    }

    pub fn set_display(&mut self, display: DisplayMode) {
        self.display = display;
    }

    pub fn current_slice(&self) -> usize {
        self.current_slice
    }

    pub fn set_slice(&mut self, index: usize) -> Result<(), ViewerError> {
        let len = self.volume.spatial_dim().0;
        if index >= len {
            return Err(ViewerError::SliceOutOfRange { index, len });
        }
        self.current_slice = index;
        Ok(())
    }

    /// Screen position of a world point under the current display mode, or
    /// `None` when the point is not on the displayed plane.
    fn marker_position(&self, point: &Point3D) -> Option<(f64, f64)> {
        let (width, height) = (self.renderer.width, self.renderer.height);
        match self.display {
            DisplayMode::Volumetric => Some(self.camera.project(point, width, height)),
            DisplayMode::Planar => {
                let slice = (point.z() / self.volume.scale[0]).round();
                (slice == self.current_slice as f64)
                    .then(|| self.renderer.project_planar(point, &self.camera))
            }
        }
    }

    fn draw_markers(&self, image: &mut RgbImage) {
        for layer in &self.points {
            let radius = layer.size * self.camera.zoom / 2.0;
            for point in &layer.points {
                let Some((col, row)) = self.marker_position(point) else {
                    continue;
                };
                fill_disc(image, col, row, radius, Rgb(layer.face_color));
            }
        }
    }
}

impl PoseSettable for HeadlessViewer {
    fn set_camera(&mut self, pose: CameraPose) {
        tracing::debug!(?pose, "camera updated");
        self.camera = pose;
    }

    fn camera(&self) -> CameraPose {
        self.camera
    }
}

impl TimeSeekable for HeadlessViewer {
    fn time_points(&self) -> usize {
        self.volume.time_points()
    }

    fn current_time(&self) -> usize {
        self.current_time
    }

    fn set_time(&mut self, index: usize) -> Result<(), ViewerError> {
        let len = self.time_points();
        if index >= len {
            return Err(ViewerError::TimeOutOfRange { index, len });
        }
        self.current_time = index;
        Ok(())
    }
}

impl Capturable for HeadlessViewer {
    fn capture(&mut self) -> Result<Frame, ViewerError> {
        if self.image_name.is_none() || self.renderer.width == 0 || self.renderer.height == 0 {
            return Err(ViewerError::EmptyCanvas);
        }

        let gray = match self.display {
            DisplayMode::Volumetric => {
                self.renderer
                    .render_volumetric(&self.volume, self.current_time, &self.camera)
            }
            DisplayMode::Planar => self.renderer.render_planar(
                &self.volume,
                self.current_time,
                self.current_slice,
                &self.camera,
            ),
        }
        .ok_or(ViewerError::EmptyCanvas)?;

        let mut image = DynamicImage::ImageLuma8(gray).to_rgb8();
        self.draw_markers(&mut image);

        Ok(Frame {
            time_index: self.current_time,
            image,
        })
    }
}

fn fill_disc(image: &mut RgbImage, col: f64, row: f64, radius: f64, color: Rgb<u8>) {
    if !(col.is_finite() && row.is_finite()) || radius <= 0.0 {
        return;
    }
    let (width, height) = image.dimensions();
    let x_min = (col - radius).floor().max(0.0) as u32;
    let y_min = (row - radius).floor().max(0.0) as u32;
    let x_max = ((col + radius).ceil().max(0.0) as u32).min(width);
    let y_max = ((row + radius).ceil().max(0.0) as u32).min(height);

    for y in y_min..y_max {
        for x in x_min..x_max {
            let dx = x as f64 + 0.5 - col;
            let dy = y as f64 + 0.5 - row;
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x, y, color);
            }
        }
    }
}
