//! # landmark-timelapse
//!
//! Renders a 3D+t microscopy stack from a camera aligned to two landmarks and
//! writes one image per time point.
//!
//! The stack is read from a multi-page TIFF into a (time, z, y, x) [`Volume`].
//! Time and depth extents come from ImageJ hyperstack metadata or from the
//! configuration. The [`OrientationCalculator`] turns the two landmarks into
//! a [`CameraPose`] whose screen x axis runs along the landmark line:
//!  - yaw: angle of the line in the (y, x) plane, measured from the y axis
//!  - pitch: elevation of the line above that plane
//!  - roll: always zero
//!
//! The [`HeadlessViewer`] renders maximum intensity (or mean) projections on
//! the CPU and draws the landmarks as markers. The [`FrameExporter`] steps it
//! through every time point and saves `time_000.tif`, `time_001.tif`, ...
//!
//! The exporter only needs the [`TimeSeekable`] and [`Capturable`]
//! capabilities, so any other viewer can be plugged in.
//!
//! # Examples
//!
//! ## Aligning and exporting a stack
//!
//! ```no_run
//! # use landmark_timelapse::{AppConfig, FrameExporter, VolumeLoader, pipeline};
//! let config = AppConfig::default();
//! let volume = VolumeLoader::load_from_file(&config.input, config.stack)
//!     .expect("should have loaded the stack");
//! let mut viewer = pipeline::prepare_viewer(&config, volume)
//!     .expect("landmarks should be distinct");
//! let summary = FrameExporter::new(config.export.clone())
//!     .export(&mut viewer)
//!     .expect("should have written every frame");
//! println!("{} frames", summary.files.len());
//! ```
//!
//! ## Computing a pose
//!
//! ```
//! # use landmark_timelapse::{OrientationCalculator, Point3D};
//! let pose = OrientationCalculator::compute(
//!     &Point3D::new(2.0, 65.0, 70.0),
//!     &Point3D::new(5.0, 140.0, 95.0),
//!     4.0,
//! )
//! .unwrap();
//! assert!((pose.yaw - 18.43).abs() < 0.01);
//! assert!((pose.pitch - 2.17).abs() < 0.01);
//! assert_eq!(pose.center, Point3D::new(3.5, 102.5, 82.5));
//! ```

pub mod config;
pub mod enums;
pub mod error;
pub mod exporter;
mod interpolator;
pub mod logging;
pub mod orientation;
pub mod pipeline;
pub mod point;
pub mod renderer;
pub mod viewer;
pub mod volume;
pub mod volume_loader;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use exporter::{ExportConfig, ExportError, FrameExporter};
pub use orientation::{CameraPose, OrientationCalculator, OrientationError};
pub use point::Point3D;
pub use viewer::{Capturable, Frame, HeadlessViewer, PoseSettable, TimeSeekable};
pub use volume::Volume;
pub use volume_loader::{StackShape, VolumeLoader};
