use crate::config::{AppConfig, Landmarks};
use crate::error::Result;
use crate::exporter::{ExportSummary, FrameExporter};
use crate::orientation::{CameraPose, OrientationCalculator};
use crate::viewer::{HeadlessViewer, PointsLayer, PoseSettable};
use crate::volume::Volume;
use crate::volume_loader::VolumeLoader;

/// Pose for the configured landmarks and zoom.
pub fn landmark_pose(config: &AppConfig) -> Result<CameraPose> {
    let Landmarks { point1, point2 } = config.landmarks;
    let pose = OrientationCalculator::compute(&point1, &point2, config.camera.zoom)?;
    tracing::info!(
        pitch = pose.pitch,
        yaw = pose.yaw,
        roll = pose.roll,
        center = ?pose.center.0,
        zoom = pose.zoom,
        "camera aligned to landmarks"
    );
    Ok(pose)
}

/// Build a viewer showing `volume` and the landmark markers, with the camera
/// aligned to the landmarks.
pub fn prepare_viewer(config: &AppConfig, volume: Volume) -> Result<HeadlessViewer> {
    let mut viewer = HeadlessViewer::new(config.renderer());
    let name = config
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stack".to_string());
    viewer.add_image(volume.with_scale(config.scale), name);
    viewer.add_points(PointsLayer {
        name: config.marker.name.clone(),
        points: vec![config.landmarks.point1, config.landmarks.point2],
        size: config.marker.size,
        face_color: config.marker.color,
    });
    viewer.set_display(config.camera.display);
    viewer.set_camera(landmark_pose(config)?);
    Ok(viewer)
}

/// Load the configured stack, orient the camera and export every time point.
pub fn run(config: &AppConfig) -> Result<ExportSummary> {
    config.validate()?;
    let volume = VolumeLoader::load_from_file(&config.input, config.stack)?;
    let mut viewer = prepare_viewer(config, volume)?;
    let summary = FrameExporter::new(config.export.clone()).export(&mut viewer)?;
    Ok(summary)
}
