use std::fs::File;
use std::path::Path;

use image::Rgb;
use landmark_timelapse::{
    AppConfig, Point3D, StackShape, VolumeLoader, enums::DisplayMode, pipeline,
};
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

const FRAMES: usize = 3;
const SLICES: usize = 4;
const SIZE: u32 = 40;

/// Writes a z-fastest hyperstack whose page `i` has a bright square whose
/// intensity grows with time.
fn write_stack(path: &Path, description: Option<&str>) {
    let mut encoder = TiffEncoder::new(File::create(path).unwrap()).unwrap();
    for page in 0..FRAMES * SLICES {
        let t = page / SLICES;
        let data: Vec<u16> = (0..SIZE * SIZE)
            .map(|i| {
                let (y, x) = (i / SIZE, i % SIZE);
                if (15..25).contains(&y) && (15..25).contains(&x) {
                    1000 * (t as u16 + 1)
                } else {
                    0
                }
            })
            .collect();
        let mut image = encoder.new_image::<colortype::Gray16>(SIZE, SIZE).unwrap();
        if let (0, Some(description)) = (page, description) {
            image
                .encoder()
                .write_tag(Tag::ImageDescription, description)
                .unwrap();
        }
        image.write_data(&data).unwrap();
    }
}

fn config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.input = dir.join("stack.tif");
    config.export.output_dir = dir.join("frames");
    config.export.extension = "png".to_string();
    config.canvas.width = 64;
    config.canvas.height = 48;
    config.camera.zoom = 1.0;
    config.marker.size = 3.0;
    config.landmarks.point1 = Point3D::new(1.0, 10.0, 10.0);
    config.landmarks.point2 = Point3D::new(2.0, 30.0, 20.0);
    config
}

#[test]
fn imagej_stack_exports_one_frame_per_time_point() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config(tmp.path());
    write_stack(
        &config.input,
        Some("ImageJ=1.54f\nimages=12\nslices=4\nframes=3\nhyperstack=true\n"),
    );

    let summary = pipeline::run(&config).unwrap();

    let mut names: Vec<_> = std::fs::read_dir(&config.export.output_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["time_000.png", "time_001.png", "time_002.png"]);
    assert_eq!(summary.files.len(), FRAMES);
    assert_eq!(summary.files[2], config.export.output_dir.join("time_002.png"));
}

#[test]
fn landmark_markers_share_a_row() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config(tmp.path());
    write_stack(&config.input, None);

    let volume = VolumeLoader::load_from_file(
        &config.input,
        StackShape {
            frames: Some(FRAMES),
            slices: None,
        },
    )
    .unwrap();
    assert_eq!(volume.dim(), (FRAMES, SLICES, SIZE as usize, SIZE as usize));

    let mut viewer = pipeline::prepare_viewer(&config, volume).unwrap();
    let summary = landmark_timelapse::FrameExporter::new(config.export.clone())
        .export(&mut viewer)
        .unwrap();

    let image = image::open(&summary.files[0]).unwrap().to_rgb8();
    let red = Rgb([255, 0, 0]);
    // half the landmark distance is ~11.19 px from the canvas center (32, 24)
    assert_eq!(image.get_pixel(20, 23), &red);
    assert_eq!(image.get_pixel(43, 23), &red);
    assert_ne!(image.get_pixel(20, 19), &red);
}

#[test]
fn planar_display_exports_the_middle_slice() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config(tmp.path());
    config.camera.display = DisplayMode::Planar;
    config.stack.frames = Some(FRAMES);
    write_stack(&config.input, None);

    let summary = pipeline::run(&config).unwrap();
    assert_eq!(summary.files.len(), FRAMES);

    let first = image::open(&summary.files[0]).unwrap().to_rgb8();
    let last = image::open(&summary.files[2]).unwrap().to_rgb8();
    assert_eq!(first.dimensions(), (64, 48));
    // brighter square at later time points
    let probe = |img: &image::RgbImage| img.get_pixel(32, 24).0[0];
    assert!(probe(&last) > probe(&first));
}

#[test]
fn rerunning_into_the_same_directory_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config(tmp.path());
    config.stack.frames = Some(FRAMES);
    write_stack(&config.input, None);

    pipeline::run(&config).unwrap();
    let summary = pipeline::run(&config).unwrap();
    assert_eq!(summary.files.len(), FRAMES);
}

#[test]
fn shape_mismatch_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config(tmp.path());
    config.stack.frames = Some(5);
    write_stack(&config.input, None);

    let err = pipeline::run(&config).unwrap_err();
    assert!(err.to_string().contains("12 pages"));
    assert!(!config.export.output_dir.exists());
}
