use crate::volume::Volume;

use ndarray::{Array2, Array4, s};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;
use tiff::{
    decoder::{Decoder, DecodingResult},
    tags::Tag,
};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No images found in stack")]
    NoImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Page holds {found} samples, expected {expected} for a single-channel image")]
    UnsupportedPixelLayout { expected: usize, found: usize },

    #[error("Multi-channel hyperstacks are not supported ({0} channels)")]
    UnsupportedChannels(usize),

    #[error("{pages} pages cannot be arranged as {frames} frames x {slices} slices")]
    ShapeMismatch {
        pages: usize,
        frames: usize,
        slices: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
}

/// Time and depth extents of a stack stored as a flat sequence of pages.
///
/// Pages are ordered with z varying fastest, as ImageJ writes hyperstacks.
/// Missing fields are derived from the page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackShape {
    pub frames: Option<usize>,
    pub slices: Option<usize>,
}

impl StackShape {
    /// Fill gaps in `self` from `fallback`.
    pub fn or(self, fallback: StackShape) -> StackShape {
        StackShape {
            frames: self.frames.or(fallback.frames),
            slices: self.slices.or(fallback.slices),
        }
    }

    /// Resolve to concrete (frames, slices) for `pages` pages.
    pub fn resolve(&self, pages: usize) -> Result<(usize, usize), VolumeLoaderError> {
        let mismatch = |frames, slices| VolumeLoaderError::ShapeMismatch {
            pages,
            frames,
            slices,
        };
        let (frames, slices) = match (self.frames, self.slices) {
            (Some(frames), Some(slices)) => (frames, slices),
            (Some(frames), None) if frames > 0 && pages % frames == 0 => (frames, pages / frames),
            (None, Some(slices)) if slices > 0 && pages % slices == 0 => (pages / slices, slices),
            (Some(frames), None) => return Err(mismatch(frames, 0)),
            (None, Some(slices)) => return Err(mismatch(0, slices)),
            (None, None) => (1, pages),
        };
        if frames * slices != pages || pages == 0 {
            return Err(mismatch(frames, slices));
        }
        Ok((frames, slices))
    }
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from a multi-page TIFF file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TIFF stack
    /// * `shape` - Explicit frame/slice counts, taking precedence over any
    ///   ImageJ metadata in the file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be decoded, holds no pages, pages
    /// differ in size, or the page count does not fit the resolved shape.
    pub fn load_from_file(
        path: impl AsRef<Path>,
        shape: StackShape,
    ) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;

        let metadata = decoder
            .get_tag_ascii_string(Tag::ImageDescription)
            .ok()
            .map(|description| Self::parse_imagej_description(&description))
            .unwrap_or_default();
        if let Some(channels) = metadata.channels.filter(|&c| c > 1) {
            return Err(VolumeLoaderError::UnsupportedChannels(channels));
        }

        let mut pages = Vec::new();
        loop {
            pages.push(Self::decode_page(&mut decoder)?);
            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
        }
        tracing::debug!(path = %path.display(), pages = pages.len(), "decoded TIFF pages");

        Self::load_from_pages(pages, shape.or(metadata.shape))
    }

    /// Assemble a volume from z-fastest ordered 2D pages.
    pub fn load_from_pages(
        pages: Vec<Array2<f32>>,
        shape: StackShape,
    ) -> Result<Volume, VolumeLoaderError> {
        if pages.is_empty() {
            return Err(VolumeLoaderError::NoImages);
        }
        Self::validate_dimensions(&pages)?;

        let (frames, slices) = shape.resolve(pages.len())?;
        let volume = Self::build_volume_array(&pages, frames, slices);
        tracing::info!(frames, slices, dim = ?volume.dim(), "loaded volume");

        Ok(Volume::new(volume))
    }

    fn decode_page<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<Array2<f32>, VolumeLoaderError> {
        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);

        let samples: Vec<f32> = match decoder.read_image()? {
            DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::U32(v) => v.into_iter().map(|s| s as f32).collect(),
            DecodingResult::U64(v) => v.into_iter().map(|s| s as f32).collect(),
            DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
            DecodingResult::I32(v) => v.into_iter().map(|s| s as f32).collect(),
            DecodingResult::I64(v) => v.into_iter().map(|s| s as f32).collect(),
            DecodingResult::F32(v) => v,
            DecodingResult::F64(v) => v.into_iter().map(|s| s as f32).collect(),
        };

        let expected = width * height;
        if samples.len() != expected {
            return Err(VolumeLoaderError::UnsupportedPixelLayout {
                expected,
                found: samples.len(),
            });
        }
        Array2::from_shape_vec((height, width), samples).map_err(|_| {
            VolumeLoaderError::UnsupportedPixelLayout {
                expected,
                found: expected,
            }
        })
    }

    /// Extract `frames=`, `slices=` and `channels=` from an ImageJ
    /// description block. Non-ImageJ descriptions yield nothing.
    pub(crate) fn parse_imagej_description(description: &str) -> ImageJMetadata {
        if !description.starts_with("ImageJ=") {
            return ImageJMetadata::default();
        }
        let mut metadata = ImageJMetadata::default();
        for line in description.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().parse::<usize>().ok();
            match key.trim() {
                "frames" => metadata.shape.frames = value,
                "slices" => metadata.shape.slices = value,
                "channels" => metadata.channels = value,
                _ => {}
            }
        }
        metadata
    }

    fn validate_dimensions(pages: &[Array2<f32>]) -> Result<(), VolumeLoaderError> {
        let first_dim = pages[0].dim();
        if pages.iter().any(|page| page.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(pages: &[Array2<f32>], frames: usize, slices: usize) -> Array4<f32> {
        let (height, width) = pages[0].dim();
        let mut volume = Array4::<f32>::zeros((frames, slices, height, width));

        for (i, page) in pages.iter().enumerate() {
            volume.slice_mut(s![i / slices, i % slices, .., ..]).assign(page);
        }

        volume
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ImageJMetadata {
    pub(crate) shape: StackShape,
    pub(crate) channels: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(count: usize) -> Vec<Array2<f32>> {
        (0..count)
            .map(|i| Array2::from_elem((3, 4), i as f32))
            .collect()
    }

    #[test]
    fn pages_are_split_z_fastest() {
        let volume = VolumeLoader::load_from_pages(
            pages(6),
            StackShape {
                frames: Some(3),
                slices: None,
            },
        )
        .unwrap();
        assert_eq!(volume.dim(), (3, 2, 3, 4));
        assert_eq!(volume.data()[[0, 1, 0, 0]], 1.0);
        assert_eq!(volume.data()[[2, 0, 2, 3]], 4.0);
    }

    #[test]
    fn missing_shape_is_one_time_point() {
        let volume = VolumeLoader::load_from_pages(pages(5), StackShape::default()).unwrap();
        assert_eq!(volume.dim(), (1, 5, 3, 4));
    }

    #[test]
    fn shape_must_cover_all_pages() {
        let err = VolumeLoader::load_from_pages(
            pages(7),
            StackShape {
                frames: Some(2),
                slices: Some(3),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            VolumeLoaderError::ShapeMismatch {
                pages: 7,
                frames: 2,
                slices: 3
            }
        ));

        let err = StackShape {
            frames: None,
            slices: Some(4),
        }
        .resolve(7)
        .unwrap_err();
        assert!(matches!(err, VolumeLoaderError::ShapeMismatch { .. }));
    }

    #[test]
    fn inconsistent_pages_are_rejected() {
        let mut stack = pages(2);
        stack.push(Array2::zeros((2, 2)));
        assert!(matches!(
            VolumeLoader::load_from_pages(stack, StackShape::default()),
            Err(VolumeLoaderError::InconsistentDimensions)
        ));
    }

    #[test]
    fn empty_stack_is_rejected() {
        assert!(matches!(
            VolumeLoader::load_from_pages(Vec::new(), StackShape::default()),
            Err(VolumeLoaderError::NoImages)
        ));
    }

    #[test]
    fn imagej_description_is_parsed() {
        let metadata = VolumeLoader::parse_imagej_description(
            "ImageJ=1.54f\nimages=60\nslices=6\nframes=10\nhyperstack=true\n",
        );
        assert_eq!(metadata.shape.frames, Some(10));
        assert_eq!(metadata.shape.slices, Some(6));
        assert_eq!(metadata.channels, None);

        let other = VolumeLoader::parse_imagej_description("frames=10");
        assert_eq!(other, ImageJMetadata::default());
    }

    #[test]
    fn explicit_shape_overrides_metadata() {
        let explicit = StackShape {
            frames: Some(4),
            slices: None,
        };
        let from_file = StackShape {
            frames: Some(2),
            slices: Some(6),
        };
        assert_eq!(
            explicit.or(from_file),
            StackShape {
                frames: Some(4),
                slices: Some(6)
            }
        );
    }
}
