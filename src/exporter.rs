use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Instant;

use crate::viewer::{Capturable, TimeSeekable, ViewerError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot seek to time {index}: {source}")]
    Seek { index: usize, source: ViewerError },

    #[error("Capture failed at time {index}: {source}")]
    Capture { index: usize, source: ViewerError },

    #[error("Cannot write frame {index} to {path}: {source}")]
    Write {
        index: usize,
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Where and how exported frames are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    /// File extension, also selecting the encoder
    pub extension: String,
    pub prefix: String,
    /// Zero-padded digits in the time index
    pub index_width: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output_images/"),
            extension: "tif".to_string(),
            prefix: "time_".to_string(),
            index_width: 3,
        }
    }
}

impl ExportConfig {
    pub fn file_name(&self, index: usize) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            index,
            self.extension,
            width = self.index_width
        )
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(self.file_name(index))
    }
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Written files in time order
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

pub struct FrameExporter {
    config: ExportConfig,
}

impl FrameExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Write one image per time point of `viewer`, in ascending time order.
    ///
    /// The output directory is created if needed. The first seek, capture or
    /// write failure aborts the export; frames already written stay on disk.
    pub fn export<V>(&self, viewer: &mut V) -> Result<ExportSummary, ExportError>
    where
        V: TimeSeekable + Capturable,
    {
        let started = Instant::now();
        Self::ensure_dir(&self.config.output_dir)?;

        let time_points = viewer.time_points();
        let mut files = Vec::with_capacity(time_points);
        for index in 0..time_points {
            viewer
                .set_time(index)
                .map_err(|source| ExportError::Seek { index, source })?;
            let frame = viewer
                .capture()
                .map_err(|source| ExportError::Capture { index, source })?;

            let path = self.config.frame_path(index);
            frame.save(&path).map_err(|source| ExportError::Write {
                index,
                path: path.clone(),
                source,
            })?;
            tracing::info!("Saved frame at time {} to {}", index, path.display());
            files.push(path);
        }

        let elapsed = started.elapsed();
        tracing::info!(
            frames = files.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            dir = %self.config.output_dir.display(),
            "export finished"
        );
        Ok(ExportSummary { files, elapsed })
    }

    fn ensure_dir(path: &Path) -> Result<(), ExportError> {
        fs::create_dir_all(path).map_err(|source| ExportError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
    }
}
