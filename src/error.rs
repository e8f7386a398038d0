use thiserror::Error;

use crate::config::ConfigError;
use crate::exporter::ExportError;
use crate::orientation::OrientationError;
use crate::viewer::ViewerError;
use crate::volume_loader::VolumeLoaderError;

/// Any failure of a full load, orient and export run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] VolumeLoaderError),

    #[error(transparent)]
    Orientation(#[from] OrientationError),

    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, Error>;
