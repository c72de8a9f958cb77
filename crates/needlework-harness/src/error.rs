//! Errors surfaced by the harness.

use std::path::{Path, PathBuf};

use needlework_pipeline::PipelineError;

/// Errors that abort a harness run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An image could not be decoded or encoded.
    #[error("image error at {}: {source}", .path.display())]
    Image {
        /// Path of the image.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// Compositing or scoring rejected its inputs.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A required input directory holds no images.
    #[error("no input images found in {}", .0.display())]
    NoInputs(PathBuf),

    /// The run was cancelled between trials.
    #[error("run cancelled")]
    Cancelled,
}

impl HarnessError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap an image error with the path it concerns.
    pub fn image(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
