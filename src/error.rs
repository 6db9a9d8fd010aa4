use std::path::PathBuf;

/// Errors surfaced by the detection library.
#[derive(thiserror::Error, Debug)]
pub enum KaryoscanError {
    /// The input file could not be read or decoded as an image.
    #[error("failed to load image {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Stage images would overwrite existing files.
    #[error("debug directory is not empty: {}", .0.display())]
    DebugDirNotEmpty(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, KaryoscanError>;
