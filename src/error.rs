use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DetectError>;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Debug directory is not empty: {}", .0.display())]
    DebugDirNotEmpty(PathBuf),
    #[error("Failed to save debug image {}: {source}", path.display())]
    DebugImage {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Invalid detector config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Fill level model error: {0}")]
    Model(String),
}
