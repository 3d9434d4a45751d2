use std::path::PathBuf;

use thiserror::Error;

use crate::shared::rect_size::RectSize;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to create folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write image to {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("framebuffer is {actual} but {expected} was requested")]
    SizeMismatch { expected: RectSize, actual: RectSize },
    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),
    #[error("sequence must end after it begins, got {begin}s to {end}s")]
    InvalidRange { begin: f64, end: f64 },
    #[error("pixel readback failed: {0}")]
    Readback(String),
    #[error("no suitable GPU adapter available")]
    NoAdapter,
    #[error("image writer is no longer accepting frames")]
    WriterClosed,
    #[error("an image sequence export is already running")]
    SequenceInProgress,
}
