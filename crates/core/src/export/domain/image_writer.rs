use std::path::Path;

use crate::shared::export_error::ExportError;
use crate::shared::frame::Frame;

/// Encodes a frame to a PNG file.
pub trait ImageWriter: Send {
    /// Writes `frame` to `path`. The parent folder must already exist.
    fn write_png(&self, path: &Path, frame: &Frame) -> Result<(), ExportError>;
}
