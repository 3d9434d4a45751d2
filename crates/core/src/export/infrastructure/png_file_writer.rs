use std::path::Path;

use crate::export::domain::image_writer::ImageWriter;
use crate::shared::export_error::ExportError;
use crate::shared::frame::Frame;

/// Encodes frames as RGBA PNG files using the `image` crate.
pub struct PngFileWriter;

impl PngFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PngFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for PngFileWriter {
    fn write_png(&self, path: &Path, frame: &Frame) -> Result<(), ExportError> {
        image::save_buffer_with_format(
            path,
            frame.data(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|source| ExportError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Wrote {} ({})", path.display(), frame.size());
        Ok(())
    }
}
