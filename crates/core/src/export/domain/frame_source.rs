use crate::shared::export_error::ExportError;
use crate::shared::frame::Frame;
use crate::shared::rect_size::RectSize;

/// A framebuffer pixels can be copied out of.
pub trait FrameSource {
    /// Current dimensions of the framebuffer.
    fn size(&self) -> RectSize;

    /// Copies `size` pixels out of the framebuffer as top-row-first RGBA8.
    ///
    /// Fails with [`ExportError::SizeMismatch`] when the framebuffer was not
    /// rendered at `size`.
    fn read_pixels(&mut self, size: RectSize) -> Result<Frame, ExportError>;
}

/// Shared check for implementations that can only read back their full extent.
pub fn ensure_size(expected: RectSize, actual: RectSize) -> Result<(), ExportError> {
    if expected != actual {
        return Err(ExportError::SizeMismatch { expected, actual });
    }
    Ok(())
}
