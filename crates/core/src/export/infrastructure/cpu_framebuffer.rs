use crate::export::domain::frame_source::{ensure_size, FrameSource};
use crate::shared::export_error::ExportError;
use crate::shared::frame::Frame;
use crate::shared::rect_size::RectSize;

/// Framebuffer living in main memory. Scenes draw straight into its frame.
pub struct CpuFramebuffer {
    frame: Frame,
}

impl CpuFramebuffer {
    pub fn new(size: RectSize) -> Self {
        Self {
            frame: Frame::filled(size, [0, 0, 0, 255]),
        }
    }

    /// Reallocates to `size`, clearing to opaque black. No-op if unchanged.
    pub fn resize(&mut self, size: RectSize) {
        if self.frame.size() != size {
            self.frame = Frame::filled(size, [0, 0, 0, 255]);
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
}

impl FrameSource for CpuFramebuffer {
    fn size(&self) -> RectSize {
        self.frame.size()
    }

    fn read_pixels(&mut self, size: RectSize) -> Result<Frame, ExportError> {
        ensure_size(size, self.frame.size())?;
        Ok(self.frame.clone())
    }
}
