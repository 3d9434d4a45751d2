use crate::shared::export_error::ExportError;
use crate::shared::rect_size::RectSize;

/// What the host renderer should draw at.
///
/// While an export is in flight the renderer draws at the export
/// resolution; otherwise it follows the window.
#[derive(Debug, Clone)]
pub struct RenderState {
    window_size: RectSize,
    export_size: RectSize,
    is_exporting: bool,
}

impl RenderState {
    pub fn new(window_size: RectSize) -> Self {
        Self {
            window_size,
            export_size: RectSize::DEFAULT_EXPORT,
            is_exporting: false,
        }
    }

    /// Size the next frame must be rendered at.
    pub fn size(&self) -> RectSize {
        if self.is_exporting {
            self.export_size
        } else {
            self.window_size
        }
    }

    pub fn window_size(&self) -> RectSize {
        self.window_size
    }

    pub fn set_window_size(&mut self, size: RectSize) {
        self.window_size = size;
    }

    pub fn export_size(&self) -> RectSize {
        self.export_size
    }

    /// Zero or oversized dimensions are rejected and leave the export size unchanged.
    pub fn set_export_size(&mut self, width: u32, height: u32) -> Result<(), ExportError> {
        self.export_size = RectSize::new(width, height)?;
        Ok(())
    }

    pub fn is_exporting(&self) -> bool {
        self.is_exporting
    }

    pub fn set_is_exporting(&mut self, is_exporting: bool) {
        self.is_exporting = is_exporting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> RectSize {
        RectSize::new(800, 600).unwrap()
    }

    #[test]
    fn test_follows_window_when_idle() {
        let state = RenderState::new(window());
        assert!(!state.is_exporting());
        assert_eq!(state.size(), window());
        assert_eq!(state.export_size(), RectSize::new(1920, 1080).unwrap());
    }

    #[test]
    fn test_uses_export_size_while_exporting() {
        let mut state = RenderState::new(window());
        state.set_export_size(320, 240).unwrap();
        state.set_is_exporting(true);
        assert_eq!(state.size(), RectSize::new(320, 240).unwrap());
        state.set_is_exporting(false);
        assert_eq!(state.size(), window());
    }

    #[test]
    fn test_zero_export_size_rejected() {
        let mut state = RenderState::new(window());
        assert!(state.set_export_size(0, 240).is_err());
        assert!(state.set_export_size(320, u32::MAX).is_err());
        assert_eq!(state.export_size(), RectSize::new(1920, 1080).unwrap());
    }
}
