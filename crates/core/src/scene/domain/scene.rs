use crate::shared::frame::Frame;

/// Something the host renderer draws every frame.
pub trait Scene {
    /// Draws the scene at `time` seconds, filling all of `target`.
    fn render(&self, time: f64, target: &mut Frame);
}
