/// Drives animation time for the renderer.
///
/// Sequence export takes the clock over: it switches to a fixed timestep so
/// every exported frame is exactly `1 / fps` seconds apart, regardless of how
/// long rendering and encoding take, then hands it back in realtime mode.
pub trait Clock {
    /// Current animation time in seconds.
    fn time(&self) -> f64;

    /// Seconds elapsed during the last `update`.
    fn delta_time(&self) -> f64;

    /// Jumps to `time` seconds.
    fn set_time(&mut self, time: f64);

    /// Advances by exactly `1 / fps` per `update` from now on.
    fn set_fixed_timestep(&mut self, fps: f64);

    /// Advances by measured wall-clock time per `update` from now on.
    fn set_realtime(&mut self);

    fn is_fixed_timestep(&self) -> bool;

    /// Advances time by one rendered frame. Called once per frame, after the
    /// frame was rendered and exported.
    fn update(&mut self);
}
