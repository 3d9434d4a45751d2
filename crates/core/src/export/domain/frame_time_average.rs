use std::time::Duration;

/// Running mean of the wall-clock time spent per exported frame.
#[derive(Debug, Clone, Default)]
pub struct FrameTimeAverager {
    sum_s: f64,
    count: usize,
}

impl FrameTimeAverager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame_time: Duration) {
        self.sum_s += frame_time.as_secs_f64();
        self.count += 1;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Mean frame time in seconds, zero before the first sample.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_s / self.count as f64
        }
    }

    pub fn sample_count(&self) -> usize {
        self.count
    }
}
