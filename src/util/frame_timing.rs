use web_time::{Duration, Instant};

/// Smoothing factor of the FPS moving average (weight of the newest frame).
const SMOOTHING: f32 = 0.05;

/// Frame counter with an exponentially smoothed frame rate.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    last_frame: Instant,
    smoothed_fps: f32,
    frames: u64,
}

impl FrameTiming {
    /// Start timing from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            smoothed_fps: 60.0,
            frames: 0,
        }
    }

    /// Record a presented frame.
    pub fn end_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.record(elapsed);
    }

    /// Fold one frame of the given duration into the average. Zero-length
    /// frames are counted but do not move the average.
    pub fn record(&mut self, elapsed: Duration) {
        self.frames += 1;
        let frame_time = elapsed.as_secs_f32();
        if frame_time > 0.0 {
            self.smoothed_fps = self.smoothed_fps * (1.0 - SMOOTHING)
                + frame_time.recip() * SMOOTHING;
        }
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    /// Frames recorded so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_toward_steady_rate() {
        let mut timing = FrameTiming::new();
        for _ in 0..400 {
            timing.record(Duration::from_millis(25));
        }
        assert!((timing.fps() - 40.0).abs() < 0.1);
        assert_eq!(timing.frames(), 400);
    }

    #[test]
    fn zero_length_frame_keeps_average() {
        let mut timing = FrameTiming::new();
        let before = timing.fps();
        timing.record(Duration::ZERO);
        assert_eq!(timing.fps(), before);
        assert_eq!(timing.frames(), 1);
    }
}
