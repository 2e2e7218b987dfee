use web_time::{Duration, Instant};

/// Smoothed frames-per-second counter for the toolbar readout.
pub struct FrameTiming {
    /// Timestamp of the previous frame, `None` before the first frame.
    last_frame: Option<Instant>,
    /// Smoothed FPS using exponential moving average
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0)
    smoothing: f32,
}

impl FrameTiming {
    /// Create a counter that starts at 60 FPS.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_frame: None,
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Record a presented frame at `now`.
    pub fn record(&mut self, now: Instant) {
        if let Some(last) = self.last_frame {
            let elapsed: Duration = now.saturating_duration_since(last);
            let frame_time = elapsed.as_secs_f32();
            if frame_time > 0.0 {
                let instant_fps = 1.0 / frame_time;
                self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                    + instant_fps * self.smoothing;
            }
        }
        self.last_frame = Some(now);
    }

    /// Get the current FPS (smoothed)
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
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
    fn first_frame_keeps_initial_estimate() {
        let mut timing = FrameTiming::new();
        timing.record(Instant::now());
        assert_eq!(timing.fps(), 60.0);
    }

    #[test]
    fn slow_frames_pull_estimate_down() {
        let mut timing = FrameTiming::new();
        let start = Instant::now();
        for i in 0..200_u64 {
            timing.record(start + Duration::from_millis(i * 100));
        }
        assert!(timing.fps() < 15.0, "fps = {}", timing.fps());
    }
}
