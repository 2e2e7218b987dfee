use std::time::Instant;

/// Longest frame delta handed to the simulation; a stall (window drag,
/// debugger pause) resumes smoothly instead of jumping.
const MAX_FRAME_DELTA: f32 = 0.25;

/// Start/stop state of the per-frame update loop.
///
/// The window system drives redraws; the loop only decides whether a
/// redraw advances the viewer and with what time step.
#[derive(Debug, Default, Clone)]
pub struct RenderLoop {
    running: bool,
    last_tick: Option<Instant>,
}

impl RenderLoop {
    /// A stopped loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking. The first tick after a start has a zero delta.
    pub fn start(&mut self) {
        if !self.running {
            log::debug!("Render loop started");
        }
        self.running = true;
        self.last_tick = None;
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("Render loop stopped");
        }
        self.running = false;
        self.last_tick = None;
    }

    /// Whether the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Record a frame at `now` and return the seconds since the previous
    /// one, or `None` while stopped.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        if !self.running {
            return None;
        }
        let dt = self.last_tick.map_or(0.0, |prev| {
            now.saturating_duration_since(prev)
                .as_secs_f32()
                .min(MAX_FRAME_DELTA)
        });
        self.last_tick = Some(now);
        Some(dt)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn stopped_loop_does_not_tick() {
        let mut rl = RenderLoop::new();
        assert_eq!(rl.tick(Instant::now()), None);
    }

    #[test]
    fn ticks_report_elapsed_time() {
        let mut rl = RenderLoop::new();
        rl.start();
        let t0 = Instant::now();
        assert_eq!(rl.tick(t0), Some(0.0));
        let dt = rl.tick(t0 + Duration::from_millis(16)).unwrap();
        assert_relative_eq!(dt, 0.016, epsilon = 1e-4);
    }

    #[test]
    fn long_stalls_are_capped() {
        let mut rl = RenderLoop::new();
        rl.start();
        let t0 = Instant::now();
        let _ = rl.tick(t0);
        assert_eq!(rl.tick(t0 + Duration::from_secs(3)), Some(MAX_FRAME_DELTA));
    }

    #[test]
    fn stop_then_start_resets_delta() {
        let mut rl = RenderLoop::new();
        rl.start();
        let t0 = Instant::now();
        let _ = rl.tick(t0);
        rl.stop();
        assert!(!rl.is_running());
        assert_eq!(rl.tick(t0 + Duration::from_millis(50)), None);
        rl.start();
        assert_eq!(rl.tick(t0 + Duration::from_millis(100)), Some(0.0));
    }
}
