use std::time::{Duration, Instant};

const DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(400);

/// Movement (in physical pixels, squared) before a press becomes a drag.
const DRAG_THRESHOLD_SQ: f32 = 9.0;

/// Result of releasing the primary button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClickResult {
    /// The press turned into a drag.
    NoAction,
    /// A click with no recent predecessor.
    SingleClick,
    /// Second click within the threshold of the first.
    DoubleClick,
}

/// Tracks cursor position, drag state and click timing.
pub(crate) struct InputState {
    pub(crate) mouse_pos: (f32, f32),
    press_pos: (f32, f32),
    is_dragging: bool,
    last_click: Option<Instant>,
}

impl InputState {
    pub(crate) fn new() -> Self {
        Self {
            mouse_pos: (0.0, 0.0),
            press_pos: (0.0, 0.0),
            is_dragging: false,
            last_click: None,
        }
    }

    /// Record a button press at the current cursor position.
    pub(crate) fn handle_mouse_down(&mut self) {
        self.press_pos = self.mouse_pos;
        self.is_dragging = false;
    }

    /// Update the cursor and return the movement since the last update.
    /// While `pressed`, enough travel from the press point starts a drag.
    pub(crate) fn handle_mouse_position(
        &mut self,
        x: f32,
        y: f32,
        pressed: bool,
    ) -> (f32, f32) {
        let delta = (x - self.mouse_pos.0, y - self.mouse_pos.1);
        self.mouse_pos = (x, y);
        if pressed {
            let (dx, dy) = (x - self.press_pos.0, y - self.press_pos.1);
            if dx * dx + dy * dy > DRAG_THRESHOLD_SQ {
                self.is_dragging = true;
            }
        }
        delta
    }

    /// Classify a release at `now`.
    pub(crate) fn process_mouse_up(&mut self, now: Instant) -> ClickResult {
        if std::mem::take(&mut self.is_dragging) {
            self.last_click = None;
            return ClickResult::NoAction;
        }
        let is_double = self
            .last_click
            .is_some_and(|t| now.duration_since(t) < DOUBLE_CLICK_THRESHOLD);
        if is_double {
            self.last_click = None;
            ClickResult::DoubleClick
        } else {
            self.last_click = Some(now);
            ClickResult::SingleClick
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(state: &mut InputState, at: Instant) -> ClickResult {
        state.handle_mouse_down();
        state.process_mouse_up(at)
    }

    #[test]
    fn two_quick_clicks_make_a_double_click() {
        let mut state = InputState::new();
        let t0 = Instant::now();
        assert_eq!(click(&mut state, t0), ClickResult::SingleClick);
        assert_eq!(
            click(&mut state, t0 + Duration::from_millis(150)),
            ClickResult::DoubleClick
        );
        // A third click starts over.
        assert_eq!(
            click(&mut state, t0 + Duration::from_millis(300)),
            ClickResult::SingleClick
        );
    }

    #[test]
    fn slow_clicks_stay_single() {
        let mut state = InputState::new();
        let t0 = Instant::now();
        let _ = click(&mut state, t0);
        assert_eq!(
            click(&mut state, t0 + Duration::from_millis(600)),
            ClickResult::SingleClick
        );
    }

    #[test]
    fn drags_are_not_clicks() {
        let mut state = InputState::new();
        let t0 = Instant::now();
        let _ = click(&mut state, t0);

        state.handle_mouse_down();
        let delta = state.handle_mouse_position(20.0, 0.0, true);
        assert_eq!(delta, (20.0, 0.0));
        assert_eq!(
            state.process_mouse_up(t0 + Duration::from_millis(100)),
            ClickResult::NoAction
        );
    }
}
