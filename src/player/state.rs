use crate::format::time_label;

/// Render-side projection of the media surface and the fullscreen host.
///
/// Never authoritative: every field is re-derived from the owning surface
/// when it sends a notification.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewState {
    pub is_playing: bool,
    pub is_muted: bool,
    /// Seconds.
    pub current_time: f64,
    /// Seconds, 0 while unknown.
    pub duration: f64,
    pub is_fullscreen: bool,
}

impl ViewState {
    /// Playback progress in percent. 0 while the duration is unknown.
    pub fn progress_percent(&self) -> f64 {
        if self.duration <= 0.0 || !self.duration.is_finite() {
            return 0.0;
        }
        let percent = self.current_time / self.duration * 100.0;
        if percent.is_finite() {
            percent
        } else {
            0.0
        }
    }

    pub fn time_label(&self) -> String {
        time_label(self.current_time, self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let state = ViewState::default();
        assert!(!state.is_playing);
        assert!(!state.is_muted);
        assert!(!state.is_fullscreen);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.duration, 0.0);
        assert_eq!(state.time_label(), "0:00 / 0:00");
    }

    #[test]
    fn progress_is_zero_without_duration() {
        let state = ViewState {
            current_time: 3.0,
            ..ViewState::default()
        };
        assert_eq!(state.progress_percent(), 0.0);
    }

    #[test]
    fn progress_is_proportional() {
        let state = ViewState {
            current_time: 5.0,
            duration: 10.0,
            ..ViewState::default()
        };
        assert_eq!(state.progress_percent(), 50.0);
    }

    #[test]
    fn progress_ignores_unusable_positions() {
        let state = ViewState {
            current_time: f64::NAN,
            duration: 10.0,
            ..ViewState::default()
        };
        assert_eq!(state.progress_percent(), 0.0);
    }
}
