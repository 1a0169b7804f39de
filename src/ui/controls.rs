use egui::{pos2, vec2, Rect, Slider, Ui};

use crate::player::{MediaPlayer, ViewState};

/// Seek bar granularity in seconds.
pub const SEEK_STEP: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
}

impl PlayIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            PlayIcon::Play => "▶",
            PlayIcon::Pause => "⏸",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            PlayIcon::Play => "Play",
            PlayIcon::Pause => "Pause",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuteIcon {
    Unmuted,
    Muted,
}

impl MuteIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            MuteIcon::Unmuted => "🔊",
            MuteIcon::Muted => "🔇",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            MuteIcon::Unmuted => "Mute",
            MuteIcon::Muted => "Unmute",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FullscreenIcon {
    Enter,
    Exit,
}

impl FullscreenIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            FullscreenIcon::Enter => "⛶",
            FullscreenIcon::Exit => "🗗",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            FullscreenIcon::Enter => "Fullscreen",
            FullscreenIcon::Exit => "Exit fullscreen (Esc)",
        }
    }
}

/// Bounds and value of the seek bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeekRange {
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub step: f64,
}

/// Everything the controls row shows, derived from a [`ViewState`].
#[derive(Clone, Debug, PartialEq)]
pub struct ControlsView {
    pub play_icon: PlayIcon,
    pub seek: SeekRange,
    /// Filled share of the seek bar, in percent.
    pub progress: f64,
    pub time_label: String,
    pub mute_icon: MuteIcon,
    pub fullscreen_icon: FullscreenIcon,
}

impl From<&ViewState> for ControlsView {
    fn from(state: &ViewState) -> Self {
        Self {
            play_icon: if state.is_playing {
                PlayIcon::Pause
            } else {
                PlayIcon::Play
            },
            seek: SeekRange {
                min: 0.0,
                max: state.duration,
                value: state.current_time,
                step: SEEK_STEP,
            },
            progress: state.progress_percent(),
            time_label: state.time_label(),
            mute_icon: if state.is_muted {
                MuteIcon::Muted
            } else {
                MuteIcon::Unmuted
            },
            fullscreen_icon: if state.is_fullscreen {
                FullscreenIcon::Exit
            } else {
                FullscreenIcon::Enter
            },
        }
    }
}

pub struct PlayerControls;

impl PlayerControls {
    pub fn show(ui: &mut Ui, player: &MediaPlayer) {
        let view = ControlsView::from(&player.view_state());

        ui.horizontal(|ui| {
            if ui
                .button(view.play_icon.glyph())
                .on_hover_text(view.play_icon.hint())
                .clicked()
            {
                player.toggle_play_pause();
            }

            let mut position = view.seek.value;
            let slider = ui.add(
                Slider::new(&mut position, view.seek.min..=view.seek.max)
                    .step_by(view.seek.step)
                    .show_value(false),
            );
            paint_progress(ui, slider.rect, view.progress);
            if slider.changed() {
                player.seek(position);
            }

            ui.label(&view.time_label);

            if ui
                .button(view.mute_icon.glyph())
                .on_hover_text(view.mute_icon.hint())
                .clicked()
            {
                player.toggle_mute();
            }

            if ui
                .button(view.fullscreen_icon.glyph())
                .on_hover_text(view.fullscreen_icon.hint())
                .clicked()
            {
                player.toggle_fullscreen();
            }
        });
    }
}

/// Fill the seek rail from its start up to `percent`.
fn paint_progress(ui: &Ui, slider_rect: Rect, percent: f64) {
    let fraction = (percent / 100.0).clamp(0.0, 1.0) as f32;
    if fraction <= 0.0 {
        return;
    }
    // The rail is inset by the handle radius on both sides.
    let inset = slider_rect.height() / 2.5;
    let rail = Rect::from_center_size(
        slider_rect.center(),
        vec2((slider_rect.width() - 2.0 * inset).max(0.0), 4.0),
    );
    let filled = Rect::from_min_max(
        rail.min,
        pos2(rail.min.x + rail.width() * fraction, rail.max.y),
    );
    ui.painter()
        .rect_filled(filled, 2.0, ui.visuals().selection.bg_fill);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_state_shows_play_and_zero_label() {
        let view = ControlsView::from(&ViewState::default());
        assert_eq!(view.play_icon, PlayIcon::Play);
        assert_eq!(view.mute_icon, MuteIcon::Unmuted);
        assert_eq!(view.fullscreen_icon, FullscreenIcon::Enter);
        assert_eq!(view.time_label, "0:00 / 0:00");
        assert_eq!(view.progress, 0.0);
    }

    #[test]
    fn seek_range_follows_duration_and_position() {
        let state = ViewState {
            current_time: 2.5,
            duration: 125.0,
            ..ViewState::default()
        };
        let view = ControlsView::from(&state);
        assert_eq!(
            view.seek,
            SeekRange {
                min: 0.0,
                max: 125.0,
                value: 2.5,
                step: 0.1,
            }
        );
        assert_eq!(view.progress, 2.0);
        assert_eq!(view.time_label, "0:02 / 2:05");
    }

    #[test]
    fn icons_reflect_flags() {
        let state = ViewState {
            is_playing: true,
            is_muted: true,
            is_fullscreen: true,
            ..ViewState::default()
        };
        let view = ControlsView::from(&state);
        assert_eq!(view.play_icon, PlayIcon::Pause);
        assert_eq!(view.mute_icon, MuteIcon::Muted);
        assert_eq!(view.fullscreen_icon, FullscreenIcon::Exit);
    }
}
