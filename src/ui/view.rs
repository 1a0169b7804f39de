use egui::{Color32, Frame, Image, Response, Sense, Ui, Vec2};

use super::controls::PlayerControls;
use crate::player::MediaPlayer;

/// Height reserved for the controls row below the media area.
const CONTROLS_HEIGHT: f32 = 32.0;

/// The presentation container: media area plus controls. This whole region
/// is what fullscreen promotes, so the controls stay available.
pub struct PlayerView;

impl PlayerView {
    pub fn show(ui: &mut Ui, player: &MediaPlayer) -> Response {
        Frame::none()
            .fill(Color32::BLACK)
            .show(ui, |ui| {
                let area = media_area(ui, player.view_state().is_fullscreen);
                let media = show_media(ui, player, area);
                if media.clicked() {
                    player.toggle_play_pause();
                }
                PlayerControls::show(ui, player);
            })
            .response
    }
}

/// Space for the media: all of it in fullscreen, 16:9 of the width otherwise.
fn media_area(ui: &Ui, fullscreen: bool) -> Vec2 {
    let available = ui.available_size();
    if fullscreen {
        Vec2::new(available.x, (available.y - CONTROLS_HEIGHT).max(0.0))
    } else {
        Vec2::new(available.x, available.x * 9.0 / 16.0)
    }
}

fn show_media(ui: &mut Ui, player: &MediaPlayer, area: Vec2) -> Response {
    let frame = player
        .media()
        .and_then(|media| Some((media.texture()?, media.video_size()?)));

    if let Some((texture, (width, height))) = frame {
        let size = fit(Vec2::new(width as f32, height as f32), area);
        return ui
            .allocate_ui(area, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.add(Image::new((texture, size)).sense(Sense::click()))
                })
                .inner
            })
            .inner;
    }

    if let Some(poster) = &player.props().poster {
        return ui.add(
            Image::new(poster.as_str())
                .fit_to_exact_size(area)
                .sense(Sense::click()),
        );
    }

    let (rect, response) = ui.allocate_exact_size(area, Sense::click());
    ui.painter().rect_filled(rect, 0.0, Color32::BLACK);
    response
}

/// Scale `content` to fit `bounds`, keeping its aspect ratio.
fn fit(content: Vec2, bounds: Vec2) -> Vec2 {
    if content.x <= 0.0 || content.y <= 0.0 || bounds.y <= 0.0 {
        return bounds;
    }
    let aspect = content.x / content.y;
    if aspect > bounds.x / bounds.y {
        Vec2::new(bounds.x, bounds.x / aspect)
    } else {
        Vec2::new(bounds.y * aspect, bounds.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_content_fills_the_width() {
        let size = fit(Vec2::new(1920.0, 960.0), Vec2::new(960.0, 540.0));
        assert_eq!(size, Vec2::new(960.0, 480.0));
    }

    #[test]
    fn tall_content_fills_the_height() {
        let size = fit(Vec2::new(1080.0, 1920.0), Vec2::new(960.0, 540.0));
        assert_eq!(size.y, 540.0);
        assert!(size.x < 960.0);
    }

    #[test]
    fn degenerate_content_uses_the_bounds() {
        let bounds = Vec2::new(640.0, 360.0);
        assert_eq!(fit(Vec2::ZERO, bounds), bounds);
    }
}
