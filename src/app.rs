use egui::{CentralPanel, Color32, Frame, Key, TopBottomPanel, ViewportCommand};
use egui_media_player::fullscreen::EguiDisplay;
use egui_media_player::{
    AppConfig, FullscreenHost, MediaPlayer, MediaSurface, PlayerView, SimulatedSurface,
};
use std::sync::Arc;

pub struct MediaPlayerApp {
    config: AppConfig,
    host: Arc<FullscreenHost>,
    media: Arc<dyn MediaSurface>,
    /// Set when playback is simulated rather than decoded.
    simulated: Option<Arc<SimulatedSurface>>,
    player: MediaPlayer,
    error_message: Option<String>,
}

impl MediaPlayerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let host = Arc::new(FullscreenHost::new(EguiDisplay::new(cc.egui_ctx.clone())));
        let (media, simulated, error_message) = open_surface(&cc.egui_ctx);
        let player = MediaPlayer::new(config.props());

        let mut app = Self {
            config,
            host,
            media,
            simulated,
            player,
            error_message,
        };
        app.mount();
        app
    }

    fn mount(&mut self) {
        self.player
            .mount(Arc::clone(&self.media), Arc::clone(&self.host));
        if let Some(simulated) = &self.simulated {
            if !self.player.props().src.is_empty() {
                simulated.simulate_loaded_metadata(self.config.simulated_duration);
            }
        }
    }

    /// Replace the player with one bound to `src`.
    fn open(&mut self, src: String) {
        log::info!("opening {}", src);
        self.error_message = None;
        self.player = MediaPlayer::new(self.config.props_for(&src));
        self.mount();
        if open_failed(self.media.as_ref(), self.simulated.is_some()) {
            self.error_message = Some(format!(
                "Could not open {}",
                self.player.props().src
            ));
        }
    }

    #[cfg(feature = "ffmpeg")]
    fn pick_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video", &["mp4", "mkv", "avi", "mov", "webm", "flv", "wmv"])
            .pick_file()
        {
            self.open(path.display().to_string());
        }
    }

    fn show_page(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    #[cfg(feature = "ffmpeg")]
                    if ui.button("Open...").clicked() {
                        ui.close_menu();
                        self.pick_file();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(ViewportCommand::Close);
                    }
                });
            });
        });

        CentralPanel::default().show(ctx, |ui| {
            ui.heading("Video player");
            if let Some(err) = &self.error_message {
                ui.colored_label(Color32::RED, err);
            }
            if self.player.props().src.is_empty() {
                ui.label("No media source. Pass a file on the command line or drop one here.");
            }
            ui.add_space(8.0);
            PlayerView::show(ui, &self.player);
        });
    }
}

impl eframe::App for MediaPlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Platform side first: deliver media notifications and report the
        // window's real fullscreen state.
        self.media.update(ctx);
        self.host
            .confirm(ctx.input(|i| i.viewport().fullscreen.unwrap_or(false)));

        if self.player.view_state().is_fullscreen {
            if ctx.input(|i| i.key_pressed(Key::Escape)) {
                self.player.toggle_fullscreen();
            }
            CentralPanel::default()
                .frame(Frame::none().fill(Color32::BLACK))
                .show(ctx, |ui| {
                    PlayerView::show(ui, &self.player);
                });
        } else {
            self.show_page(ctx);
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open(path.display().to_string());
        }
    }
}

/// A decoding surface only knows the video size once a file opened, even
/// when the container reports no duration.
fn open_failed(media: &dyn MediaSurface, simulated: bool) -> bool {
    !simulated && media.video_size().is_none()
}

type OpenedSurface = (
    Arc<dyn MediaSurface>,
    Option<Arc<SimulatedSurface>>,
    Option<String>,
);

#[cfg(feature = "ffmpeg")]
fn open_surface(ctx: &egui::Context) -> OpenedSurface {
    match egui_media_player::surface::ffmpeg::FfmpegSurface::new(ctx.clone()) {
        Ok(surface) => {
            let media: Arc<dyn MediaSurface> = Arc::new(surface);
            (media, None, None)
        }
        Err(e) => {
            log::error!("falling back to simulated playback: {:#}", e);
            let simulated = Arc::new(SimulatedSurface::new());
            let media: Arc<dyn MediaSurface> = simulated.clone();
            (media, Some(simulated), Some(format!("{:#}", e)))
        }
    }
}

#[cfg(not(feature = "ffmpeg"))]
fn open_surface(_ctx: &egui::Context) -> OpenedSurface {
    log::info!("built without the ffmpeg feature, playback is simulated");
    let simulated = Arc::new(SimulatedSurface::new());
    let media: Arc<dyn MediaSurface> = simulated.clone();
    (media, Some(simulated), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_playback_never_reports_a_failed_open() {
        let media = SimulatedSurface::new();
        assert!(!open_failed(&media, true));
    }

    #[test]
    fn failed_open_follows_video_size_not_duration() {
        let media = SimulatedSurface::new();
        media.set_src("clip.mp4");
        media.simulate_loaded_metadata(12.0);
        assert!(media.video_size().is_none());
        assert!(open_failed(&media, false));
    }
}
