mod app;

use anyhow::{anyhow, Result};
use app::MediaPlayerApp;
use clap::Parser;
use eframe::NativeOptions;
use egui_media_player::config::{AppConfig, Args};
use env_logger::Builder;
use log::LevelFilter;

fn init_logger() {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("egui_media_player", LevelFilter::Debug)
        .filter_module("media_player", LevelFilter::Debug)
        .init();
}

fn main() -> Result<()> {
    init_logger();

    let args = Args::parse();
    let config = AppConfig::from_args(&args)?;
    log::debug!("starting with {:?}", config);

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.clone())
            .with_inner_size([config.width, config.height])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    let title = config.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(MediaPlayerApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("{}", e))
}
