use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::player::PlayerProps;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "media-player.toml";

#[derive(Debug, Parser)]
#[command(name = "media-player", about = "Play a video with custom controls")]
pub struct Args {
    /// Media file to play. Overrides `src` from the config file.
    pub src: Option<String>,

    /// Preview image shown before playback starts.
    #[arg(long)]
    pub poster: Option<String>,

    /// Path to a TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<f32>,

    #[arg(long)]
    pub height: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub src: String,
    pub poster: Option<String>,
    pub title: String,
    pub width: f32,
    pub height: f32,
    /// Length of the clock-driven stand-in used when no decoder is built in.
    pub simulated_duration: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            poster: None,
            title: "Video Player".to_string(),
            width: 1280.0,
            height: 720.0,
            simulated_duration: 60.0,
        }
    }
}

impl AppConfig {
    /// Read a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Load the config named by `args` and apply its overrides.
    pub fn from_args(args: &Args) -> Result<Self> {
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Ok(Self::load(&path)?.with_overrides(args))
    }

    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(src) = &args.src {
            self.src = src.clone();
        }
        if let Some(poster) = &args.poster {
            self.poster = Some(poster.clone());
        }
        if let Some(width) = args.width {
            self.width = width;
        }
        if let Some(height) = args.height {
            self.height = height;
        }
        self
    }

    pub fn props(&self) -> PlayerProps {
        self.props_for(&self.src)
    }

    /// Props for another source, keeping the configured poster.
    pub fn props_for(&self, src: &str) -> PlayerProps {
        PlayerProps {
            src: src.to_owned(),
            poster: self.poster.as_deref().map(image_uri),
        }
    }
}

/// Image loaders want URIs; bare paths become `file://` URIs.
pub fn image_uri(locator: &str) -> String {
    if locator.contains("://") {
        locator.to_string()
    } else {
        let path = Path::new(locator);
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        format!("file://{}", absolute.display())
    }
}
