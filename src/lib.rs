//! A media player widget for egui with custom controls.
//!
//! [`MediaPlayer`] keeps a [`ViewState`] in sync with a platform-owned
//! [`MediaSurface`] and a [`FullscreenHost`]; [`PlayerView`] renders it.

pub mod config;
pub mod events;
pub mod format;
pub mod fullscreen;
pub mod player;
pub mod surface;
pub mod ui;

pub use config::AppConfig;
pub use fullscreen::{FullscreenError, FullscreenHost, PresentationSurface};
pub use player::{MediaPlayer, PlayerProps, ViewState};
pub use surface::{MediaEvent, MediaSurface, SimulatedSurface};
pub use ui::{ControlsView, PlayerControls, PlayerView};
