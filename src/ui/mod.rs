pub mod controls;
mod view;

pub use controls::{ControlsView, PlayerControls};
pub use view::PlayerView;
