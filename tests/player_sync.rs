use egui_media_player::fullscreen::HeadlessDisplay;
use egui_media_player::surface::MediaEvent;
use egui_media_player::ui::controls::{FullscreenIcon, MuteIcon, PlayIcon};
use egui_media_player::{
    ControlsView, FullscreenHost, MediaPlayer, MediaSurface, PlayerProps, SimulatedSurface,
    ViewState,
};
use std::sync::Arc;

struct Rig {
    player: MediaPlayer,
    media: Arc<SimulatedSurface>,
    host: Arc<FullscreenHost>,
}

fn rig_with_host(host: Arc<FullscreenHost>) -> Rig {
    let media = Arc::new(SimulatedSurface::new());
    let mut player = MediaPlayer::new(PlayerProps::new("movie.mp4").with_poster("poster.jpg"));
    player.mount(media.clone(), host.clone());
    Rig {
        player,
        media,
        host,
    }
}

fn rig() -> Rig {
    rig_with_host(Arc::new(FullscreenHost::headless()))
}

fn controls(player: &MediaPlayer) -> ControlsView {
    ControlsView::from(&player.view_state())
}

#[test]
fn end_to_end_playback_updates_the_controls() {
    let rig = rig();
    assert_eq!(rig.media.src(), "movie.mp4");
    assert_eq!(rig.player.props().poster.as_deref(), Some("poster.jpg"));

    let view = controls(&rig.player);
    assert_eq!(view.play_icon, PlayIcon::Play);
    assert_eq!(view.time_label, "0:00 / 0:00");
    assert_eq!(view.mute_icon, MuteIcon::Unmuted);
    assert_eq!(view.fullscreen_icon, FullscreenIcon::Enter);

    rig.media.simulate_loaded_metadata(10.0);
    assert_eq!(controls(&rig.player).time_label, "0:00 / 0:10");

    rig.media.play();
    rig.media.flush();
    assert_eq!(controls(&rig.player).play_icon, PlayIcon::Pause);

    rig.media.simulate_time_update(5.0);
    let view = controls(&rig.player);
    assert_eq!(view.time_label, "0:05 / 0:10");
    assert_eq!(view.progress, 50.0);
}

#[test]
fn seek_then_time_update_formats_label() {
    let rig = rig();
    rig.media.simulate_loaded_metadata(125.0);

    for position in [0.0, 0.5, 59.9, 60.0, 61.0, 124.9, 125.0] {
        rig.player.seek(position);
        rig.media.simulate_time_update(position);
        let expected = format!(
            "{} / 2:05",
            egui_media_player::format::format_time(position)
        );
        assert_eq!(rig.player.view_state().time_label(), expected);
    }

    rig.player.seek(65.0);
    rig.media.simulate_time_update(65.0);
    assert_eq!(rig.player.view_state().time_label(), "1:05 / 2:05");
}

#[test]
fn seek_mirrors_position_immediately() {
    let rig = rig();
    rig.media.simulate_loaded_metadata(30.0);

    rig.player.seek(12.3);
    assert_eq!(rig.player.view_state().current_time, 12.3);
    assert_eq!(rig.media.current_time(), 12.3);
}

#[test]
fn double_toggle_without_notification_restores_play_flag() {
    let rig = rig();
    rig.media.simulate_loaded_metadata(10.0);
    let before = rig.player.view_state().is_playing;

    rig.player.toggle_play_pause();
    assert_ne!(rig.player.view_state().is_playing, before);
    rig.player.toggle_play_pause();
    assert_eq!(rig.player.view_state().is_playing, before);

    // Late notifications agree with the optimistic value.
    rig.media.flush();
    assert_eq!(rig.player.view_state().is_playing, before);
}

#[test]
fn playing_to_the_end_is_reported_by_the_surface() {
    let rig = rig();
    rig.media.simulate_loaded_metadata(3.0);
    rig.player.toggle_play_pause();

    rig.media.advance(1.0);
    assert!(rig.player.view_state().is_playing);
    rig.media.advance(5.0);

    let state = rig.player.view_state();
    assert!(!state.is_playing);
    assert_eq!(state.current_time, 3.0);
    assert_eq!(state.progress_percent(), 100.0);
}

#[test]
fn zero_duration_means_zero_progress() {
    let rig = rig();
    rig.media.simulate_time_update(4.0);

    let state = rig.player.view_state();
    assert_eq!(state.duration, 0.0);
    assert_eq!(state.progress_percent(), 0.0);
    assert!(state.progress_percent().is_finite());
}

#[test]
fn silent_volume_counts_as_muted() {
    let rig = rig();
    rig.media.simulate_volume(0.0);
    assert!(!rig.media.muted());
    assert!(rig.player.view_state().is_muted);
    assert_eq!(controls(&rig.player).mute_icon, MuteIcon::Muted);

    rig.media.simulate_volume(0.4);
    assert!(!rig.player.view_state().is_muted);
}

#[test]
fn toggle_mute_flips_the_surface() {
    let rig = rig();
    rig.player.toggle_mute();
    assert!(rig.media.muted());
    assert!(rig.player.view_state().is_muted);

    rig.player.toggle_mute();
    assert!(!rig.media.muted());
    assert!(!rig.player.view_state().is_muted);
}

#[test]
fn fullscreen_is_reported_only_for_the_promoted_player() {
    let host = Arc::new(FullscreenHost::headless());
    let first = rig_with_host(host.clone());
    let second = rig_with_host(host.clone());

    first.player.toggle_fullscreen();
    assert!(!first.player.view_state().is_fullscreen);

    host.confirm(true);
    assert!(first.player.view_state().is_fullscreen);
    assert!(!second.player.view_state().is_fullscreen);
    assert_eq!(host.fullscreen_element(), Some(first.player.presentation().id()));

    first.player.toggle_fullscreen();
    host.confirm(false);
    assert!(!first.player.view_state().is_fullscreen);
    assert!(!second.player.view_state().is_fullscreen);
}

#[test]
fn rejected_fullscreen_request_leaves_state_alone() {
    let host = Arc::new(FullscreenHost::new(HeadlessDisplay::rejecting()));
    let rig = rig_with_host(host);

    rig.player.toggle_fullscreen();
    rig.host.confirm(false);

    assert!(!rig.player.view_state().is_fullscreen);
    assert_eq!(controls(&rig.player).fullscreen_icon, FullscreenIcon::Enter);
}

#[test]
fn fullscreen_request_never_confirmed_stays_windowed() {
    let rig = rig();
    rig.player.toggle_fullscreen();
    rig.host.confirm(false);
    assert!(!rig.player.view_state().is_fullscreen);
}

#[test]
fn unmount_releases_every_listener() {
    let mut rig = rig();
    assert_eq!(rig.media.listener_count(), 5);
    assert_eq!(rig.host.listener_count(), 1);

    rig.player.unmount();

    assert!(!rig.player.is_mounted());
    assert_eq!(rig.media.listener_count(), 0);
    assert_eq!(rig.host.listener_count(), 0);
}

#[test]
fn stale_notifications_after_unmount_change_nothing() {
    let mut rig = rig();
    rig.media.simulate_loaded_metadata(10.0);
    let stale_media: Vec<_> = [
        MediaEvent::TimeUpdate,
        MediaEvent::LoadedMetadata,
        MediaEvent::Play,
        MediaEvent::Pause,
        MediaEvent::VolumeChange,
    ]
    .into_iter()
    .flat_map(|event| rig.media.listeners(event))
    .collect();
    let stale_fullscreen = rig.host.listeners();
    assert_eq!(stale_media.len(), 5);

    rig.player.unmount();
    let before = rig.player.view_state();

    rig.media.simulate_loaded_metadata(99.0);
    rig.media.simulate_time_update(42.0);
    rig.media.simulate_volume(0.0);
    rig.media.play();
    rig.media.flush();
    rig.host.request_fullscreen(rig.player.presentation().id()).unwrap();
    rig.host.confirm(true);

    for listener in &stale_media {
        listener(&*rig.media as &dyn MediaSurface);
    }
    for listener in &stale_fullscreen {
        listener(&*rig.host);
    }

    assert_eq!(rig.player.view_state(), before);
}

#[test]
fn commands_after_unmount_are_ignored() {
    let mut rig = rig();
    rig.media.simulate_loaded_metadata(10.0);
    rig.player.unmount();

    rig.player.toggle_play_pause();
    rig.player.toggle_mute();
    rig.player.seek(4.0);

    assert!(rig.media.paused());
    assert!(!rig.media.muted());
    assert_eq!(rig.media.current_time(), 0.0);
}

#[test]
fn new_player_on_a_muted_surface_reports_muted() {
    let host = Arc::new(FullscreenHost::headless());
    let media = Arc::new(SimulatedSurface::new());

    let mut first = MediaPlayer::new(PlayerProps::new("first.mp4"));
    first.mount(media.clone(), host.clone());
    first.toggle_mute();
    assert!(media.muted());
    drop(first);

    let mut second = MediaPlayer::new(PlayerProps::new("second.mp4"));
    second.mount(media.clone(), host.clone());
    media.simulate_loaded_metadata(10.0);
    assert!(second.view_state().is_muted);
    assert_eq!(controls(&second).mute_icon, MuteIcon::Muted);

    second.toggle_mute();
    assert!(!media.muted());
    assert_eq!(second.view_state().is_muted, media.muted());
    assert_eq!(controls(&second).mute_icon, MuteIcon::Unmuted);
}

#[test]
fn new_player_on_a_silent_surface_reports_muted() {
    let host = Arc::new(FullscreenHost::headless());
    let media = Arc::new(SimulatedSurface::new());
    media.simulate_volume(0.0);

    let mut player = MediaPlayer::new(PlayerProps::new("clip.mp4"));
    player.mount(media.clone(), host);
    assert!(!media.muted());
    assert!(player.view_state().is_muted);
}

#[test]
fn remounting_on_a_new_surface_leaves_the_old_one_clean() {
    let mut rig = rig();
    let replacement = Arc::new(SimulatedSurface::new());

    rig.player.mount(replacement.clone(), rig.host.clone());
    assert_eq!(rig.media.listener_count(), 0);
    assert_eq!(replacement.listener_count(), 5);
    assert_eq!(rig.host.listener_count(), 1);

    rig.media.simulate_loaded_metadata(50.0);
    assert_eq!(rig.player.view_state(), ViewState::default());

    replacement.simulate_loaded_metadata(20.0);
    assert_eq!(rig.player.view_state().duration, 20.0);
}
