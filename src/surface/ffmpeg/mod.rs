//! FFmpeg + rodio backed [`MediaSurface`].
//!
//! Audio is the master clock: the decoder thread fills a sample ring that a
//! rodio sink drains, and video frames are shown when the clock reaches them.

mod audio;
mod clock;
mod decoder;
mod ring;
mod video;

use anyhow::{Context as _, Result};
use crossbeam_channel::bounded;
use egui::{Color32, ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use parking_lot::Mutex;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::path::Path;

use super::{deliver_pending, MediaEvent, MediaListener, MediaSurface};
use crate::events::{ListenerId, ListenerRegistry};
use audio::RingSource;
use clock::AudioClock;
use decoder::{probe, DecodedFrame, DecoderCommand, DecoderThread, OUTPUT_CHANNELS};
use ring::SampleRing;
use video::FrameQueue;

const FRAME_QUEUE_LEN: usize = 30;
/// Slack at the end of the stream before playback counts as finished.
const END_SLACK: f64 = 0.1;

/// Everything needed to play one opened file.
struct Pipeline {
    width: u32,
    height: u32,
    duration: f64,
    playing: bool,
    /// Target of a seek whose first frame has not arrived yet.
    seek_target: Option<f64>,

    // Dropped first so the decoder stops before the audio device goes away.
    decoder: DecoderThread,
    frames: FrameQueue,
    clock: AudioClock,
    sink: Sink,
    _stream_handle: OutputStreamHandle,
    _output_stream: OutputStream,
}

/// Result of one [`Pipeline::tick`].
enum Tick {
    Idle,
    Frame(DecodedFrame),
    Ended,
}

impl Pipeline {
    fn open(path: &Path, volume: f32) -> Result<Self> {
        let info = probe(path)?;
        let clock = AudioClock::new(info.sample_rate, OUTPUT_CHANNELS);

        let (output_stream, stream_handle) =
            OutputStream::try_default().context("No audio output device")?;
        let sink = Sink::try_new(&stream_handle)?;
        sink.set_volume(volume);

        // About a second of audio.
        let samples = SampleRing::new(info.sample_rate as usize * OUTPUT_CHANNELS as usize * 2);
        sink.append(RingSource::new(samples.clone(), clock.clone()));
        sink.pause();

        let (frame_sender, frame_receiver) = bounded(FRAME_QUEUE_LEN);
        let decoder = DecoderThread::spawn(path, frame_sender, samples, clock.clone())?;

        let mut pipeline = Self {
            width: info.width,
            height: info.height,
            duration: info.duration,
            playing: false,
            seek_target: None,
            decoder,
            frames: FrameQueue::new(frame_receiver, FRAME_QUEUE_LEN),
            clock,
            sink,
            _stream_handle: stream_handle,
            _output_stream: output_stream,
        };
        // Decode up to the first frame so there is something to show.
        pipeline.decoder.send(DecoderCommand::Resume);
        pipeline.seek(0.0);
        Ok(pipeline)
    }

    fn play(&mut self) {
        if self.playing {
            return;
        }
        if self.duration > 0.0 && self.clock.position() >= self.duration - END_SLACK {
            self.seek(0.0);
        }
        self.playing = true;
        if self.seek_target.is_none() {
            self.sink.play();
        }
        self.decoder.send(DecoderCommand::Resume);
    }

    fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.sink.pause();
        self.decoder.send(DecoderCommand::Pause);
    }

    fn seek(&mut self, position: f64) {
        let position = position.clamp(0.0, self.duration.max(0.0));
        self.seek_target = Some(position);
        // Hold the audio clock still until the first frame arrives.
        self.sink.pause();
        self.frames.clear();
        self.clock.set_position(position);
        self.decoder.send(DecoderCommand::Seek(position));
    }

    fn position(&self) -> f64 {
        self.seek_target.unwrap_or_else(|| self.clock.position())
    }

    fn tick(&mut self) -> Tick {
        if let Some(target) = self.seek_target {
            let Some(frame) = self.frames.first_after_seek(target) else {
                return Tick::Idle;
            };
            self.clock.set_position(frame.pts);
            self.seek_target = None;
            if self.playing {
                self.sink.play();
            } else {
                self.decoder.send(DecoderCommand::Pause);
            }
            return Tick::Frame(frame);
        }

        if !self.playing {
            return Tick::Idle;
        }

        let now = self.clock.position();
        if let Some(frame) = self.frames.due(now) {
            return Tick::Frame(frame);
        }
        if self.frames.is_drained() && now >= self.duration - END_SLACK {
            self.playing = false;
            self.sink.pause();
            return Tick::Ended;
        }
        Tick::Idle
    }
}

struct Element {
    src: String,
    paused: bool,
    muted: bool,
    volume: f32,
    pipeline: Option<Pipeline>,
    texture: Option<TextureHandle>,
    /// False until playback starts or a seek happens; the poster shows meanwhile.
    show_frames: bool,
}

impl Element {
    fn output_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }
}

/// Media surface playing local files through FFmpeg.
///
/// Opening happens in [`set_src`](MediaSurface::set_src). A file that fails
/// to open is logged and leaves the surface without duration or frames.
pub struct FfmpegSurface {
    ctx: Context,
    element: Mutex<Element>,
    listeners: ListenerRegistry<MediaEvent, MediaListener>,
}

impl FfmpegSurface {
    pub fn new(ctx: Context) -> Result<Self> {
        ffmpeg_next::init().context("Failed to initialize FFmpeg")?;
        Ok(Self {
            ctx,
            element: Mutex::new(Element {
                src: String::new(),
                paused: true,
                muted: false,
                volume: 1.0,
                pipeline: None,
                texture: None,
                show_frames: false,
            }),
            listeners: ListenerRegistry::new(),
        })
    }
}

impl MediaSurface for FfmpegSurface {
    fn set_src(&self, src: &str) {
        let mut element = self.element.lock();
        element.pipeline = None;
        element.texture = None;
        element.show_frames = false;
        element.paused = true;
        element.src = src.to_owned();
        if src.is_empty() {
            return;
        }

        match Pipeline::open(Path::new(src), element.output_volume()) {
            Ok(pipeline) => {
                element.texture = Some(self.ctx.load_texture(
                    "media_frame",
                    ColorImage::new(
                        [pipeline.width as usize, pipeline.height as usize],
                        Color32::BLACK,
                    ),
                    TextureOptions::LINEAR,
                ));
                log::debug!(
                    "opened {} ({}x{}, {:.1}s)",
                    src,
                    pipeline.width,
                    pipeline.height,
                    pipeline.duration
                );
                element.pipeline = Some(pipeline);
                self.listeners.queue(MediaEvent::LoadedMetadata);
            }
            Err(e) => log::warn!("failed to open {}: {:#}", src, e),
        }
    }

    fn src(&self) -> String {
        self.element.lock().src.clone()
    }

    fn play(&self) {
        let mut element = self.element.lock();
        if !element.paused {
            return;
        }
        element.paused = false;
        element.show_frames = true;
        if let Some(pipeline) = element.pipeline.as_mut() {
            pipeline.play();
        }
        self.listeners.queue(MediaEvent::Play);
    }

    fn pause(&self) {
        let mut element = self.element.lock();
        if element.paused {
            return;
        }
        element.paused = true;
        if let Some(pipeline) = element.pipeline.as_mut() {
            pipeline.pause();
        }
        self.listeners.queue(MediaEvent::Pause);
    }

    fn paused(&self) -> bool {
        self.element.lock().paused
    }

    fn muted(&self) -> bool {
        self.element.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        let mut element = self.element.lock();
        if element.muted == muted {
            return;
        }
        element.muted = muted;
        let volume = element.output_volume();
        if let Some(pipeline) = element.pipeline.as_ref() {
            pipeline.sink.set_volume(volume);
        }
        self.listeners.queue(MediaEvent::VolumeChange);
    }

    fn volume(&self) -> f32 {
        self.element.lock().volume
    }

    fn current_time(&self) -> f64 {
        self.element
            .lock()
            .pipeline
            .as_ref()
            .map_or(0.0, Pipeline::position)
    }

    fn set_current_time(&self, seconds: f64) {
        let mut element = self.element.lock();
        element.show_frames = true;
        if let Some(pipeline) = element.pipeline.as_mut() {
            pipeline.seek(if seconds.is_finite() { seconds } else { 0.0 });
            self.listeners.queue(MediaEvent::TimeUpdate);
        }
    }

    fn duration(&self) -> f64 {
        self.element
            .lock()
            .pipeline
            .as_ref()
            .map_or(0.0, |pipeline| pipeline.duration)
    }

    fn add_listener(&self, event: MediaEvent, listener: MediaListener) -> ListenerId {
        self.listeners.add(event, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn update(&self, ctx: &Context) {
        let busy = {
            let mut element = self.element.lock();
            let Element {
                pipeline,
                texture,
                paused,
                ..
            } = &mut *element;
            match pipeline.as_mut() {
                Some(pipeline) => {
                    match pipeline.tick() {
                        Tick::Frame(frame) => {
                            if let Some(texture) = texture.as_mut() {
                                texture.set(
                                    ColorImage::from_rgba_unmultiplied(
                                        [frame.width as usize, frame.height as usize],
                                        &frame.rgba,
                                    ),
                                    TextureOptions::LINEAR,
                                );
                            }
                            self.listeners.queue(MediaEvent::TimeUpdate);
                        }
                        Tick::Ended => {
                            *paused = true;
                            self.listeners.queue(MediaEvent::TimeUpdate);
                            self.listeners.queue(MediaEvent::Pause);
                        }
                        Tick::Idle => {}
                    }
                    pipeline.playing || pipeline.seek_target.is_some()
                }
                None => false,
            }
        };

        deliver_pending(self, &self.listeners);
        if busy {
            ctx.request_repaint();
        }
    }

    fn texture(&self) -> Option<TextureId> {
        let element = self.element.lock();
        if !element.show_frames {
            return None;
        }
        element.texture.as_ref().map(TextureHandle::id)
    }

    fn video_size(&self) -> Option<(u32, u32)> {
        self.element
            .lock()
            .pipeline
            .as_ref()
            .map(|pipeline| (pipeline.width, pipeline.height))
    }
}
