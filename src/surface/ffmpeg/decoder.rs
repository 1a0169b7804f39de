use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::{Audio as AudioFrame, Video as VideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::resampling::Context as Resampler;
use ffmpeg_next::software::scaling::{Context as Scaler, Flags};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};
use ffmpeg_next::{codec, Packet, Rational};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::clock::AudioClock;
use super::ring::SampleRing;

/// Audio is always resampled to interleaved stereo f32.
pub const OUTPUT_CHANNELS: u16 = 2;
const FALLBACK_SAMPLE_RATE: u32 = 44_100;
const IDLE_WAIT: Duration = Duration::from_millis(10);
const BACKPRESSURE_WAIT: Duration = Duration::from_millis(1);

/// A frame converted to tightly packed RGBA.
pub struct DecodedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation time in seconds.
    pub pts: f64,
}

pub enum DecoderCommand {
    Seek(f64),
    Pause,
    Resume,
    Stop,
}

pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub sample_rate: u32,
}

/// Read stream parameters without decoding anything.
pub fn probe(path: &Path) -> Result<MediaInfo> {
    let input = ffmpeg_next::format::input(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let video_stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("No video stream found"))?;
    let video = codec::Context::from_parameters(video_stream.parameters())?
        .decoder()
        .video()?;

    let sample_rate = match input.streams().best(Type::Audio) {
        Some(stream) => codec::Context::from_parameters(stream.parameters())?
            .decoder()
            .audio()?
            .rate(),
        None => FALLBACK_SAMPLE_RATE,
    };

    let duration = if input.duration() > 0 {
        input.duration() as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64
    } else {
        0.0
    };

    Ok(MediaInfo {
        width: video.width(),
        height: video.height(),
        duration,
        sample_rate,
    })
}

/// Background thread demuxing and decoding one file. Stopped and joined on drop.
pub struct DecoderThread {
    handle: Option<JoinHandle<()>>,
    commands: Sender<DecoderCommand>,
    stop: Arc<AtomicBool>,
}

impl DecoderThread {
    pub fn spawn(
        path: &Path,
        frames: Sender<DecodedFrame>,
        samples: Arc<SampleRing<f32>>,
        clock: AudioClock,
    ) -> Result<Self> {
        let (commands, command_receiver) = crossbeam_channel::bounded(16);
        let stop = Arc::new(AtomicBool::new(false));
        let path: PathBuf = path.to_path_buf();
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("media-decoder".into())
            .spawn(move || {
                let worker = Worker {
                    frames,
                    samples,
                    commands: command_receiver,
                    clock,
                    stop: thread_stop,
                    paused: true,
                    pending_seek: None,
                };
                if let Err(e) = worker.run(&path) {
                    log::error!("decoder for {} failed: {:#}", path.display(), e);
                }
            })
            .context("Failed to spawn decoder thread")?;

        Ok(Self {
            handle: Some(handle),
            commands,
            stop,
        })
    }

    pub fn send(&self, command: DecoderCommand) {
        if self.commands.send(command).is_err() {
            log::debug!("decoder thread already exited");
        }
    }
}

impl Drop for DecoderThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.commands.send(DecoderCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

struct Worker {
    frames: Sender<DecodedFrame>,
    samples: Arc<SampleRing<f32>>,
    commands: Receiver<DecoderCommand>,
    clock: AudioClock,
    stop: Arc<AtomicBool>,
    paused: bool,
    pending_seek: Option<f64>,
}

impl Worker {
    /// Apply every queued command.
    fn poll_commands(&mut self) -> Flow {
        loop {
            match self.commands.try_recv() {
                Ok(DecoderCommand::Stop) | Err(TryRecvError::Disconnected) => return Flow::Stop,
                Ok(DecoderCommand::Pause) => {
                    self.paused = true;
                    self.clock.stop();
                }
                Ok(DecoderCommand::Resume) => {
                    self.paused = false;
                    self.clock.start();
                }
                Ok(DecoderCommand::Seek(target)) => self.pending_seek = Some(target),
                Err(TryRecvError::Empty) => return Flow::Continue,
            }
        }
    }

    /// Hand a frame to the UI, waiting while the channel is full. Gives up on
    /// the frame if a seek arrives meanwhile.
    fn deliver(&mut self, mut frame: DecodedFrame) -> Flow {
        loop {
            if let Flow::Stop = self.poll_commands() {
                return Flow::Stop;
            }
            if self.pending_seek.is_some() {
                return Flow::Continue;
            }
            match self.frames.try_send(frame) {
                Ok(()) => return Flow::Continue,
                Err(TrySendError::Full(returned)) => {
                    frame = returned;
                    thread::sleep(BACKPRESSURE_WAIT);
                }
                Err(TrySendError::Disconnected(_)) => return Flow::Stop,
            }
        }
    }

    fn run(mut self, path: &Path) -> Result<()> {
        let mut input = ffmpeg_next::format::input(path)?;

        let video_index = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| anyhow!("No video stream"))?
            .index();
        let audio_index = input.streams().best(Type::Audio).map(|s| s.index());

        let (video_time_base, video_params) = {
            let stream = input
                .stream(video_index)
                .ok_or_else(|| anyhow!("Video stream {} disappeared", video_index))?;
            (stream.time_base(), stream.parameters())
        };
        let audio_params = audio_index
            .and_then(|index| input.stream(index))
            .map(|stream| stream.parameters());

        let mut video_decoder = codec::Context::from_parameters(video_params)?
            .decoder()
            .video()?;
        let mut audio_decoder = match audio_params {
            Some(params) => Some(codec::Context::from_parameters(params)?.decoder().audio()?),
            None => None,
        };

        let mut scaler = Scaler::get(
            video_decoder.format(),
            video_decoder.width(),
            video_decoder.height(),
            Pixel::RGBA,
            video_decoder.width(),
            video_decoder.height(),
            Flags::BILINEAR,
        )?;
        let mut resampler = match &audio_decoder {
            Some(decoder) => Some(Resampler::get(
                decoder.format(),
                decoder.channel_layout(),
                decoder.rate(),
                Sample::F32(SampleType::Packed),
                ChannelLayout::STEREO,
                self.clock.sample_rate(),
            )?),
            None => None,
        };

        let mut decoded = VideoFrame::empty();
        let mut rgba = VideoFrame::empty();
        let mut audio = AudioFrame::empty();
        let mut at_eof = false;

        while !self.stop.load(Ordering::Relaxed) {
            if let Flow::Stop = self.poll_commands() {
                return Ok(());
            }

            if let Some(target) = self.pending_seek.take() {
                let ts = (target * ffmpeg_next::ffi::AV_TIME_BASE as f64) as i64;
                if input.seek(ts, ..ts).is_ok() {
                    video_decoder.flush();
                    if let Some(decoder) = audio_decoder.as_mut() {
                        decoder.flush();
                    }
                    self.clock.set_position(target);
                    at_eof = false;
                } else {
                    log::warn!("seek to {:.2}s failed", target);
                }
            }

            if self.paused || at_eof {
                thread::sleep(IDLE_WAIT);
                continue;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut input) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Eof) => {
                    at_eof = true;
                    continue;
                }
                Err(e) => {
                    log::trace!("skipping unreadable packet: {}", e);
                    continue;
                }
            }

            if packet.stream() == video_index {
                video_decoder.send_packet(&packet)?;
                while video_decoder.receive_frame(&mut decoded).is_ok() {
                    scaler.run(&decoded, &mut rgba)?;
                    let frame = DecodedFrame {
                        rgba: packed_rgba(&rgba),
                        width: rgba.width(),
                        height: rgba.height(),
                        pts: seconds(decoded.pts().unwrap_or(0), video_time_base),
                    };
                    if let Flow::Stop = self.deliver(frame) {
                        return Ok(());
                    }
                    if self.pending_seek.is_some() {
                        break;
                    }
                }
            } else if Some(packet.stream()) == audio_index {
                if let (Some(decoder), Some(resampler)) =
                    (audio_decoder.as_mut(), resampler.as_mut())
                {
                    decoder.send_packet(&packet)?;
                    while decoder.receive_frame(&mut audio).is_ok() {
                        let mut stereo = AudioFrame::empty();
                        if resampler.run(&audio, &mut stereo).is_ok() {
                            self.samples.extend(interleaved_samples(&stereo));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base)
}

/// Copy plane 0 of an RGBA frame, dropping per-row padding.
fn packed_rgba(frame: &VideoFrame) -> Vec<u8> {
    let row = frame.width() as usize * 4;
    let height = frame.height() as usize;
    let stride = frame.stride(0);
    let data = frame.data(0);
    if stride == row {
        return data[..row * height].to_vec();
    }
    let mut packed = Vec::with_capacity(row * height);
    for line in data.chunks(stride).take(height) {
        packed.extend_from_slice(&line[..row]);
    }
    packed
}

/// Interleaved f32 samples of a packed stereo frame.
fn interleaved_samples(frame: &AudioFrame) -> impl Iterator<Item = f32> + '_ {
    let data = frame.data(0);
    let len = (frame.samples() * OUTPUT_CHANNELS as usize * 4).min(data.len());
    data[..len]
        .chunks_exact(4)
        .map(|bytes| f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
