use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use ffmpeg_next::codec::{self, decoder};
use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::{Audio as AudioFrame, Video as VideoFrame};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::resampling::Context as ResamplerContext;
use ffmpeg_next::software::scaling::{Context as ScalerContext, Flags};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};
use ffmpeg_next::{Packet, Rational};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::clock::PlaybackClock;
use super::ring::SampleRing;
use super::video::DecodedFrame;

/// Audio is always resampled to packed f32 stereo.
pub const OUTPUT_CHANNELS: u16 = 2;
/// Used for the silent clock when a file has no audio stream.
const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Decoded data this far before a seek target is thrown away (seconds).
const SEEK_TOLERANCE: f64 = 0.05;
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Commands sent to the decoder thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecoderCommand {
    /// Seek to a position in seconds. Frames decoded afterwards carry
    /// `generation`.
    Seek { position: f64, generation: u64 },
    Pause,
    Resume,
    Stop,
}

/// What the player needs to know before decoding starts.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    /// Seconds, 0.0 when the container does not say
    pub duration: f64,
    pub sample_rate: u32,
    pub has_audio: bool,
}

impl MediaInfo {
    /// Open the container and read stream parameters without decoding.
    pub fn probe(path: &Path) -> Result<Self> {
        let input = ffmpeg_next::format::input(path).context("Failed to open input file")?;

        let video_stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| anyhow!("No video stream found"))?;
        let video = codec::Context::from_parameters(video_stream.parameters())?
            .decoder()
            .video()
            .context("Unsupported video codec")?;

        let sample_rate = match input.streams().best(Type::Audio) {
            Some(stream) => {
                let audio = codec::Context::from_parameters(stream.parameters())?
                    .decoder()
                    .audio()
                    .context("Unsupported audio codec")?;
                Some(audio.rate())
            }
            None => None,
        };

        let duration = if input.duration() > 0 {
            input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        Ok(MediaInfo {
            width: video.width(),
            height: video.height(),
            duration,
            sample_rate: sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            has_audio: sample_rate.is_some(),
        })
    }
}

/// Shared between the session and its decoder thread.
pub struct DecoderLink {
    pub frames: Sender<DecodedFrame>,
    pub audio: Arc<SampleRing<f32>>,
    pub commands: Receiver<DecoderCommand>,
    pub clock: PlaybackClock,
    pub stop_flag: Arc<AtomicBool>,
    /// Set while the demuxer sits at end of file.
    pub eof: Arc<AtomicBool>,
    /// Set when the decoder thread has returned, for whatever reason.
    pub exited: Arc<AtomicBool>,
}

pub fn spawn_decoder(path: &Path, link: DecoderLink) -> Result<JoinHandle<()>> {
    let path = path.to_path_buf();
    thread::Builder::new()
        .name("agudie-decoder".into())
        .spawn(move || {
            let exited = link.exited.clone();
            if let Err(e) = decode_loop(&path, link) {
                log::error!("Decoder error for {}: {:#}", path.display(), e);
            }
            exited.store(true, Ordering::Release);
            log::debug!("Decoder thread for {} finished", path.display());
        })
        .context("Failed to spawn decoder thread")
}

#[derive(Default)]
struct LoopState {
    paused: bool,
    pending_seek: Option<(f64, u64)>,
    /// Stamped on every frame sent out.
    generation: u64,
    /// Drop decoded output earlier than this until the first frame past it.
    discard_before: Option<f64>,
    at_eof: bool,
}

impl LoopState {
    /// Apply all queued commands. Returns false when the thread should exit.
    fn drain_commands(&mut self, link: &DecoderLink) -> bool {
        loop {
            match link.commands.try_recv() {
                Ok(DecoderCommand::Stop) => return false,
                Ok(DecoderCommand::Pause) => {
                    self.paused = true;
                    link.clock.pause();
                }
                Ok(DecoderCommand::Resume) => {
                    self.paused = false;
                    link.clock.resume();
                }
                Ok(DecoderCommand::Seek {
                    position,
                    generation,
                }) => self.pending_seek = Some((position, generation)),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }
}

struct VideoPipeline {
    stream_index: usize,
    time_base: Rational,
    decoder: decoder::Video,
    scaler: ScalerContext,
    decoded: VideoFrame,
    rgba: VideoFrame,
}

struct AudioPipeline {
    stream_index: usize,
    time_base: Rational,
    decoder: decoder::Audio,
    resampler: ResamplerContext,
    decoded: AudioFrame,
}

fn open_video(input: &Input) -> Result<VideoPipeline> {
    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| anyhow!("No video stream"))?;
    let decoder = codec::Context::from_parameters(stream.parameters())?
        .decoder()
        .video()?;
    let scaler = ScalerContext::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        Pixel::RGBA,
        decoder.width(),
        decoder.height(),
        Flags::BILINEAR,
    )?;

    Ok(VideoPipeline {
        stream_index: stream.index(),
        time_base: stream.time_base(),
        decoder,
        scaler,
        decoded: VideoFrame::empty(),
        rgba: VideoFrame::empty(),
    })
}

fn open_audio(input: &Input, sample_rate: u32) -> Result<Option<AudioPipeline>> {
    let Some(stream) = input.streams().best(Type::Audio) else {
        return Ok(None);
    };
    let decoder = codec::Context::from_parameters(stream.parameters())?
        .decoder()
        .audio()?;
    let resampler = ResamplerContext::get(
        decoder.format(),
        decoder.channel_layout(),
        decoder.rate(),
        Sample::F32(SampleType::Packed),
        ChannelLayout::STEREO,
        sample_rate,
    )?;

    Ok(Some(AudioPipeline {
        stream_index: stream.index(),
        time_base: stream.time_base(),
        decoder,
        resampler,
        decoded: AudioFrame::empty(),
    }))
}

fn decode_loop(path: &Path, link: DecoderLink) -> Result<()> {
    let mut input = ffmpeg_next::format::input(path)?;
    let mut video = open_video(&input)?;
    let mut audio = open_audio(&input, link.clock.sample_rate())?;

    let mut state = LoopState {
        paused: true,
        ..Default::default()
    };

    loop {
        if link.stop_flag.load(Ordering::Relaxed) || !state.drain_commands(&link) {
            return Ok(());
        }

        if let Some((target, generation)) = state.pending_seek.take() {
            // Frames from before this seek must not pass for its result,
            // even when the seek itself fails.
            state.generation = generation;
            let target_ts = (target * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
            match input.seek(target_ts, ..target_ts) {
                Ok(()) => {
                    video.decoder.flush();
                    if let Some(ref mut audio) = audio {
                        audio.decoder.flush();
                    }
                    link.audio.clear();
                    link.clock.set_position(target);
                    state.discard_before = Some(target - SEEK_TOLERANCE);
                    state.at_eof = false;
                    link.eof.store(false, Ordering::Relaxed);
                }
                Err(e) => log::warn!("Seek to {:.2}s failed: {}", target, e),
            }
        }

        if state.paused || state.at_eof {
            thread::sleep(IDLE_SLEEP);
            continue;
        }

        let mut packet = Packet::empty();
        match packet.read(&mut input) {
            Ok(()) => {
                let stream_index = packet.stream();
                if stream_index == video.stream_index {
                    if let Err(e) = video.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable video packet: {}", e);
                    }
                    if !forward_video(&mut video, &mut state, &link) {
                        return Ok(());
                    }
                } else if let Some(ref mut audio) = audio {
                    if stream_index == audio.stream_index {
                        if let Err(e) = audio.decoder.send_packet(&packet) {
                            log::debug!("Skipping undecodable audio packet: {}", e);
                        }
                        forward_audio(audio, &state, &link);
                    }
                }
            }
            Err(ffmpeg_next::Error::Eof) => {
                // Push out whatever the decoders still hold, then idle until
                // a seek or stop arrives.
                if let Err(e) = video.decoder.send_eof() {
                    log::debug!("Video decoder refused end of stream: {}", e);
                }
                if !forward_video(&mut video, &mut state, &link) {
                    return Ok(());
                }
                if let Some(ref mut audio) = audio {
                    if let Err(e) = audio.decoder.send_eof() {
                        log::debug!("Audio decoder refused end of stream: {}", e);
                    }
                    forward_audio(audio, &state, &link);
                }
                state.at_eof = true;
                link.eof.store(true, Ordering::Relaxed);
            }
            Err(e) => {
                log::debug!("Skipping unreadable packet: {}", e);
            }
        }
    }
}

/// Send every frame the video decoder has ready. Returns false when the
/// thread should exit.
fn forward_video(
    video: &mut VideoPipeline,
    state: &mut LoopState,
    link: &DecoderLink,
) -> bool {
    while video.decoder.receive_frame(&mut video.decoded).is_ok() {
        let pts = video.decoded.pts().unwrap_or(0) as f64 * f64::from(video.time_base);
        if let Some(threshold) = state.discard_before {
            if pts < threshold {
                continue;
            }
            state.discard_before = None;
        }

        if let Err(e) = video.scaler.run(&video.decoded, &mut video.rgba) {
            log::debug!("Dropping video frame: {}", e);
            continue;
        }
        let mut frame = DecodedFrame {
            rgba: packed_rgba(&video.rgba),
            width: video.rgba.width(),
            height: video.rgba.height(),
            pts,
            generation: state.generation,
        };

        // The channel is bounded; keep answering commands while it is full.
        loop {
            if !state.drain_commands(link) {
                return false;
            }
            if state.pending_seek.is_some() {
                return true;
            }
            match link.frames.try_send(frame) {
                Ok(()) => break,
                Err(TrySendError::Full(f)) => {
                    frame = f;
                    thread::sleep(Duration::from_millis(1));
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
    true
}

fn forward_audio(audio: &mut AudioPipeline, state: &LoopState, link: &DecoderLink) {
    while audio.decoder.receive_frame(&mut audio.decoded).is_ok() {
        if let (Some(threshold), Some(pts)) = (state.discard_before, audio.decoded.pts()) {
            if (pts as f64 * f64::from(audio.time_base)) < threshold {
                continue;
            }
        }

        let mut resampled = AudioFrame::empty();
        if let Err(e) = audio.resampler.run(&audio.decoded, &mut resampled) {
            log::debug!("Dropping audio frame: {}", e);
            continue;
        }
        link.audio.push_slice(&packed_f32(&resampled));
    }
}

/// Copy plane 0 without the per-row padding FFmpeg may add.
fn packed_rgba(frame: &VideoFrame) -> Vec<u8> {
    let row_len = frame.width() as usize * 4;
    let rows = frame.height() as usize;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_len {
        return data[..row_len * rows].to_vec();
    }
    let mut out = Vec::with_capacity(row_len * rows);
    for row in data.chunks(stride).take(rows) {
        out.extend_from_slice(&row[..row_len]);
    }
    out
}

/// Interleaved f32 samples from a packed frame, ignoring buffer padding.
fn packed_f32(frame: &AudioFrame) -> Vec<f32> {
    let data = frame.data(0);
    let used = (frame.samples() * OUTPUT_CHANNELS as usize * 4).min(data.len());
    data[..used]
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
