use anyhow::{Context as _, Result};
use crossbeam_channel::{bounded, Sender};
use egui::{Color32, ColorImage, Context, TextureHandle, TextureOptions};
use rodio::{OutputStream, Sink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::audio::ClockedSource;
use super::clock::PlaybackClock;
use super::control::{reached_end, Effect, PlaybackControl};
use super::decoder::{spawn_decoder, DecoderCommand, DecoderLink, MediaInfo, OUTPUT_CHANNELS};
use super::ring::SampleRing;
use super::video::{DecodedFrame, FrameQueue};
use crate::time::volume_to_gain;

/// Decoded frames buffered between the decoder and the GUI.
const FRAME_BUFFER: usize = 30;

/// One opened media file: decoder thread, audio output and video texture.
pub struct MediaSession {
    path: PathBuf,
    info: MediaInfo,
    control: PlaybackControl,

    decoder_handle: Option<JoinHandle<()>>,
    commands: Sender<DecoderCommand>,
    stop_flag: Arc<AtomicBool>,
    decoder_eof: Arc<AtomicBool>,
    decoder_exited: Arc<AtomicBool>,

    _output_stream: OutputStream,
    sink: Sink,
    audio_ring: Arc<SampleRing<f32>>,
    clock: PlaybackClock,

    frames: FrameQueue,
    texture: TextureHandle,
}

impl MediaSession {
    /// Probe `path`, open the audio device and start decoding (paused).
    pub fn open(path: &Path, ctx: &Context, volume: u8) -> Result<Self> {
        let info = MediaInfo::probe(path).context("Failed to probe media")?;
        log::info!(
            "Media {}: {}x{}, {:.1}s, {}",
            path.display(),
            info.width,
            info.height,
            info.duration,
            if info.has_audio { "with audio" } else { "no audio" }
        );

        let clock = PlaybackClock::new(info.sample_rate, OUTPUT_CHANNELS);

        let (output_stream, stream_handle) =
            OutputStream::try_default().context("No audio output device")?;
        let sink = Sink::try_new(&stream_handle).context("Failed to create audio sink")?;

        // About two seconds of audio
        let audio_ring = SampleRing::new(info.sample_rate as usize * OUTPUT_CHANNELS as usize * 2);
        sink.append(ClockedSource::new(audio_ring.clone(), clock.clone(), info.has_audio));
        sink.set_volume(volume_to_gain(volume));
        sink.pause();

        let (frame_sender, frame_receiver) = bounded(FRAME_BUFFER);
        let (commands, command_receiver) = bounded(16);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let decoder_eof = Arc::new(AtomicBool::new(false));
        let decoder_exited = Arc::new(AtomicBool::new(false));

        let decoder_handle = spawn_decoder(
            path,
            DecoderLink {
                frames: frame_sender,
                audio: audio_ring.clone(),
                commands: command_receiver,
                clock: clock.clone(),
                stop_flag: stop_flag.clone(),
                eof: decoder_eof.clone(),
                exited: decoder_exited.clone(),
            },
        )?;

        let texture = ctx.load_texture(
            "video_frame",
            ColorImage::new([info.width as usize, info.height as usize], Color32::BLACK),
            TextureOptions::LINEAR,
        );

        let mut session = Self {
            path: path.to_path_buf(),
            info,
            control: PlaybackControl::new(),
            decoder_handle: Some(decoder_handle),
            commands,
            stop_flag,
            decoder_eof,
            decoder_exited,
            _output_stream: output_stream,
            sink,
            audio_ring,
            clock,
            frames: FrameQueue::new(frame_receiver, FRAME_BUFFER),
            texture,
        };

        // Decode up to the first frame so there is something to show.
        session.seek(0.0);
        Ok(session)
    }

    fn send(&self, command: DecoderCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("Decoder for {} is gone, dropped {:?}", self.path.display(), command);
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(command) => {
                    if let DecoderCommand::Seek { position, generation } = command {
                        self.frames.reset(generation);
                        self.audio_ring.clear();
                        self.clock.set_position(position);
                        self.decoder_eof.store(false, Ordering::Relaxed);
                    }
                    self.send(command);
                }
                Effect::PlayAudio => self.sink.play(),
                Effect::PauseAudio => self.sink.pause(),
            }
        }
    }

    pub fn play(&mut self) {
        let effects = self.control.play(self.info.duration);
        self.apply(effects);
    }

    pub fn pause(&mut self) {
        let effects = self.control.pause();
        self.apply(effects);
    }

    /// Stop and rewind to the start.
    pub fn stop(&mut self) {
        let effects = self.control.stop(self.info.duration);
        self.apply(effects);
    }

    /// Seek to `position` seconds.
    pub fn seek(&mut self, position: f64) {
        let effects = self.control.seek(position, self.info.duration);
        self.apply(effects);
    }

    pub fn set_volume(&mut self, percent: u8) {
        self.sink.set_volume(volume_to_gain(percent));
    }

    /// Move decoded frames into the texture. Call once per GUI frame.
    pub fn update(&mut self, ctx: &Context) {
        if self.control.is_seeking() {
            self.finish_seek();
            ctx.request_repaint();
            return;
        }

        if !self.control.is_playing() {
            return;
        }

        let now = self.clock.position();
        if let Some(frame) = self.frames.frame_for(now) {
            upload(&mut self.texture, frame);
        }

        if reached_end(self.frames.is_drained(), now, self.info.duration, self.decoder_done()) {
            log::info!("Finished {}", self.path.display());
            let effects = self.control.finish();
            self.apply(effects);
        }

        ctx.request_repaint();
    }

    fn finish_seek(&mut self) {
        let landed = if let Some(frame) = self.frames.take_next() {
            upload(&mut self.texture, frame);
            Some(frame.pts)
        } else if self.frames.is_drained()
            && (self.decoder_eof.load(Ordering::Relaxed)
                || self.decoder_exited.load(Ordering::Acquire))
        {
            // Nothing left to decode past the target.
            Some(self.control.seek_target())
        } else {
            None
        };

        let Some(pts) = landed else {
            return;
        };

        self.clock.set_position(pts);
        let effects = self.control.land();
        self.apply(effects);
    }

    /// The decoder will deliver nothing more until the next seek.
    fn decoder_done(&self) -> bool {
        self.decoder_exited.load(Ordering::Acquire)
            || (self.decoder_eof.load(Ordering::Relaxed) && self.audio_ring.is_empty())
    }

    pub fn texture(&self) -> &TextureHandle {
        &self.texture
    }

    pub fn video_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    pub fn duration(&self) -> f64 {
        self.info.duration
    }

    /// Seconds; while seeking this is the seek target.
    pub fn position(&self) -> f64 {
        if self.control.is_seeking() {
            self.control.seek_target()
        } else {
            self.clock.position()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.control.is_playing()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn upload(texture: &mut TextureHandle, frame: &DecodedFrame) {
    let image = ColorImage::from_rgba_unmultiplied(
        [frame.width as usize, frame.height as usize],
        &frame.rgba,
    );
    texture.set(image, TextureOptions::LINEAR);
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        let _ = self.commands.send(DecoderCommand::Stop);
        if let Some(handle) = self.decoder_handle.take() {
            let _ = handle.join();
        }
    }
}
