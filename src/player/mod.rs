//! The media engine: FFmpeg decoding, rodio audio output and an egui
//! texture as the video surface.

mod audio;
mod clock;
mod control;
mod decoder;
mod ring;
mod session;
mod video;

use egui::{Context, TextureHandle};
use std::path::Path;

use crate::error::{AgudieError, Result};
use crate::time::VOLUME_MAX;
use crate::transport::MediaEngine;

pub use session::MediaSession;

/// Media player holding at most one open session.
pub struct Player {
    ctx: Context,
    session: Option<MediaSession>,
    volume: u8,
}

impl Player {
    pub fn new(ctx: Context, volume: u8) -> Self {
        Self {
            ctx,
            session: None,
            volume: volume.min(VOLUME_MAX),
        }
    }

    /// Advance video presentation. Call once per GUI frame.
    pub fn update(&mut self) {
        if let Some(ref mut session) = self.session {
            session.update(&self.ctx);
        }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.session.as_ref().map(MediaSession::texture)
    }

    pub fn video_size(&self) -> Option<(u32, u32)> {
        self.session.as_ref().map(MediaSession::video_size)
    }
}

impl MediaEngine for Player {
    fn load(&mut self, path: &Path) -> Result<()> {
        // Shut the old decoder and audio device down before opening new ones.
        self.session = None;

        let session = MediaSession::open(path, &self.ctx, self.volume).map_err(|e| {
            log::error!("Failed to open {}: {:#}", path.display(), e);
            AgudieError::open(path, &e)
        })?;
        self.session = Some(session);
        Ok(())
    }

    fn has_media(&self) -> bool {
        self.session.is_some()
    }

    fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(MediaSession::is_playing)
    }

    fn play(&mut self) {
        if let Some(ref mut session) = self.session {
            session.play();
        }
    }

    fn pause(&mut self) {
        if let Some(ref mut session) = self.session {
            session.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(ref mut session) = self.session {
            session.stop();
        }
    }

    fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(VOLUME_MAX);
        if let Some(ref mut session) = self.session {
            session.set_volume(self.volume);
        }
    }

    fn set_position(&mut self, fraction: f32) {
        if let Some(ref mut session) = self.session {
            let duration = session.duration();
            if duration > 0.0 {
                session.seek(f64::from(fraction.clamp(0.0, 1.0)) * duration);
            }
        }
    }

    fn position(&self) -> f32 {
        match self.session {
            Some(ref session) if session.duration() > 0.0 => {
                (session.position() / session.duration()).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }

    fn time_ms(&self) -> i64 {
        self.session
            .as_ref()
            .map_or(-1, |s| (s.position() * 1000.0) as i64)
    }

    fn length_ms(&self) -> i64 {
        self.session
            .as_ref()
            .map_or(-1, |s| (s.duration() * 1000.0) as i64)
    }

    fn media_title(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.path().file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }
}
