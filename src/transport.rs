//! Window-side playback logic.
//!
//! `Transport` turns widget interactions into `MediaEngine` calls and keeps
//! the display state (icon, label, sliders, title, poll timer) in step with
//! what the engine reports.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::time::{
    format_time_label, fraction_to_slider, ms_to_secs, slider_to_fraction, RESET_TIME_LABEL,
    SLIDER_MAX, VOLUME_MAX,
};
use crate::timer::PollTimer;

/// What the window needs from a media engine.
pub trait MediaEngine {
    /// Replace the current media with the file at `path`.
    fn load(&mut self, path: &Path) -> Result<()>;
    fn has_media(&self) -> bool;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Volume in percent, 0-100
    fn set_volume(&mut self, percent: u8);
    /// Seek to a fraction of the media length, 0.0-1.0
    fn set_position(&mut self, fraction: f32);
    /// Playback progress, 0.0-1.0
    fn position(&self) -> f32;
    /// Elapsed time in milliseconds, -1 without media
    fn time_ms(&self) -> i64;
    /// Media length in milliseconds, -1 without media
    fn length_ms(&self) -> i64;
    fn media_title(&self) -> Option<String>;
}

/// Icon currently shown on the play/pause button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayButton {
    Play,
    Pause,
}

impl PlayButton {
    pub fn icon(self) -> &'static str {
        match self {
            PlayButton::Play => "▶",
            PlayButton::Pause => "⏸",
        }
    }
}

/// Result of a play/pause request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayPause {
    Playing,
    Paused,
    /// Nothing is loaded; the caller should ask the user for a file.
    NeedsMedia,
}

#[derive(Debug, Clone)]
pub struct Transport {
    base_title: String,
    title: String,
    play_button: PlayButton,
    time_label: String,
    seek_slider: u16,
    volume: u8,
    seek_dragging: bool,
    timer: PollTimer,
}

impl Transport {
    pub fn new(base_title: &str, volume: u8, poll_interval: Duration) -> Self {
        Self {
            base_title: base_title.to_string(),
            title: base_title.to_string(),
            play_button: PlayButton::Play,
            time_label: RESET_TIME_LABEL.to_string(),
            seek_slider: 0,
            volume: volume.min(VOLUME_MAX),
            seek_dragging: false,
            timer: PollTimer::new(poll_interval),
        }
    }

    /// Load `path` into the engine and start playing it.
    pub fn open<E: MediaEngine>(
        &mut self,
        engine: &mut E,
        path: &Path,
        now: Instant,
    ) -> Result<()> {
        if let Err(e) = engine.load(path) {
            // The engine may have dropped what it was playing before failing.
            if !engine.has_media() {
                self.timer.stop();
                self.play_button = PlayButton::Play;
                self.time_label = RESET_TIME_LABEL.to_string();
                self.seek_slider = 0;
                self.title = self.base_title.clone();
            }
            return Err(e);
        }

        let name = engine.media_title().unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });
        log::info!("Opened {}", path.display());
        self.title = format!("{} - {}", self.base_title, name);

        self.timer.stop();
        self.play_button = PlayButton::Play;
        self.time_label = RESET_TIME_LABEL.to_string();
        self.seek_slider = 0;

        self.play_pause(engine, now);
        Ok(())
    }

    pub fn play_pause<E: MediaEngine>(&mut self, engine: &mut E, now: Instant) -> PlayPause {
        if !engine.has_media() {
            return PlayPause::NeedsMedia;
        }

        if engine.is_playing() {
            engine.pause();
            self.play_button = PlayButton::Play;
            log::debug!("Paused");
            PlayPause::Paused
        } else {
            engine.play();
            self.play_button = PlayButton::Pause;
            self.timer.start(now);
            log::debug!("Playing");
            PlayPause::Playing
        }
    }

    pub fn stop<E: MediaEngine>(&mut self, engine: &mut E) {
        engine.stop();
        self.play_button = PlayButton::Play;
        self.timer.stop();
        self.time_label = RESET_TIME_LABEL.to_string();
        self.seek_slider = 0;
    }

    pub fn set_volume<E: MediaEngine>(&mut self, engine: &mut E, percent: u8) {
        self.volume = percent.min(VOLUME_MAX);
        engine.set_volume(self.volume);
        log::debug!("Volume {}", self.volume);
    }

    /// Forward a seek slider position to the engine.
    pub fn seek<E: MediaEngine>(&mut self, engine: &mut E, slider: u16) {
        self.seek_slider = slider.min(SLIDER_MAX);
        let fraction = slider_to_fraction(self.seek_slider);
        engine.set_position(fraction);
        log::debug!("Seek to {:.3}", fraction);
    }

    /// While the user drags the seek slider, polling leaves it alone.
    pub fn set_seek_dragging(&mut self, dragging: bool) {
        self.seek_dragging = dragging;
    }

    /// Run a UI refresh if the poll timer is due.
    pub fn tick<E: MediaEngine>(&mut self, engine: &mut E, now: Instant) -> bool {
        if self.timer.poll(now) {
            self.update_ui(engine);
            true
        } else {
            false
        }
    }

    /// Pull position and time from the engine into the display state.
    pub fn update_ui<E: MediaEngine>(&mut self, engine: &E) {
        if !engine.has_media() {
            return;
        }

        if !self.seek_dragging {
            self.seek_slider = fraction_to_slider(engine.position());
        }

        let current = ms_to_secs(engine.time_ms());
        let total = ms_to_secs(engine.length_ms());
        if total > 0 {
            self.time_label = format_time_label(current, total);
        }

        if !engine.is_playing() {
            self.timer.stop();
            self.play_button = PlayButton::Play;
        }
    }

    /// Window is closing.
    pub fn close<E: MediaEngine>(&mut self, engine: &mut E) {
        self.stop(engine);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn play_button(&self) -> PlayButton {
        self.play_button
    }

    pub fn time_label(&self) -> &str {
        &self.time_label
    }

    pub fn seek_slider(&self) -> u16 {
        self.seek_slider
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn timer(&self) -> &PollTimer {
        &self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgudieError;
    use std::path::PathBuf;

    #[derive(Default)]
    struct FakeEngine {
        loaded: Option<PathBuf>,
        playing: bool,
        volume: u8,
        position: f32,
        time_ms: i64,
        length_ms: i64,
        stops: u32,
        fail_load: bool,
    }

    impl MediaEngine for FakeEngine {
        fn load(&mut self, path: &Path) -> Result<()> {
            // Like the real player, the previous media is gone either way.
            self.loaded = None;
            self.playing = false;
            if self.fail_load {
                return Err(AgudieError::Open {
                    path: path.to_path_buf(),
                    reason: "unsupported codec".into(),
                });
            }
            self.loaded = Some(path.to_path_buf());
            self.playing = false;
            self.length_ms = 90_000;
            self.time_ms = 0;
            Ok(())
        }

        fn has_media(&self) -> bool {
            self.loaded.is_some()
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn play(&mut self) {
            self.playing = true;
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn stop(&mut self) {
            self.playing = false;
            self.stops += 1;
        }

        fn set_volume(&mut self, percent: u8) {
            self.volume = percent;
        }

        fn set_position(&mut self, fraction: f32) {
            self.position = fraction;
        }

        fn position(&self) -> f32 {
            self.position
        }

        fn time_ms(&self) -> i64 {
            if self.loaded.is_some() {
                self.time_ms
            } else {
                -1
            }
        }

        fn length_ms(&self) -> i64 {
            if self.loaded.is_some() {
                self.length_ms
            } else {
                -1
            }
        }

        fn media_title(&self) -> Option<String> {
            self.loaded
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
        }
    }

    fn transport() -> Transport {
        Transport::new("Agudie Media Player", 50, Duration::from_millis(200))
    }

    fn loaded_engine() -> FakeEngine {
        FakeEngine {
            loaded: Some(PathBuf::from("/videos/clip.mkv")),
            length_ms: 3_661_000,
            ..Default::default()
        }
    }

    #[test]
    fn starts_idle() {
        let t = transport();
        assert_eq!(t.title(), "Agudie Media Player");
        assert_eq!(t.play_button(), PlayButton::Play);
        assert_eq!(t.time_label(), "00:00:00 / 00:00:00");
        assert_eq!(t.seek_slider(), 0);
        assert_eq!(t.volume(), 50);
        assert!(!t.timer().is_running());
    }

    #[test]
    fn play_pause_without_media_asks_for_file() {
        let mut t = transport();
        let mut engine = FakeEngine::default();
        assert_eq!(t.play_pause(&mut engine, Instant::now()), PlayPause::NeedsMedia);
        assert!(!engine.playing);
        assert!(!t.timer().is_running());
    }

    #[test]
    fn play_pause_toggles_engine_and_icon() {
        let mut t = transport();
        let mut engine = loaded_engine();
        let now = Instant::now();

        assert_eq!(t.play_pause(&mut engine, now), PlayPause::Playing);
        assert!(engine.playing);
        assert_eq!(t.play_button(), PlayButton::Pause);
        assert!(t.timer().is_running());

        assert_eq!(t.play_pause(&mut engine, now), PlayPause::Paused);
        assert!(!engine.playing);
        assert_eq!(t.play_button(), PlayButton::Play);
    }

    #[test]
    fn open_sets_title_and_starts_playback() {
        let mut t = transport();
        let mut engine = FakeEngine::default();
        t.open(&mut engine, Path::new("/home/me/Movies/trip.mp4"), Instant::now())
            .unwrap();

        assert_eq!(t.title(), "Agudie Media Player - trip.mp4");
        assert!(engine.playing);
        assert_eq!(t.play_button(), PlayButton::Pause);
    }

    #[test]
    fn failed_open_leaves_display_alone() {
        let mut t = transport();
        let mut engine = FakeEngine {
            fail_load: true,
            ..Default::default()
        };
        let err = t
            .open(&mut engine, Path::new("broken.wmv"), Instant::now())
            .unwrap_err();

        assert!(err.to_string().contains("unsupported codec"));
        assert_eq!(t.title(), "Agudie Media Player");
        assert_eq!(t.play_button(), PlayButton::Play);
        assert!(!t.timer().is_running());
    }

    #[test]
    fn failed_reopen_resets_display() {
        let mut t = transport();
        let mut engine = FakeEngine::default();
        let start = Instant::now();
        t.open(&mut engine, Path::new("/videos/good.mp4"), start)
            .unwrap();
        engine.position = 0.5;
        engine.time_ms = 45_000;
        assert!(t.tick(&mut engine, start + Duration::from_millis(200)));
        assert_eq!(t.seek_slider(), 500);

        engine.fail_load = true;
        assert!(t
            .open(&mut engine, Path::new("/videos/broken.wmv"), start)
            .is_err());

        assert!(!engine.has_media());
        assert_eq!(t.title(), "Agudie Media Player");
        assert_eq!(t.play_button(), PlayButton::Play);
        assert_eq!(t.time_label(), RESET_TIME_LABEL);
        assert_eq!(t.seek_slider(), 0);
        assert!(!t.timer().is_running());
        assert!(!t.tick(&mut engine, start + Duration::from_secs(5)));
    }

    #[test]
    fn stop_resets_label_slider_and_timer() {
        let mut t = transport();
        let mut engine = loaded_engine();
        let now = Instant::now();
        t.play_pause(&mut engine, now);
        engine.position = 0.4;
        engine.time_ms = 125_000;
        t.update_ui(&engine);
        assert_ne!(t.time_label(), RESET_TIME_LABEL);

        t.stop(&mut engine);
        assert_eq!(engine.stops, 1);
        assert_eq!(t.time_label(), RESET_TIME_LABEL);
        assert_eq!(t.seek_slider(), 0);
        assert_eq!(t.play_button(), PlayButton::Play);
        assert!(!t.timer().is_running());
    }

    #[test]
    fn volume_is_clamped_and_forwarded() {
        let mut t = transport();
        let mut engine = loaded_engine();
        t.set_volume(&mut engine, 73);
        assert_eq!(engine.volume, 73);
        t.set_volume(&mut engine, 180);
        assert_eq!(engine.volume, 100);
        assert_eq!(t.volume(), 100);
    }

    #[test]
    fn seek_forwards_fraction() {
        let mut t = transport();
        let mut engine = loaded_engine();
        t.seek(&mut engine, 500);
        assert_eq!(engine.position, 0.5);
        assert_eq!(t.seek_slider(), 500);
        t.seek(&mut engine, 1000);
        assert_eq!(engine.position, 1.0);
    }

    #[test]
    fn update_without_media_is_skipped() {
        let mut t = transport();
        let engine = FakeEngine {
            position: 0.9,
            ..Default::default()
        };
        t.update_ui(&engine);
        assert_eq!(t.seek_slider(), 0);
        assert_eq!(t.time_label(), RESET_TIME_LABEL);
    }

    #[test]
    fn update_reads_position_and_time() {
        let mut t = transport();
        let mut engine = loaded_engine();
        t.play_pause(&mut engine, Instant::now());
        engine.position = 0.25;
        engine.time_ms = 915_250;
        t.update_ui(&engine);

        assert_eq!(t.seek_slider(), 250);
        assert_eq!(t.time_label(), "00:15:15 / 01:01:01");
        assert!(t.timer().is_running());
    }

    #[test]
    fn unknown_length_keeps_label() {
        let mut t = transport();
        let mut engine = loaded_engine();
        engine.length_ms = 0;
        engine.time_ms = 4_000;
        t.play_pause(&mut engine, Instant::now());
        t.update_ui(&engine);
        assert_eq!(t.time_label(), RESET_TIME_LABEL);
    }

    #[test]
    fn dragging_slider_is_not_overwritten() {
        let mut t = transport();
        let mut engine = loaded_engine();
        t.play_pause(&mut engine, Instant::now());
        t.set_seek_dragging(true);
        t.seek(&mut engine, 700);
        engine.position = 0.1;
        t.update_ui(&engine);
        assert_eq!(t.seek_slider(), 700);

        t.set_seek_dragging(false);
        t.update_ui(&engine);
        assert_eq!(t.seek_slider(), 100);
    }

    #[test]
    fn playback_end_stops_timer() {
        let mut t = transport();
        let mut engine = loaded_engine();
        let start = Instant::now();
        t.play_pause(&mut engine, start);

        engine.playing = false;
        engine.position = 1.0;
        assert!(t.tick(&mut engine, start + Duration::from_millis(200)));
        assert_eq!(t.seek_slider(), 1000);
        assert_eq!(t.play_button(), PlayButton::Play);
        assert!(!t.timer().is_running());
        assert!(!t.tick(&mut engine, start + Duration::from_millis(400)));
    }

    #[test]
    fn tick_waits_for_interval() {
        let mut t = transport();
        let mut engine = loaded_engine();
        let start = Instant::now();
        t.play_pause(&mut engine, start);
        engine.position = 0.5;

        assert!(!t.tick(&mut engine, start + Duration::from_millis(50)));
        assert_eq!(t.seek_slider(), 0);
        assert!(t.tick(&mut engine, start + Duration::from_millis(210)));
        assert_eq!(t.seek_slider(), 500);
    }

    #[test]
    fn close_stops_engine() {
        let mut t = transport();
        let mut engine = loaded_engine();
        t.play_pause(&mut engine, Instant::now());
        t.close(&mut engine);
        assert!(!engine.playing);
        assert_eq!(engine.stops, 1);
        assert!(!t.timer().is_running());
    }
}
