use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Master clock for A/V sync, driven by the audio output consuming samples.
#[derive(Clone)]
pub struct PlaybackClock {
    /// Position in microseconds
    position_us: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl PlaybackClock {
    /// A new clock starts at zero, not running.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            position_us: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
        }
    }

    /// Position in seconds
    pub fn position(&self) -> f64 {
        self.position_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    pub fn set_position(&self, seconds: f64) {
        let us = (seconds.max(0.0) * 1_000_000.0) as u64;
        self.position_us.store(us, Ordering::Relaxed);
    }

    /// Advance by `samples` interleaved samples (all channels counted).
    pub fn advance_samples(&self, samples: u64) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }
        let per_second = self.sample_rate as f64 * self.channels as f64;
        let delta_us = (samples as f64 * 1_000_000.0 / per_second) as u64;
        self.position_us.fetch_add(delta_us, Ordering::Relaxed);
    }

    pub fn pause(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
