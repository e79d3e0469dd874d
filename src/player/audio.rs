use rodio::Source;
use std::sync::Arc;
use std::time::Duration;

use super::clock::PlaybackClock;
use super::ring::SampleRing;

/// Samples consumed between clock updates.
const CLOCK_BATCH: u64 = 256;

/// Endless rodio source fed by the decoder through a `SampleRing`.
///
/// Consumed samples advance the playback clock. For media without an audio
/// stream the source plays silence and every silent sample counts, so the
/// clock still tracks wall time.
pub struct ClockedSource {
    ring: Arc<SampleRing<f32>>,
    clock: PlaybackClock,
    counts_silence: bool,
    pending: u64,
}

impl ClockedSource {
    pub fn new(ring: Arc<SampleRing<f32>>, clock: PlaybackClock, has_audio: bool) -> Self {
        Self {
            ring,
            clock,
            counts_silence: !has_audio,
            pending: 0,
        }
    }

    fn count_sample(&mut self) {
        self.pending += 1;
        if self.pending == CLOCK_BATCH {
            self.clock.advance_samples(CLOCK_BATCH);
            self.pending = 0;
        }
    }
}

impl Iterator for ClockedSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        match self.ring.try_pop() {
            Some(sample) => {
                self.count_sample();
                Some(sample)
            }
            None => {
                // Underrun
                if self.counts_silence {
                    self.count_sample();
                }
                Some(0.0)
            }
        }
    }
}

impl Source for ClockedSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.clock.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
