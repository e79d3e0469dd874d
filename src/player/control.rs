//! Playback state of a session, kept apart from the decoder thread and
//! audio device it drives so the transitions can be checked directly.

use super::decoder::DecoderCommand;

/// Seconds before the reported end at which playback counts as finished.
const END_MARGIN: f64 = 0.1;
/// Seeks stay this far before the end so a frame is still there to land on.
const SEEK_END_GAP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Playing,
    Paused,
    /// Reached the end of the media
    Ended,
}

/// Something the session has to do to its decoder or audio sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Send(DecoderCommand),
    PlayAudio,
    PauseAudio,
}

#[derive(Debug, Clone)]
pub struct PlaybackControl {
    state: SessionState,
    seeking: bool,
    seek_target: f64,
    /// Bumped on every seek; frames decoded for older seeks are stale.
    generation: u64,
}

impl PlaybackControl {
    pub fn new() -> Self {
        Self {
            state: SessionState::Stopped,
            seeking: false,
            seek_target: 0.0,
            generation: 0,
        }
    }

    pub fn play(&mut self, duration: f64) -> Vec<Effect> {
        if self.state == SessionState::Playing {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if self.state == SessionState::Ended {
            effects.extend(self.seek(0.0, duration));
        }
        self.state = SessionState::Playing;
        effects.push(Effect::Send(DecoderCommand::Resume));
        if !self.seeking {
            effects.push(Effect::PlayAudio);
        }
        effects
    }

    pub fn pause(&mut self) -> Vec<Effect> {
        if self.state != SessionState::Playing {
            return Vec::new();
        }
        self.state = SessionState::Paused;
        let mut effects = vec![Effect::PauseAudio];
        // A pending seek still needs the decoder running to land; landing
        // pauses it.
        if !self.seeking {
            effects.push(Effect::Send(DecoderCommand::Pause));
        }
        effects
    }

    /// Stop and rewind to the start.
    pub fn stop(&mut self, duration: f64) -> Vec<Effect> {
        self.state = SessionState::Stopped;
        self.seek(0.0, duration)
    }

    pub fn seek(&mut self, position: f64, duration: f64) -> Vec<Effect> {
        let last = (duration - SEEK_END_GAP).max(0.0);
        self.seek_target = position.clamp(0.0, last);
        self.seeking = true;
        self.generation += 1;
        if self.state == SessionState::Ended {
            self.state = SessionState::Paused;
        }

        vec![
            Effect::PauseAudio,
            Effect::Send(DecoderCommand::Seek {
                position: self.seek_target,
                generation: self.generation,
            }),
            // The decoder has to run to produce the landing frame even when paused.
            Effect::Send(DecoderCommand::Resume),
        ]
    }

    /// The seek produced its first frame, or the decoder has nothing more.
    pub fn land(&mut self) -> Vec<Effect> {
        if !self.seeking {
            return Vec::new();
        }
        self.seeking = false;
        if self.state == SessionState::Playing {
            vec![Effect::PlayAudio]
        } else {
            vec![Effect::Send(DecoderCommand::Pause)]
        }
    }

    pub fn finish(&mut self) -> Vec<Effect> {
        self.state = SessionState::Ended;
        vec![Effect::PauseAudio, Effect::Send(DecoderCommand::Pause)]
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn seek_target(&self) -> f64 {
        self.seek_target
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Whether playback has run out. `decoder_done` is true once the decoder
/// has nothing more to deliver, including when its thread has exited.
pub fn reached_end(drained: bool, clock: f64, duration: f64, decoder_done: bool) -> bool {
    if !drained {
        return false;
    }
    let past_duration = duration > 0.0 && clock >= duration - END_MARGIN;
    past_duration || decoder_done
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sends(effects: &[Effect], command: DecoderCommand) -> bool {
        effects.contains(&Effect::Send(command))
    }

    fn playing() -> PlaybackControl {
        let mut control = PlaybackControl::new();
        control.seek(0.0, 100.0);
        control.land();
        control.play(100.0);
        control
    }

    #[test]
    fn play_waits_for_pending_seek_before_audio() {
        let mut control = PlaybackControl::new();
        control.seek(0.0, 100.0);
        let effects = control.play(100.0);
        assert!(sends(&effects, DecoderCommand::Resume));
        assert!(!effects.contains(&Effect::PlayAudio));

        assert_eq!(control.land(), vec![Effect::PlayAudio]);
    }

    #[test]
    fn pause_during_seek_keeps_decoder_running() {
        let mut control = playing();
        control.seek(30.0, 100.0);

        let effects = control.pause();
        assert_eq!(effects, vec![Effect::PauseAudio]);
        assert!(control.is_seeking());

        // Landing pauses the decoder instead.
        assert_eq!(control.land(), vec![Effect::Send(DecoderCommand::Pause)]);
        assert!(!control.is_seeking());
        assert_eq!(control.state(), SessionState::Paused);
    }

    #[test]
    fn pause_while_steady_pauses_decoder() {
        let mut control = playing();
        let effects = control.pause();
        assert!(effects.contains(&Effect::PauseAudio));
        assert!(sends(&effects, DecoderCommand::Pause));
        assert!(control.pause().is_empty());
    }

    #[test]
    fn seeks_are_numbered_and_clamped() {
        let mut control = PlaybackControl::new();
        let effects = control.seek(250.0, 100.0);
        assert_eq!(control.seek_target(), 99.0);
        assert!(sends(
            &effects,
            DecoderCommand::Seek {
                position: 99.0,
                generation: 1
            }
        ));
        control.seek(-3.0, 100.0);
        assert_eq!(control.seek_target(), 0.0);
        assert_eq!(control.generation(), 2);
    }

    #[test]
    fn play_after_end_rewinds() {
        let mut control = playing();
        control.finish();
        assert_eq!(control.state(), SessionState::Ended);

        let effects = control.play(100.0);
        assert!(sends(
            &effects,
            DecoderCommand::Seek {
                position: 0.0,
                generation: control.generation()
            }
        ));
        assert!(control.is_playing());
        assert!(control.is_seeking());
    }

    #[test]
    fn stop_rewinds_and_lands_paused() {
        let mut control = playing();
        control.stop(100.0);
        assert_eq!(control.state(), SessionState::Stopped);
        assert_eq!(control.seek_target(), 0.0);
        assert_eq!(control.land(), vec![Effect::Send(DecoderCommand::Pause)]);
    }

    #[test]
    fn end_needs_drained_queue() {
        assert!(!reached_end(false, 100.0, 100.0, true));
        assert!(reached_end(true, 99.95, 100.0, false));
        assert!(!reached_end(true, 50.0, 100.0, false));
    }

    #[test]
    fn dead_decoder_ends_playback_short_of_duration() {
        assert!(reached_end(true, 12.0, 100.0, true));
        assert!(reached_end(true, 0.0, 0.0, true));
        assert!(!reached_end(true, 0.0, 0.0, false));
    }
}
