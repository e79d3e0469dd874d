use crossbeam_channel::Receiver;
use std::collections::VecDeque;

/// Frames later than this behind the clock are dropped (seconds).
const DROP_THRESHOLD: f64 = 0.02;
/// Frames up to this far ahead of the clock may be shown early (seconds).
const HOLD_THRESHOLD: f64 = 0.02;

/// A decoded frame as tightly packed RGBA.
pub struct DecodedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation time in seconds
    pub pts: f64,
    /// Seek this frame was decoded for
    pub generation: u64,
}

/// Buffers frames from the decoder thread and picks the one to present
/// for the current clock.
pub struct FrameQueue {
    receiver: Receiver<DecodedFrame>,
    buffer: VecDeque<DecodedFrame>,
    current: Option<DecodedFrame>,
    capacity: usize,
    /// Frames from any other seek are dropped on arrival.
    generation: u64,
}

impl FrameQueue {
    pub fn new(receiver: Receiver<DecodedFrame>, capacity: usize) -> Self {
        Self {
            receiver,
            buffer: VecDeque::with_capacity(capacity),
            current: None,
            capacity,
            generation: 0,
        }
    }

    fn receive(&mut self) {
        while self.buffer.len() < self.capacity {
            match self.receiver.try_recv() {
                Ok(frame) if frame.generation == self.generation => {
                    self.buffer.push_back(frame)
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    }

    /// The frame to present at `clock`, if it differs from the one
    /// already on screen.
    pub fn frame_for(&mut self, clock: f64) -> Option<&DecodedFrame> {
        self.receive();

        while self
            .buffer
            .front()
            .is_some_and(|frame| frame.pts < clock - DROP_THRESHOLD)
        {
            // Keep the newest late frame if nothing else is queued.
            if self.buffer.len() == 1 {
                break;
            }
            self.buffer.pop_front();
        }

        let due = self
            .buffer
            .front()
            .is_some_and(|frame| frame.pts <= clock + HOLD_THRESHOLD);
        if due {
            self.current = self.buffer.pop_front();
            return self.current.as_ref();
        }
        None
    }

    /// First frame to arrive after a seek, regardless of the clock.
    pub fn take_next(&mut self) -> Option<&DecodedFrame> {
        self.receive();
        let frame = self.buffer.pop_front()?;
        self.current = Some(frame);
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&DecodedFrame> {
        self.current.as_ref()
    }

    /// Drop everything buffered or in flight and accept only frames
    /// decoded for `generation` from now on.
    pub fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.buffer.clear();
        self.current = None;
        while self.receiver.try_recv().is_ok() {}
    }

    /// No frames left to present besides the one on screen.
    pub fn is_drained(&self) -> bool {
        self.buffer.is_empty() && self.receiver.is_empty()
    }
}
