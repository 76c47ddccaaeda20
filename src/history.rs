//! Rolling history of time-domain frames for the scrolling waveform.

use crate::error::VisualizerError;

/// Sample value of silence in a byte time-domain frame.
pub const MIDLINE: u8 = 128;

/// Fixed-capacity FIFO of amplitude samples.
///
/// Holds `frames_retained * frame_len` samples. Every append drops exactly one
/// frame from the head and writes the new one at the tail, so index 0 is
/// always the oldest sample.
#[derive(Debug, Clone)]
pub struct WaveformHistory {
    samples: Vec<u8>,
    frame_len: usize,
}

impl WaveformHistory {
    pub fn new(frames_retained: usize, frame_len: usize) -> Self {
        Self {
            samples: vec![MIDLINE; frames_retained * frame_len],
            frame_len,
        }
    }

    /// Slide the window left by one frame and write `frame` at the tail.
    pub fn append(&mut self, frame: &[u8]) -> Result<(), VisualizerError> {
        if frame.len() != self.frame_len {
            return Err(VisualizerError::SizeMismatch {
                expected: self.frame_len,
                actual: frame.len(),
            });
        }
        let tail = self.samples.len() - self.frame_len;
        self.samples.copy_within(self.frame_len.., 0);
        self.samples[tail..].copy_from_slice(frame);
        Ok(())
    }

    /// Oldest-first view of the whole history.
    pub fn read(&self) -> &[u8] {
        &self.samples
    }

    /// Refill with silence without reallocating.
    pub fn reset(&mut self) {
        self.samples.fill(MIDLINE);
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
}
