//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay.
//!
//! ## How a Ring Buffer Works
//!
//! Imagine a circular tape loop. A "write head" records incoming audio
//! onto the tape, and a "read head" plays it back from a position further
//! behind on the tape. The distance between the two heads determines the
//! delay time.
//!
//! In code, we use a `Vec<f32>` as our "tape" and an integer index as the
//! write head position. Each time we process one audio sample:
//!
//! 1. Read the delayed sample from `(write_pos - delay_in_samples)`,
//!    wrapping around to the end of the buffer if we go past the start.
//! 2. Write the new sample at `write_pos`.
//! 3. Advance `write_pos` by 1, wrapping back to 0 at the end.
//!
//! ## One cursor, many channels
//!
//! All channels of the effect share a single write position, owned by the
//! [`DelayEngine`](super::delay::DelayEngine). A `DelayLine` is therefore
//! only the storage for one channel; the cursor is passed in on every
//! access.
//!
//! Reads land on whole samples. The delay time is rounded to the nearest
//! sample once per block, so no interpolation is needed.

use nih_plug::prelude::*;

/// Sample storage for one channel of the delay.
///
/// The buffer is sized during `prepare()`, so no memory allocation ever
/// happens during audio processing.
#[derive(Debug, Default)]
pub struct DelayLine {
    /// The circular buffer storing audio samples. All values start at
    /// 0.0 (silence).
    buffer: Vec<f32>,
}

impl DelayLine {
    /// Create a zero-filled delay line of `length` samples.
    #[cfg(test)]
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.buffer.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Resize to `length` samples and zero-fill. Existing capacity is
    /// reused when the new length fits.
    pub fn resize(&mut self, length: usize) {
        self.buffer.clear();
        self.buffer.resize(length, 0.0);
    }

    /// Read the sample stored at `position`.
    #[inline]
    pub fn read(&self, position: usize) -> f32 {
        self.buffer[position]
    }

    /// Overwrite the sample stored at `position`.
    #[inline]
    pub fn write(&mut self, position: usize, sample: f32) {
        self.buffer[position] = sample;
    }

    /// Clear the entire buffer to silence.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// Index of the sample written `delay` samples before `write_pos` on a
/// ring of `len` samples.
///
/// We add `len` before subtracting to avoid negative numbers (`usize`
/// can't be negative). The modulo wraps the result back into range.
///
/// Example: `write_pos = 5`, `delay = 10`, `len = 100`:
/// ```text
/// (5 + 100 - 10) % 100 = 95
/// ```
///
/// Requires `delay <= len`.
#[inline]
pub fn read_position(write_pos: usize, delay: usize, len: usize) -> usize {
    nih_debug_assert!(delay <= len, "delay of {delay} samples exceeds ring of {len}");
    (write_pos + len - delay) % len
}

/// Advance a write position by `steps` samples on a ring of `len`.
#[inline]
pub fn advance(write_pos: usize, steps: usize, len: usize) -> usize {
    (write_pos + steps) % len
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
