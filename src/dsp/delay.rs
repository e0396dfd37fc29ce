//! # Delay Engine
//!
//! A feedback delay: every channel owns a [`DelayLine`], and all of them
//! share one write cursor that persists from block to block.
//!
//! ## Per-sample algorithm
//!
//! ```text
//! delayed        = line[read_pos]
//! line[write_pos] = input + delayed * feedback
//! output         = input * (1 - wet) + delayed * wet
//! write_pos      = (write_pos + 1) % len
//! ```
//!
//! The feedback write uses the raw input plus the attenuated echo, so a
//! unit impulse produces echoes of `1, f, f², f³, ...` on the wet path.

use super::delay_line::{self, DelayLine};

/// Maximum delay the buffers are sized for, in seconds.
pub const MAX_DELAY_SECONDS: f64 = 2.0;

/// Ring length for a sample rate and block size:
/// `floor(sample_rate * MAX_DELAY_SECONDS) + block_size`.
///
/// A non-finite or non-positive sample rate yields 0, which leaves the
/// engine unprepared (processing becomes a no-op).
pub fn buffer_length(sample_rate: f64, block_size: usize) -> usize {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return 0;
    }
    (sample_rate * MAX_DELAY_SECONDS).floor() as usize + block_size
}

/// Convert a delay time to whole samples, clamped to `[1, buffer_len - 1]`
/// so the read cursor never coincides with the write cursor.
///
/// `buffer_len` must be at least 2.
pub fn delay_in_samples(sample_rate: f64, delay_ms: f32, buffer_len: usize) -> usize {
    let samples = (sample_rate * f64::from(delay_ms) / 1000.0).round();
    // `as usize` saturates: NaN lands on 0 and is then raised to 1.
    (samples as usize).clamp(1, buffer_len - 1)
}

/// Per-channel ring buffers and the shared write cursor.
#[derive(Debug, Default)]
pub struct DelayEngine {
    lines: Vec<DelayLine>,
    buffer_len: usize,
    write_position: usize,
    sample_rate: f64,
}

impl DelayEngine {
    /// (Re)allocate one zero-filled ring per channel and rewind the cursor.
    ///
    /// Not real-time safe: only call from the lifecycle path.
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize, num_channels: usize) {
        let len = buffer_length(sample_rate, block_size);

        self.lines.resize_with(num_channels, DelayLine::default);
        for line in &mut self.lines {
            line.resize(len);
        }

        self.buffer_len = len;
        self.write_position = 0;
        self.sample_rate = sample_rate;
    }

    /// Zero every ring and rewind the cursor, keeping the allocation.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.write_position = 0;
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    pub fn num_channels(&self) -> usize {
        self.lines.len()
    }

    pub fn write_position(&self) -> usize {
        self.write_position
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Whether a block would actually be processed. A ring shorter than 2
    /// samples cannot hold a delay of at least one sample.
    pub fn is_prepared(&self) -> bool {
        self.buffer_len >= 2
    }

    /// Process `channels` in place.
    ///
    /// Channels beyond the prepared channel count are left untouched. The
    /// shared cursor advances by the block length once every channel has
    /// been processed, so all channels stay in lockstep.
    pub fn process(&mut self, channels: &mut [&mut [f32]], delay_ms: f32, feedback: f32, wet: f32) {
        if !self.is_prepared() {
            return;
        }

        let len = self.buffer_len;
        let delay = delay_in_samples(self.sample_rate, delay_ms, len);
        let dry = 1.0 - wet;
        let num_samples = channels.first().map_or(0, |channel| channel.len());

        for (channel, line) in channels.iter_mut().zip(self.lines.iter_mut()) {
            let mut write_pos = self.write_position;

            for sample in channel.iter_mut() {
                let read_pos = delay_line::read_position(write_pos, delay, len);

                let input = *sample;
                let delayed = line.read(read_pos);

                line.write(write_pos, input + delayed * feedback);
                *sample = input * dry + delayed * wet;

                write_pos += 1;
                if write_pos >= len {
                    write_pos = 0;
                }
            }
        }

        self.write_position = delay_line::advance(self.write_position, num_samples, len);
    }

    /// Samples until the feedback loop decays to -60 dB.
    ///
    /// Each repeat is attenuated by the feedback factor, so after N
    /// repeats the level is `feedback^N`. Solving `feedback^N = 0.001`
    /// gives `N = -3 / log10(feedback)`.
    pub fn tail_samples(&self, delay_ms: f32, feedback: f32) -> u32 {
        if !self.is_prepared() {
            return 0;
        }

        let delay = delay_in_samples(self.sample_rate, delay_ms, self.buffer_len) as f32;
        if feedback > 0.001 {
            let repeats = -3.0 / feedback.log10();
            (repeats * delay) as u32
        } else {
            // With no feedback, just one delay period for the single echo.
            delay as u32
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
