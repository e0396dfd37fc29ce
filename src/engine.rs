//! # Engine
//!
//! Ties the delay and the reverb together behind the two calls a host
//! makes: [`Engine::prepare`] whenever the stream is (re)configured, and
//! [`Engine::process_block`] for every audio callback.
//!
//! The mode is read once per block and applies to the whole block. The
//! delay rings keep their contents while reverb runs (and the reverb keeps
//! its tail while delay runs); the inactive effect is simply not touched.

use nih_plug::prelude::*;

use crate::dsp::delay::DelayEngine;
use crate::dsp::reverb::{ReverbAdapter, ReverbProcessor};
use crate::params::{Mode, ParamSnapshot};

/// Tail reported to the host while in reverb mode.
pub const REVERB_TAIL_SECONDS: f64 = 5.0;

pub struct Engine<R> {
    sample_rate: f64,
    block_size: usize,
    delay: DelayEngine,
    reverb: ReverbAdapter<R>,
}

impl<R: ReverbProcessor> Engine<R> {
    pub fn new(reverb: R) -> Self {
        Self {
            sample_rate: 0.0,
            block_size: 0,
            delay: DelayEngine::default(),
            reverb: ReverbAdapter::new(reverb),
        }
    }

    /// Size the delay rings for `sample_rate`/`block_size`, zero them,
    /// rewind the write cursor and reset the reverb's parameters.
    ///
    /// May allocate. The host never calls this concurrently with
    /// [`process_block`](Self::process_block).
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.block_size = block_size;

        self.delay.prepare(sample_rate, block_size, num_channels);
        self.reverb.prepare(sample_rate);

        if self.delay.is_prepared() {
            nih_log!(
                "Prepared at {sample_rate} Hz, {block_size} samples per block: {num_channels} \
                 delay lines of {} samples",
                self.delay.buffer_len()
            );
        } else {
            nih_warn!(
                "Unusable sample rate {sample_rate} Hz; audio will pass through unprocessed"
            );
        }
    }

    /// Nothing to free; the buffers are kept for the next `prepare()`.
    pub fn release(&mut self) {}

    /// Silence the delay rings without reallocating.
    pub fn reset(&mut self) {
        self.delay.reset();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn delay(&self) -> &DelayEngine {
        &self.delay
    }

    pub fn reverb(&self) -> &ReverbAdapter<R> {
        &self.reverb
    }

    /// Process one block in place.
    ///
    /// `channels` holds every output channel; only the first
    /// `num_input_channels` carry input. The rest are zeroed first.
    pub fn process_block(
        &mut self,
        channels: &mut [&mut [f32]],
        num_input_channels: usize,
        params: &ParamSnapshot,
    ) {
        let num_input_channels = num_input_channels.min(channels.len());
        for channel in &mut channels[num_input_channels..] {
            channel.fill(0.0);
        }

        match params.mode {
            Mode::Delay => self.delay.process(
                &mut channels[..num_input_channels],
                params.delay_time_ms,
                params.feedback,
                params.wet,
            ),
            Mode::Reverb => self.reverb.process(channels, params.room_size, params.wet),
        }
    }

    /// How long the host should keep calling `process_block()` after the
    /// input goes silent.
    pub fn tail_samples(&self, params: &ParamSnapshot) -> u32 {
        match params.mode {
            Mode::Delay => self.delay.tail_samples(params.delay_time_ms, params.feedback),
            Mode::Reverb if self.delay.is_prepared() => {
                (REVERB_TAIL_SECONDS * self.sample_rate) as u32
            }
            Mode::Reverb => 0,
        }
    }
}
