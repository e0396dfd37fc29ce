//! # Loveless Delay/Reverb: An AU/VST3/CLAP Delay and Reverb Plugin
//!
//! A two-mode effect built with [nih-plug](https://github.com/robbert-vdh/nih-plug):
//! either a feedback delay or a reverb processes the audio, never both.
//! The mode and every other parameter can be changed live while audio
//! streams through the plugin.
//!
//! ## Signal Flow (delay mode)
//!
//! ```text
//! Input ──┬─────────────────────────────────── × (1 - wet) ───┐
//!         │                                                   │
//!         └──►(+)──► [Ring Buffer / Delay Line] ──┬── × wet ─►(+)──► Output
//!              ▲                                  │
//!              └──────────── × feedback ◄─────────┘
//! ```
//!
//! In reverb mode the same `wet` knob sets the reverb's wet level (and
//! `1 - wet` its dry level), and `room size` sets the size of the room.
//!
//! ## Threads
//!
//! Parameters are written by the host, the UI or automation on any
//! thread and land in a lock-free [`ParamStore`](params::ParamStore).
//! The audio thread reads one snapshot of it at the start of every block
//! and owns the DSP state (delay rings, reverb) exclusively.

pub mod dsp;
pub mod engine;
pub mod params;
pub mod state;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::reverb::FreeverbReverb;
use engine::Engine;
use nih_plug::prelude::*;
use params::{ParamStore, PluginParams};

/// The main plugin struct.
///
/// `store` is shared with the host-facing `params` (whose callbacks write
/// into it); `engine` is only ever touched from `initialize()`, `reset()`
/// and `process()`.
pub struct LovelessDelayReverb {
    params: Arc<PluginParams>,

    /// Values the engine reads, one atomic per parameter.
    store: Arc<ParamStore>,

    engine: Engine<FreeverbReverb>,

    /// Main input channel count from the negotiated layout.
    num_input_channels: usize,
}

impl Default for LovelessDelayReverb {
    fn default() -> Self {
        let store = Arc::new(ParamStore::default());

        Self {
            params: Arc::new(PluginParams::new(store.clone())),
            store,
            // Unprepared until initialize() tells us the sample rate.
            engine: Engine::new(FreeverbReverb::default()),
            num_input_channels: 0,
        }
    }
}

impl LovelessDelayReverb {
    /// The parameter values the engine reads. External control layers
    /// write here; see also [`state::save`] and [`state::restore`].
    pub fn store(&self) -> &Arc<ParamStore> {
        &self.store
    }
}

impl Plugin for LovelessDelayReverb {
    const NAME: &'static str = "Loveless Delay/Reverb";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Mono or stereo only, with matching input and output. Anything else
    // is refused here, at negotiation time, rather than mid-block.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        // Stereo layout
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        // Mono fallback
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are sampled once per block, so there is nothing to gain
    // from splitting blocks at automation points.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is first loaded, or when the audio
    /// configuration changes. Sizes the delay rings and rebuilds the
    /// reverb for the new sample rate.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let Some(num_output_channels) = audio_io_layout.main_output_channels else {
            nih_warn!("Layout without main outputs is not supported");
            return false;
        };
        let num_output_channels = num_output_channels.get() as usize;

        self.num_input_channels = audio_io_layout
            .main_input_channels
            .map_or(0, |c| c.get() as usize);

        self.engine.prepare(
            f64::from(buffer_config.sample_rate),
            buffer_config.max_buffer_size as usize,
            num_output_channels,
        );

        true
    }

    /// Called when playback stops or the plugin is bypassed, so stale
    /// echoes don't bleed into the next playback.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn deactivate(&mut self) {
        self.engine.release();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // One read of every parameter; the whole block uses these values.
        let snapshot = self.store.snapshot();

        self.engine
            .process_block(buffer.as_slice(), self.num_input_channels, &snapshot);

        ProcessStatus::Tail(self.engine.tail_samples(&snapshot))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessDelayReverb {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-delay-reverb";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A switchable delay/reverb with live parameter control");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Mono,
        ClapFeature::Stereo,
        ClapFeature::Delay,
        ClapFeature::Reverb,
    ];
}

impl Vst3Plugin for LovelessDelayReverb {
    // `*b"..."` turns the 16-character ASCII literal into a `[u8; 16]`.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssDlyRvrb_v01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Delay,
        Vst3SubCategory::Reverb,
    ];
}

nih_export_clap!(LovelessDelayReverb);
nih_export_vst3!(LovelessDelayReverb);

// Wrap the CLAP plugin into AUv2 format for Logic Pro.
clap_wrapper::export_auv2!();
