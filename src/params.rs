//! # Plugin Parameters
//!
//! Parameters live in two layers:
//!
//! - [`ParamStore`] is what the audio engine reads. It holds one atomic
//!   `f32` per parameter, so the audio thread can read the latest value
//!   without locking while a control thread (UI, host automation) writes
//!   it. Writes are clamped to the parameter's declared range.
//! - [`PluginParams`] is what the host sees. It is the `#[derive(Params)]`
//!   struct nih-plug registers with the DAW for automation, preset
//!   recall and generic UIs. Every parameter carries a value-changed
//!   callback that publishes into the shared [`ParamStore`], so a write
//!   from the host is visible to the very next processed block.
//!
//! The parameter set is declared once, statically, in [`ParamId`]. Each
//! identifier maps to a [`ParamSpec`] holding its string ID, range and
//! default. Once published, never change these IDs or existing presets
//! will break.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF32;
use nih_plug::prelude::*;

/// Which effect processes the audio.
///
/// Sampled once at the start of every block; a change takes effect at the
/// next block boundary.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[id = "delay"]
    Delay,
    #[id = "reverb"]
    Reverb,
}

impl Mode {
    /// The numeric value stored for this mode (its variant index).
    pub fn as_value(self) -> f32 {
        match self {
            Mode::Delay => 0.0,
            Mode::Reverb => 1.0,
        }
    }

    /// Decode a stored value. Anything rounding to 1 or above is reverb.
    pub fn from_value(value: f32) -> Self {
        if value.round() >= 1.0 {
            Mode::Reverb
        } else {
            Mode::Delay
        }
    }
}

/// Static declaration of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Stable identifier, shared by the host surface and saved state.
    pub id: &'static str,
    /// Human-readable name shown in the DAW.
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamSpec {
    /// Clamp `value` into this parameter's range. NaN falls back to the
    /// default instead of poisoning the DSP.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Identifier of every parameter the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Mode,
    DelayTimeMs,
    Feedback,
    Wet,
    RoomSize,
}

const SPECS: [ParamSpec; ParamId::COUNT] = [
    ParamSpec {
        id: "mode",
        name: "Mode",
        min: 0.0,
        max: 1.0,
        default: 0.0,
    },
    ParamSpec {
        id: "delayTimeMs",
        name: "Delay Time",
        min: 1.0,
        max: 1000.0,
        default: 350.0,
    },
    ParamSpec {
        id: "feedback",
        name: "Feedback",
        min: 0.0,
        max: 0.95,
        default: 0.4,
    },
    ParamSpec {
        id: "wet",
        name: "Wet",
        min: 0.0,
        max: 1.0,
        default: 0.35,
    },
    ParamSpec {
        id: "roomSize",
        name: "Room Size",
        min: 0.1,
        max: 1.0,
        default: 0.6,
    },
];

impl ParamId {
    pub const COUNT: usize = 5;

    /// Every parameter, in declaration order.
    pub const ALL: [ParamId; ParamId::COUNT] = [
        ParamId::Mode,
        ParamId::DelayTimeMs,
        ParamId::Feedback,
        ParamId::Wet,
        ParamId::RoomSize,
    ];

    pub fn spec(self) -> &'static ParamSpec {
        &SPECS[self as usize]
    }

    /// Look up a parameter by its stable string ID.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.spec().id == id)
    }
}

/// All parameter values for one block, read once at block start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub mode: Mode,
    pub delay_time_ms: f32,
    pub feedback: f32,
    pub wet: f32,
    pub room_size: f32,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            mode: Mode::from_value(ParamId::Mode.spec().default),
            delay_time_ms: ParamId::DelayTimeMs.spec().default,
            feedback: ParamId::Feedback.spec().default,
            wet: ParamId::Wet.spec().default,
            room_size: ParamId::RoomSize.spec().default,
        }
    }
}

/// Thread-safe parameter values shared between the control surface and
/// the audio thread.
///
/// Each value is an independent `AtomicF32`, so a read never blocks and
/// never observes half of a write. `Relaxed` ordering is enough: the
/// parameters do not guard any other memory.
pub struct ParamStore {
    values: [AtomicF32; ParamId::COUNT],
}

impl Default for ParamStore {
    fn default() -> Self {
        Self {
            values: ParamId::ALL.map(|id| AtomicF32::new(id.spec().default)),
        }
    }
}

impl ParamStore {
    /// Publish a new value, clamped to the parameter's range.
    pub fn set(&self, id: ParamId, value: f32) {
        let spec = id.spec();
        let value = match id {
            // Discrete: snap to the nearest variant index.
            ParamId::Mode => spec.clamp(value.round()),
            _ => spec.clamp(value),
        };
        self.values[id as usize].store(value, Ordering::Relaxed);
    }

    /// The most recently published value.
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id as usize].load(Ordering::Relaxed)
    }

    pub fn mode(&self) -> Mode {
        Mode::from_value(self.get(ParamId::Mode))
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            mode: self.mode(),
            delay_time_ms: self.get(ParamId::DelayTimeMs),
            feedback: self.get(ParamId::Feedback),
            wet: self.get(ParamId::Wet),
            room_size: self.get(ParamId::RoomSize),
        }
    }

    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.set(id, id.spec().default);
        }
    }
}

/// All user-facing parameters of the plugin, as registered with the host.
///
/// No smoothing is applied: the engine samples every value once per
/// block, so a knob move lands at the next block boundary.
#[derive(Params)]
pub struct PluginParams {
    /// **Mode**: delay or reverb. The two never run at the same time.
    #[id = "mode"]
    pub mode: EnumParam<Mode>,

    /// **Delay Time**: distance between the input and its first echo.
    ///
    /// Range: 1ms to 1000ms, default 350ms. The skew gives the short
    /// (slapback) end of the range more knob travel.
    #[id = "delayTimeMs"]
    pub delay_time: FloatParam,

    /// **Feedback**: how much of each echo is fed back into the delay
    /// line. Capped at 95% so the repeats always decay.
    #[id = "feedback"]
    pub feedback: FloatParam,

    /// **Wet**: dry/wet balance, shared by both modes.
    #[id = "wet"]
    pub wet: FloatParam,

    /// **Room Size**: size of the simulated space in reverb mode.
    #[id = "roomSize"]
    pub room_size: FloatParam,
}

impl PluginParams {
    /// Build the host surface and attach every parameter to `store`.
    pub fn new(store: Arc<ParamStore>) -> Self {
        Self {
            mode: EnumParam::new(ParamId::Mode.spec().name, Mode::Delay)
                .with_callback(publish_mode(store.clone())),

            delay_time: float_param(
                ParamId::DelayTimeMs,
                // Negative skew = more resolution at the low end.
                FloatRange::skew_factor(-1.0),
                store.clone(),
            )
            .with_unit(" ms")
            .with_step_size(0.01),

            feedback: float_param(
                ParamId::Feedback,
                FloatRange::skew_factor(-1.0),
                store.clone(),
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            wet: float_param(ParamId::Wet, 1.0, store.clone())
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            room_size: float_param(ParamId::RoomSize, 0.7, store)
                .with_value_to_string(formatters::v2s_f32_rounded(2)),
        }
    }
}

impl Default for PluginParams {
    fn default() -> Self {
        Self::new(Arc::new(ParamStore::default()))
    }
}

/// A float parameter declared by `id`, publishing every change into
/// `store`. A skew `factor` of exactly 1.0 gives a linear range.
fn float_param(id: ParamId, factor: f32, store: Arc<ParamStore>) -> FloatParam {
    let spec = id.spec();
    let range = if factor == 1.0 {
        FloatRange::Linear {
            min: spec.min,
            max: spec.max,
        }
    } else {
        FloatRange::Skewed {
            min: spec.min,
            max: spec.max,
            factor,
        }
    };

    FloatParam::new(spec.name, spec.default, range)
        .with_callback(Arc::new(move |value: f32| store.set(id, value)))
}

fn publish_mode(store: Arc<ParamStore>) -> Arc<dyn Fn(Mode) + Send + Sync> {
    Arc::new(move |mode: Mode| store.set(ParamId::Mode, mode.as_value()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The declared defaults must be what a fresh store hands out.
    #[test]
    fn test_store_starts_at_defaults() {
        let store = ParamStore::default();

        assert_eq!(store.mode(), Mode::Delay);
        assert_eq!(store.get(ParamId::DelayTimeMs), 350.0);
        assert_eq!(store.get(ParamId::Feedback), 0.4);
        assert_eq!(store.get(ParamId::Wet), 0.35);
        assert_eq!(store.get(ParamId::RoomSize), 0.6);
        assert_eq!(store.snapshot(), ParamSnapshot::default());
    }

    /// Out-of-range writes are clamped rather than rejected.
    #[test]
    fn test_set_clamps_to_range() {
        let store = ParamStore::default();

        store.set(ParamId::DelayTimeMs, 5000.0);
        assert_eq!(store.get(ParamId::DelayTimeMs), 1000.0);
        store.set(ParamId::DelayTimeMs, 0.0);
        assert_eq!(store.get(ParamId::DelayTimeMs), 1.0);

        store.set(ParamId::Feedback, 1.5);
        assert_eq!(store.get(ParamId::Feedback), 0.95);

        store.set(ParamId::Wet, -0.2);
        assert_eq!(store.get(ParamId::Wet), 0.0);

        store.set(ParamId::RoomSize, 0.0);
        assert_eq!(store.get(ParamId::RoomSize), 0.1);
    }

    #[test]
    fn test_nan_falls_back_to_default() {
        let store = ParamStore::default();
        store.set(ParamId::Feedback, 0.9);
        store.set(ParamId::Feedback, f32::NAN);
        assert_eq!(store.get(ParamId::Feedback), 0.4);
    }

    /// Mode is discrete: fractional writes snap to a variant.
    #[test]
    fn test_mode_snaps_to_variant() {
        let store = ParamStore::default();

        store.set(ParamId::Mode, 0.7);
        assert_eq!(store.mode(), Mode::Reverb);
        assert_eq!(store.get(ParamId::Mode), 1.0);

        store.set(ParamId::Mode, 0.2);
        assert_eq!(store.mode(), Mode::Delay);

        store.set(ParamId::Mode, 7.0);
        assert_eq!(store.mode(), Mode::Reverb);
    }

    #[test]
    fn test_reset_to_defaults() {
        let store = ParamStore::default();
        store.set(ParamId::Mode, 1.0);
        store.set(ParamId::Wet, 1.0);

        store.reset_to_defaults();
        assert_eq!(store.snapshot(), ParamSnapshot::default());
    }

    #[test]
    fn test_lookup_by_string_id() {
        for id in ParamId::ALL {
            assert_eq!(ParamId::from_id(id.spec().id), Some(id));
        }
        assert_eq!(ParamId::from_id("filterCutoff"), None);
    }

    /// Writes from another thread become visible to the reader without
    /// any locking.
    #[test]
    fn test_concurrent_writer_is_visible() {
        let store = Arc::new(ParamStore::default());
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..=100 {
                    store.set(ParamId::Wet, i as f32 / 100.0);
                }
            })
        };
        writer.join().unwrap();

        assert_eq!(store.get(ParamId::Wet), 1.0);
    }

    /// The host surface starts at the same values as the store.
    #[test]
    fn test_host_surface_matches_store_defaults() {
        let store = Arc::new(ParamStore::default());
        let params = PluginParams::new(store.clone());

        assert_eq!(params.mode.value(), store.mode());
        assert_eq!(params.delay_time.value(), store.get(ParamId::DelayTimeMs));
        assert_eq!(params.feedback.value(), store.get(ParamId::Feedback));
        assert_eq!(params.wet.value(), store.get(ParamId::Wet));
        assert_eq!(params.room_size.value(), store.get(ParamId::RoomSize));
    }
}
