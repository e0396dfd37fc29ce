//! # Reverb
//!
//! The reverb algorithm itself comes from the `freeverb` crate and is
//! treated as a black box. This module only defines the capability the
//! engine needs from a reverb ([`ReverbProcessor`]) and the
//! [`ReverbAdapter`] that keeps its room size and dry/wet levels in sync
//! with the parameters before every block.

use freeverb::Freeverb;

/// Lowest sample rate Freeverb can be built at. Its delay lengths are
/// `tuning * sample_rate / 44100` samples and the shortest tuning is 225,
/// so below this rate that line would be empty.
pub const MIN_FREEVERB_SAMPLE_RATE: f64 = 44100.0 / 225.0;

/// The reverb's parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParameters {
    pub room_size: f32,
    pub damping: f32,
    pub width: f32,
    pub wet_level: f32,
    pub dry_level: f32,
}

impl Default for ReverbParameters {
    /// The snapshot installed at `prepare()` time.
    fn default() -> Self {
        Self {
            room_size: 0.6,
            damping: 0.5,
            width: 1.0,
            wet_level: 0.3,
            dry_level: 0.7,
        }
    }
}

/// What the engine needs from a reverb implementation.
///
/// Both processing calls work in place and must not allocate or block.
pub trait ReverbProcessor: Send {
    /// Configure for a new sample rate. Called from the lifecycle path
    /// only, so implementations may allocate here.
    fn prepare(&mut self, sample_rate: f64);

    fn parameters(&self) -> ReverbParameters;

    fn set_parameters(&mut self, parameters: ReverbParameters);

    fn process_mono(&mut self, samples: &mut [f32]);

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]);
}

/// [`ReverbProcessor`] backed by [`Freeverb`].
///
/// Freeverb takes the sample rate at construction, so the instance is
/// built in `prepare()`. Until then (or after a prepare with an unusable
/// sample rate) audio passes through unchanged.
#[derive(Default)]
pub struct FreeverbReverb {
    reverb: Option<Freeverb>,
    parameters: ReverbParameters,
}

impl FreeverbReverb {
    fn apply_parameters(&mut self) {
        let Some(reverb) = self.reverb.as_mut() else {
            return;
        };
        let p = self.parameters;
        reverb.set_room_size(f64::from(p.room_size));
        reverb.set_dampening(f64::from(p.damping));
        reverb.set_width(f64::from(p.width));
        reverb.set_wet(f64::from(p.wet_level));
        reverb.set_dry(f64::from(p.dry_level));
    }

    pub fn is_prepared(&self) -> bool {
        self.reverb.is_some()
    }
}

impl ReverbProcessor for FreeverbReverb {
    fn prepare(&mut self, sample_rate: f64) {
        self.reverb = if sample_rate.is_finite() && sample_rate >= MIN_FREEVERB_SAMPLE_RATE {
            Some(Freeverb::new(sample_rate as usize))
        } else {
            None
        };
        self.apply_parameters();
    }

    fn parameters(&self) -> ReverbParameters {
        self.parameters
    }

    fn set_parameters(&mut self, parameters: ReverbParameters) {
        if parameters != self.parameters {
            self.parameters = parameters;
            self.apply_parameters();
        }
    }

    fn process_mono(&mut self, samples: &mut [f32]) {
        let Some(reverb) = self.reverb.as_mut() else {
            return;
        };
        for sample in samples.iter_mut() {
            let input = f64::from(*sample);
            let (left, _) = reverb.tick((input, input));
            *sample = left as f32;
        }
    }

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        let Some(reverb) = self.reverb.as_mut() else {
            return;
        };
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = reverb.tick((f64::from(*l), f64::from(*r)));
            *l = out_l as f32;
            *r = out_r as f32;
        }
    }
}

/// Drives a [`ReverbProcessor`] from the engine's per-block parameters.
pub struct ReverbAdapter<R> {
    reverb: R,
}

impl<R: ReverbProcessor> ReverbAdapter<R> {
    pub fn new(reverb: R) -> Self {
        Self { reverb }
    }

    pub fn reverb(&self) -> &R {
        &self.reverb
    }

    /// Configure the reverb for `sample_rate` and install the default
    /// parameter snapshot.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.reverb.prepare(sample_rate);
        self.reverb.set_parameters(ReverbParameters::default());
    }

    /// Sync room size and dry/wet levels, then process in place.
    ///
    /// One channel is processed as mono; with two or more, only the first
    /// two are processed as a stereo pair and the rest are left alone.
    pub fn process(&mut self, channels: &mut [&mut [f32]], room_size: f32, wet: f32) {
        let parameters = ReverbParameters {
            room_size,
            wet_level: wet,
            dry_level: 1.0 - wet,
            ..self.reverb.parameters()
        };
        self.reverb.set_parameters(parameters);

        match channels {
            [] => {}
            [mono] => self.reverb.process_mono(mono),
            [left, right, ..] => self.reverb.process_stereo(left, right),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Which processing call a [`RecordingReverb`] received.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Mono { len: usize },
        Stereo { len: usize },
    }

    /// Test double that records calls and marks processed samples.
    #[derive(Default)]
    pub struct RecordingReverb {
        pub sample_rate: Option<f64>,
        pub parameters: ReverbParameters,
        pub calls: Vec<Call>,
    }

    /// Value every processed sample is overwritten with.
    pub const MARK: f32 = 0.125;

    impl ReverbProcessor for RecordingReverb {
        fn prepare(&mut self, sample_rate: f64) {
            self.sample_rate = Some(sample_rate);
        }

        fn parameters(&self) -> ReverbParameters {
            self.parameters
        }

        fn set_parameters(&mut self, parameters: ReverbParameters) {
            self.parameters = parameters;
        }

        fn process_mono(&mut self, samples: &mut [f32]) {
            self.calls.push(Call::Mono { len: samples.len() });
            samples.fill(MARK);
        }

        fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
            self.calls.push(Call::Stereo { len: left.len() });
            left.fill(MARK);
            right.fill(MARK);
        }
    }

    #[test]
    fn test_prepare_installs_default_snapshot() {
        let mut adapter = ReverbAdapter::new(RecordingReverb {
            parameters: ReverbParameters {
                room_size: 0.1,
                damping: 0.0,
                width: 0.0,
                wet_level: 1.0,
                dry_level: 0.0,
            },
            ..Default::default()
        });

        adapter.prepare(48000.0);
        assert_eq!(adapter.reverb().sample_rate, Some(48000.0));
        assert_eq!(adapter.reverb().parameters, ReverbParameters::default());
    }

    /// Room size and dry/wet follow the block parameters; damping and
    /// width keep whatever the reverb already had.
    #[test]
    fn test_parameters_synced_before_processing() {
        let mut adapter = ReverbAdapter::new(RecordingReverb::default());
        adapter.prepare(44100.0);

        let mut samples = [0.0; 8];
        adapter.process(&mut [&mut samples], 0.9, 0.25);

        let p = adapter.reverb().parameters;
        assert_eq!(p.room_size, 0.9);
        assert_eq!(p.wet_level, 0.25);
        assert_eq!(p.dry_level, 0.75);
        assert_eq!(p.damping, 0.5);
        assert_eq!(p.width, 1.0);
    }

    #[test]
    fn test_mono_dispatch() {
        let mut adapter = ReverbAdapter::new(RecordingReverb::default());
        let mut samples = [1.0; 16];

        adapter.process(&mut [&mut samples], 0.6, 0.35);
        assert_eq!(adapter.reverb().calls, vec![Call::Mono { len: 16 }]);
        assert!(samples.iter().all(|&s| s == MARK));
    }

    /// Only the first two channels reach the stereo reverb.
    #[test]
    fn test_stereo_dispatch_leaves_extra_channels() {
        let mut adapter = ReverbAdapter::new(RecordingReverb::default());
        let mut left = [1.0; 4];
        let mut right = [1.0; 4];
        let mut center = [1.0; 4];

        adapter.process(&mut [&mut left, &mut right, &mut center], 0.6, 0.35);
        assert_eq!(adapter.reverb().calls, vec![Call::Stereo { len: 4 }]);
        assert!(left.iter().chain(right.iter()).all(|&s| s == MARK));
        assert!(center.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_no_channels_is_noop() {
        let mut adapter = ReverbAdapter::new(RecordingReverb::default());
        adapter.process(&mut [], 0.6, 0.35);
        assert!(adapter.reverb().calls.is_empty());
    }

    /// Unprepared Freeverb passes audio through.
    #[test]
    fn test_freeverb_unprepared_passes_through() {
        let mut reverb = FreeverbReverb::default();
        let mut samples = [0.5, -0.5, 0.25];

        reverb.process_mono(&mut samples);
        assert_eq!(samples, [0.5, -0.5, 0.25]);

        reverb.prepare(0.0);
        assert!(!reverb.is_prepared());
    }

    /// Rates the delay accepts but Freeverb can't be built at leave the
    /// reverb unprepared, so reverb mode passes audio through.
    #[test]
    fn test_freeverb_below_minimum_rate_passes_through() {
        let mut adapter = ReverbAdapter::new(FreeverbReverb::default());
        adapter.prepare(100.0);
        assert!(!adapter.reverb().is_prepared());

        let mut samples = [0.5; 8];
        adapter.process(&mut [&mut samples], 0.6, 0.35);
        assert!(samples.iter().all(|&s| s == 0.5));

        let mut left = [0.25; 8];
        let mut right = [-0.25; 8];
        adapter.process(&mut [&mut left, &mut right], 0.6, 0.35);
        assert!(left.iter().all(|&s| s == 0.25));
        assert!(right.iter().all(|&s| s == -0.25));
    }

    /// The lowest accepted rate builds delay lines of at least one sample.
    #[test]
    fn test_freeverb_at_minimum_rate_processes() {
        let mut adapter = ReverbAdapter::new(FreeverbReverb::default());
        adapter.prepare(MIN_FREEVERB_SAMPLE_RATE.ceil());
        assert!(adapter.reverb().is_prepared());

        let mut samples = [0.5; 64];
        adapter.process(&mut [&mut samples], 0.6, 0.35);
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    /// A wet reverb rings on long after the impulse.
    #[test]
    fn test_freeverb_produces_tail() {
        let mut adapter = ReverbAdapter::new(FreeverbReverb::default());
        adapter.prepare(44100.0);
        assert!(adapter.reverb().is_prepared());

        let mut left = vec![0.0; 8192];
        let mut right = vec![0.0; 8192];
        left[0] = 1.0;
        right[0] = 1.0;
        adapter.process(&mut [&mut left, &mut right], 0.8, 1.0);

        let late_energy: f32 = left[2048..].iter().map(|s| s * s).sum();
        assert!(late_energy > 0.0, "expected a reverb tail");
        assert!(left.iter().chain(right.iter()).all(|s| s.is_finite()));
    }

    /// Re-preparing builds a fresh instance: silence in, silence out.
    #[test]
    fn test_freeverb_prepare_drops_tail() {
        let mut adapter = ReverbAdapter::new(FreeverbReverb::default());
        adapter.prepare(44100.0);

        let mut burst = vec![1.0; 512];
        adapter.process(&mut [&mut burst], 0.8, 1.0);

        adapter.prepare(44100.0);
        let mut silence = vec![0.0; 1024];
        adapter.process(&mut [&mut silence], 0.8, 1.0);
        assert!(silence.iter().all(|&s| s == 0.0));
    }
}
