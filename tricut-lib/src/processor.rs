//! Stereo wrapper around two independent filter chains.
//!
//! [`DualChannelProcessor`] lives on the audio thread. [`ChainControls`] is
//! its shareable handle: any thread holding it can push new settings or
//! bypass counts into both chains.

use std::sync::Arc;

use log::{info, warn};
use portable_atomic::{AtomicF64, Ordering};

use crate::chain::{
    filter_chain, ChainCoefficients, ChainPosition, ChainSettings, ChainWriter, FilterChain,
    StageCoefficients,
};
use crate::constants::DEFAULT_SAMPLE_RATE;
use crate::error::ProcessError;

/// Thread-safe update handle shared by the audio thread and everything else.
pub struct ChainControls {
    left: ChainWriter,
    right: ChainWriter,
    sample_rate: AtomicF64,
}

impl ChainControls {
    /// Sample rate the chains were last prepared for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate.load(Ordering::Acquire)
    }

    /// Design and publish coefficients for both channels, waiting on any
    /// stage another writer is updating.
    ///
    /// Meant for message and timer threads, never for the audio callback.
    pub fn update_from_settings(&self, settings: &ChainSettings) -> ChainCoefficients {
        let coefficients = ChainCoefficients::from_settings(settings, self.sample_rate());
        if coefficients.degraded_count() > 0 {
            warn!(
                "{} filter stage(s) could not be designed and are bypassed ({:?})",
                coefficients.degraded_count(),
                settings
            );
        }
        self.publish(&coefficients);
        coefficients
    }

    /// Publish precomputed coefficients to both channels, waiting on busy
    /// stages.
    pub fn publish(&self, coefficients: &ChainCoefficients) {
        self.left.publish(coefficients);
        self.right.publish(coefficients);
    }

    /// Non-blocking publish for the audio thread. Stages held by another
    /// writer keep their value until the next attempt.
    pub fn try_publish(&self, coefficients: &ChainCoefficients) -> bool {
        let left = self.left.try_publish(coefficients);
        let right = self.right.try_publish(coefficients);
        left && right
    }

    /// Last value published to the left chain at `position`.
    pub fn current(&self, position: ChainPosition) -> StageCoefficients {
        self.left.current(position)
    }

    fn set_sample_rate(&self, sample_rate: f64) {
        self.sample_rate.store(sample_rate, Ordering::Release);
    }
}

#[derive(Clone, Copy)]
struct DesignCache {
    settings: ChainSettings,
    sample_rate: f64,
    coefficients: ChainCoefficients,
}

/// Two filter chains driven by the same settings.
pub struct DualChannelProcessor {
    left: FilterChain,
    right: FilterChain,
    controls: Arc<ChainControls>,
    sample_rate: f64,
    max_block_size: usize,
    prepared: bool,
    cache: Option<DesignCache>,
}

impl DualChannelProcessor {
    pub fn new() -> Self {
        let (left, left_writer) = filter_chain();
        let (right, right_writer) = filter_chain();
        Self {
            left,
            right,
            controls: Arc::new(ChainControls {
                left: left_writer,
                right: right_writer,
                sample_rate: AtomicF64::new(DEFAULT_SAMPLE_RATE),
            }),
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: 0,
            prepared: false,
            cache: None,
        }
    }

    /// Handle for updating coefficients from other threads.
    pub fn controls(&self) -> Arc<ChainControls> {
        Arc::clone(&self.controls)
    }

    /// Reset both chains for a new stream format.
    ///
    /// Must be called before the first [`process`](Self::process) and
    /// whenever the sample rate or maximum block size changes.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            warn!(
                "invalid sample rate {}; falling back to {} Hz",
                sample_rate, DEFAULT_SAMPLE_RATE
            );
            DEFAULT_SAMPLE_RATE
        };

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.controls.set_sample_rate(sample_rate);
        self.cache = None;
        self.left.reset();
        self.right.reset();
        self.prepared = true;

        info!(
            "prepared EQ: sample_rate={} Hz max_block_size={}",
            sample_rate, max_block_size
        );
    }

    /// Recompute coefficients for `settings` and hand them to both chains.
    ///
    /// Safe to call from the audio callback: the design is pure and the
    /// publish never waits. Returns `false` if some stage was busy and kept
    /// its previous value.
    pub fn update_from_settings(&mut self, settings: &ChainSettings) -> bool {
        let coefficients = match self.cache {
            Some(cache) if cache.settings == *settings && cache.sample_rate == self.sample_rate => {
                cache.coefficients
            }
            _ => {
                let coefficients = ChainCoefficients::from_settings(settings, self.sample_rate);
                self.cache = Some(DesignCache {
                    settings: *settings,
                    sample_rate: self.sample_rate,
                    coefficients,
                });
                coefficients
            }
        };
        self.controls.try_publish(&coefficients)
    }

    /// Filter one block in place.
    ///
    /// `channels` holds one (left only) or two planar buffers of equal
    /// length. Rejected blocks are left untouched.
    pub fn process(&mut self, channels: &mut [&mut [f32]]) -> Result<(), ProcessError> {
        let len = self.validate(channels)?;
        if len == 0 {
            return Ok(());
        }

        match channels {
            [left] => self.left.process(left),
            [left, right] => {
                self.left.process(left);
                self.right.process(right);
            }
            _ => return Err(ProcessError::UnsupportedChannels(channels.len())),
        }
        Ok(())
    }

    fn validate(&self, channels: &[&mut [f32]]) -> Result<usize, ProcessError> {
        if !self.prepared {
            return Err(ProcessError::NotPrepared);
        }
        if channels.is_empty() || channels.len() > 2 {
            return Err(ProcessError::UnsupportedChannels(channels.len()));
        }
        let len = channels[0].len();
        if channels.iter().any(|channel| channel.len() != len) {
            return Err(ProcessError::ChannelLengthMismatch);
        }
        if len > self.max_block_size {
            return Err(ProcessError::BlockTooLarge {
                len,
                max: self.max_block_size,
            });
        }
        Ok(len)
    }

    /// Linear magnitude of the left chain as installed, at the prepared rate.
    pub fn magnitude_response(&self, freq_hz: f64) -> f64 {
        self.left.magnitude_response(freq_hz, self.sample_rate)
    }

    /// Chain used for the left (or only) channel.
    pub fn left(&self) -> &FilterChain {
        &self.left
    }

    /// Chain used for the right channel.
    pub fn right(&self) -> &FilterChain {
        &self.right
    }

    /// Sample rate from the last [`prepare`](Self::prepare).
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Largest block [`process`](Self::process) accepts.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Whether [`prepare`](Self::prepare) has been called.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }
}

impl Default for DualChannelProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{CutGroup, Slope};

    fn busy_settings() -> ChainSettings {
        ChainSettings {
            low_cut_freq: 200.0,
            low_cut_slope: Slope::Db48,
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            ..ChainSettings::default()
        }
    }

    fn run_noise(processor: &mut DualChannelProcessor, len: usize) {
        let mut left: Vec<f32> = (0..len).map(|n| ((n * 53) % 97) as f32 / 97.0 - 0.5).collect();
        let mut right: Vec<f32> = left.iter().map(|s| -s).collect();
        processor
            .process(&mut [&mut left[..], &mut right[..]])
            .expect("process noise");
        assert!(left.iter().any(|s| s.abs() > 1e-3));
    }

    fn assert_silent_after(processor: &mut DualChannelProcessor, len: usize) {
        let mut left = vec![0.0_f32; len];
        let mut right = vec![0.0_f32; len];
        processor
            .process(&mut [&mut left[..], &mut right[..]])
            .expect("process zeros");
        assert!(left.iter().all(|s| *s == 0.0), "left kept state");
        assert!(right.iter().all(|s| *s == 0.0), "right kept state");
    }

    fn prepared(sample_rate: f64, max_block: usize) -> DualChannelProcessor {
        let mut processor = DualChannelProcessor::new();
        processor.prepare(sample_rate, max_block);
        processor
    }

    #[test]
    fn process_before_prepare_is_rejected_untouched() {
        let mut processor = DualChannelProcessor::new();
        let mut left = [0.5_f32; 4];
        let mut right = [0.5_f32; 4];
        let result = processor.process(&mut [&mut left[..], &mut right[..]]);
        assert_eq!(result, Err(ProcessError::NotPrepared));
        assert_eq!(left, [0.5; 4]);
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let mut processor = prepared(48_000.0, 4);
        let mut a = [0.0_f32; 8];
        let mut b = [0.0_f32; 8];
        let mut c = [0.0_f32; 8];
        assert_eq!(
            processor.process(&mut [&mut a[..8], &mut b[..8]]),
            Err(ProcessError::BlockTooLarge { len: 8, max: 4 })
        );
        assert_eq!(
            processor.process(&mut [&mut a[..4], &mut b[..3]]),
            Err(ProcessError::ChannelLengthMismatch)
        );
        assert_eq!(
            processor.process(&mut [&mut a[..2], &mut b[..2], &mut c[..2]]),
            Err(ProcessError::UnsupportedChannels(3))
        );
        assert_eq!(processor.process(&mut []), Err(ProcessError::UnsupportedChannels(0)));
    }

    #[test]
    fn both_channels_receive_identical_filtering() {
        let mut processor = prepared(48_000.0, 256);
        let settings = ChainSettings {
            low_cut_freq: 300.0,
            peak_gain_db: 6.0,
            peak_freq: 2000.0,
            high_cut_freq: 9000.0,
            high_cut_slope: Slope::Db24,
            ..ChainSettings::default()
        };
        assert!(processor.update_from_settings(&settings));

        let input: Vec<f32> = (0..256).map(|n| ((n * 37) % 101) as f32 / 101.0 - 0.5).collect();
        let mut left = input.clone();
        let mut right = input.clone();
        processor
            .process(&mut [&mut left[..], &mut right[..]])
            .expect("process block");
        assert_eq!(left, right);
        assert_ne!(left, input);
    }

    #[test]
    fn mono_block_uses_left_chain_only() {
        let mut processor = prepared(48_000.0, 64);
        processor.update_from_settings(&ChainSettings {
            peak_gain_db: 12.0,
            ..ChainSettings::default()
        });
        let mut mono = [1.0_f32; 64];
        processor.process(&mut [&mut mono[..]]).expect("process mono");
        assert!(!processor.left().is_bypassed(ChainPosition::Peak));
        assert!(processor.right().is_bypassed(ChainPosition::Peak));
    }

    #[test]
    fn identical_settings_give_bit_identical_coefficients() {
        let mut processor = prepared(48_000.0, 32);
        let settings = ChainSettings {
            low_cut_freq: 77.0,
            low_cut_slope: Slope::Db48,
            peak_freq: 1234.0,
            peak_gain_db: 3.5,
            peak_quality: 0.8,
            ..ChainSettings::default()
        };
        let controls = processor.controls();

        processor.update_from_settings(&settings);
        let first: Vec<_> = ChainPosition::ALL.iter().map(|p| controls.current(*p)).collect();
        processor.update_from_settings(&settings);
        let second: Vec<_> = ChainPosition::ALL.iter().map(|p| controls.current(*p)).collect();

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.bypassed, b.bypassed);
            assert_eq!(a.coefficients.b0.to_bits(), b.coefficients.b0.to_bits());
            assert_eq!(a.coefficients.b1.to_bits(), b.coefficients.b1.to_bits());
            assert_eq!(a.coefficients.b2.to_bits(), b.coefficients.b2.to_bits());
            assert_eq!(a.coefficients.a1.to_bits(), b.coefficients.a1.to_bits());
            assert_eq!(a.coefficients.a2.to_bits(), b.coefficients.a2.to_bits());
        }

        let fresh = ChainCoefficients::from_settings(&settings, 48_000.0);
        assert_eq!(fresh.stages.to_vec(), second);
    }

    #[test]
    fn controls_update_from_other_thread() {
        let mut processor = prepared(44_100.0, 16);
        let controls = processor.controls();
        let handle = std::thread::spawn(move || {
            controls.update_from_settings(&ChainSettings {
                high_cut_freq: 500.0,
                high_cut_slope: Slope::Db36,
                ..ChainSettings::default()
            })
        });
        let published = handle.join().expect("update thread");

        let mut left = [0.0_f32; 16];
        let mut right = [0.0_f32; 16];
        processor.process(&mut [&mut left[..], &mut right[..]]).expect("process");
        assert_eq!(processor.left().active_count(CutGroup::HighCut), 3);
        assert_eq!(
            processor.magnitude_response(500.0),
            published.magnitude_response(500.0, 44_100.0)
        );
    }

    #[test]
    fn prepare_clears_delay_lines() {
        let mut processor = prepared(48_000.0, 512);
        assert!(processor.update_from_settings(&busy_settings()));
        run_noise(&mut processor, 512);

        processor.prepare(48_000.0, 512);
        assert!(processor.update_from_settings(&busy_settings()));
        assert!(!processor.left().is_bypassed(ChainPosition::LowCut(3)));
        assert_silent_after(&mut processor, 512);
    }

    #[test]
    fn prepare_with_new_rate_clears_delay_lines() {
        let mut processor = prepared(44_100.0, 256);
        assert!(processor.update_from_settings(&busy_settings()));
        run_noise(&mut processor, 256);

        processor.prepare(96_000.0, 256);
        assert!(processor.update_from_settings(&busy_settings()));
        assert_eq!(processor.controls().sample_rate(), 96_000.0);
        assert_silent_after(&mut processor, 256);
    }

    #[test]
    fn invalid_sample_rate_falls_back_to_default() {
        let processor = prepared(f64::NAN, 8);
        assert_eq!(processor.sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(processor.controls().sample_rate(), DEFAULT_SAMPLE_RATE);
    }
}
