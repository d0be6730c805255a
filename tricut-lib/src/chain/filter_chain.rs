//! Nine-stage chain for one channel and the writer that feeds it.

use crate::chain::coefficients::{magnitude_of, ChainCoefficients};
use crate::chain::stage::{filter_stage, FilterStage, StageCoefficients, StageWriter};
use crate::chain::{ChainPosition, CutGroup, STAGE_COUNT};

/// Build a chain together with the writer that updates it.
///
/// Every stage starts bypassed, so a fresh chain is a pass-through.
pub fn filter_chain() -> (FilterChain, ChainWriter) {
    let mut writers = Vec::with_capacity(STAGE_COUNT);
    let stages = std::array::from_fn(|_| {
        let (stage, writer) = filter_stage();
        writers.push(writer);
        stage
    });
    (FilterChain { stages }, ChainWriter { stages: writers })
}

/// Audio-thread side: processes one channel in place.
pub struct FilterChain {
    stages: [FilterStage; STAGE_COUNT],
}

impl FilterChain {
    /// Install whatever each stage's writer published last.
    #[inline]
    pub fn refresh(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.refresh();
        }
    }

    /// Refresh, then run `samples` through every stage in chain order.
    ///
    /// Never allocates, locks or logs.
    pub fn process(&mut self, samples: &mut [f32]) {
        self.refresh();
        for stage in self.stages.iter_mut() {
            stage.process(samples);
        }
    }

    /// Linear magnitude of the installed stages at `freq_hz`.
    pub fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let installed: [StageCoefficients; STAGE_COUNT] =
            std::array::from_fn(|index| self.stages[index].installed());
        magnitude_of(installed.iter(), freq_hz, sample_rate)
    }

    /// Coefficients the stage at `position` is running with.
    pub fn installed(&self, position: ChainPosition) -> StageCoefficients {
        self.stages[position.index()].installed()
    }

    /// Whether the stage at `position` is bypassed.
    pub fn is_bypassed(&self, position: ChainPosition) -> bool {
        self.stages[position.index()].is_bypassed()
    }

    /// Number of non-bypassed sections in `group`.
    pub fn active_count(&self, group: CutGroup) -> usize {
        group
            .positions()
            .filter(|position| !self.is_bypassed(*position))
            .count()
    }

    /// Clear every delay line. Installed coefficients are kept.
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

/// Publishing side of a chain. Each stage is updated on its own; no lock
/// covers more than one stage.
pub struct ChainWriter {
    stages: Vec<StageWriter>,
}

impl ChainWriter {
    /// Publish all nine stages, waiting on any stage another writer holds.
    pub fn publish(&self, chain: &ChainCoefficients) {
        for (writer, value) in self.stages.iter().zip(chain.stages.iter()) {
            writer.publish(*value);
        }
    }

    /// Publish every stage that is free right now.
    ///
    /// Returns `false` if at least one stage was skipped.
    pub fn try_publish(&self, chain: &ChainCoefficients) -> bool {
        let mut all_published = true;
        for (writer, value) in self.stages.iter().zip(chain.stages.iter()) {
            all_published &= writer.try_publish(*value);
        }
        all_published
    }

    /// Keep the first `active_count` sections of `group` and bypass the rest.
    ///
    /// The next full publish of a [`ChainCoefficients`] overwrites this.
    pub fn set_bypass_count(&self, group: CutGroup, active_count: usize) {
        for (section, position) in group.positions().enumerate() {
            self.set_bypassed(position, section >= active_count);
        }
    }

    /// Flip one stage's bypass flag, keeping its coefficients.
    pub fn set_bypassed(&self, position: ChainPosition, bypassed: bool) {
        self.stages[position.index()].set_bypassed(bypassed);
    }

    /// Last value published for `position`.
    pub fn current(&self, position: ChainPosition) -> StageCoefficients {
        self.stages[position.index()].current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::settings::{ChainSettings, Slope};
    use crate::dsp::level::linear_to_db;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    const SAMPLE_RATE: f64 = 48_000.0;

    #[test]
    fn fresh_chain_passes_audio_through() {
        let (mut chain, _writer) = filter_chain();
        let mut block = [0.1_f32, 0.2, -0.3, 0.4];
        chain.process(&mut block);
        assert_eq!(block, [0.1, 0.2, -0.3, 0.4]);
        assert_eq!(chain.magnitude_response(1000.0, SAMPLE_RATE), 1.0);
    }

    #[test]
    fn chain_response_matches_published_design() {
        let settings = ChainSettings {
            low_cut_freq: 120.0,
            low_cut_slope: Slope::Db36,
            peak_freq: 2500.0,
            peak_gain_db: -9.0,
            ..ChainSettings::default()
        };
        let coefficients = ChainCoefficients::from_settings(&settings, SAMPLE_RATE);
        let (mut chain, writer) = filter_chain();
        writer.publish(&coefficients);
        chain.process(&mut [0.0; 8]);

        assert_eq!(chain.active_count(CutGroup::LowCut), 3);
        for hz in [40.0, 120.0, 2500.0, 12_000.0] {
            let expected = coefficients.magnitude_response(hz, SAMPLE_RATE);
            assert_eq!(chain.magnitude_response(hz, SAMPLE_RATE), expected);
        }
    }

    #[test]
    fn bypass_count_switches_sections_without_redesign() {
        let settings = ChainSettings {
            high_cut_freq: 1000.0,
            high_cut_slope: Slope::Db48,
            ..ChainSettings::default()
        };
        let (mut chain, writer) = filter_chain();
        writer.publish(&ChainCoefficients::from_settings(&settings, SAMPLE_RATE));
        writer.set_bypass_count(CutGroup::HighCut, 2);
        chain.refresh();

        assert_eq!(chain.active_count(CutGroup::HighCut), 2);
        assert!(chain.is_bypassed(ChainPosition::HighCut(2)));
        assert!(!chain.is_bypassed(ChainPosition::HighCut(1)));

        writer.set_bypass_count(CutGroup::HighCut, 4);
        chain.refresh();
        assert_eq!(chain.active_count(CutGroup::HighCut), 4);
    }

    #[test]
    fn full_publish_overrides_bypass_count() {
        let settings = ChainSettings {
            high_cut_freq: 1000.0,
            high_cut_slope: Slope::Db36,
            ..ChainSettings::default()
        };
        let coefficients = ChainCoefficients::from_settings(&settings, SAMPLE_RATE);
        let (mut chain, writer) = filter_chain();
        writer.publish(&coefficients);
        writer.set_bypass_count(CutGroup::HighCut, 1);
        chain.refresh();
        assert_eq!(chain.active_count(CutGroup::HighCut), 1);

        writer.publish(&coefficients);
        chain.refresh();
        assert_eq!(chain.active_count(CutGroup::HighCut), 3);
    }

    #[test]
    fn reset_clears_state_but_keeps_coefficients() {
        let settings = ChainSettings {
            low_cut_freq: 500.0,
            low_cut_slope: Slope::Db24,
            peak_gain_db: 9.0,
            ..ChainSettings::default()
        };
        let (mut chain, writer) = filter_chain();
        writer.publish(&ChainCoefficients::from_settings(&settings, SAMPLE_RATE));
        let mut noise: Vec<f32> = (0..256).map(|n| ((n * 31) % 89) as f32 / 89.0 - 0.5).collect();
        chain.process(&mut noise);

        chain.reset();
        assert_eq!(chain.active_count(CutGroup::LowCut), 2);
        let mut silence = [0.0_f32; 128];
        chain.process(&mut silence);
        assert!(silence.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn processed_sine_matches_predicted_attenuation() {
        let settings = ChainSettings {
            low_cut_freq: 1000.0,
            low_cut_slope: Slope::Db24,
            ..ChainSettings::default()
        };
        let (mut chain, writer) = filter_chain();
        writer.publish(&ChainCoefficients::from_settings(&settings, SAMPLE_RATE));

        let freq = 250.0;
        let mut block: Vec<f32> = (0..48_000)
            .map(|n| (2.0 * std::f64::consts::PI * freq * n as f64 / SAMPLE_RATE).sin() as f32)
            .collect();
        chain.process(&mut block);

        let tail = &block[24_000..];
        let peak = tail.iter().fold(0.0_f32, |acc, s| acc.max(s.abs())) as f64;
        let predicted = chain.magnitude_response(freq, SAMPLE_RATE);
        assert!((linear_to_db(peak) - linear_to_db(predicted)).abs() < 0.5);
    }

    #[test]
    fn concurrent_replacements_never_corrupt_output() {
        let (mut chain, writer) = filter_chain();
        let writer = Arc::new(writer);
        let done = Arc::new(AtomicBool::new(false));

        let publisher = {
            let writer = Arc::clone(&writer);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for i in 0..10_000 {
                    let slope = Slope::from_index(i % 4);
                    let settings = ChainSettings {
                        low_cut_freq: 20.0 + (i % 500) as f32 * 3.0,
                        low_cut_slope: slope,
                        high_cut_freq: 20_000.0 - (i % 700) as f32 * 20.0,
                        high_cut_slope: Slope::from_index(3 - i % 4),
                        peak_freq: 100.0 + (i % 97) as f32 * 150.0,
                        peak_gain_db: ((i % 49) as f32) - 24.0,
                        peak_quality: 0.1 + (i % 100) as f32 * 0.099,
                    };
                    writer.publish(&ChainCoefficients::from_settings(&settings, SAMPLE_RATE));
                }
                done.store(true, Ordering::Release);
            })
        };

        let mut block = [0.0_f32; 64];
        let mut phase = 0_u64;
        while !done.load(Ordering::Acquire) {
            for sample in block.iter_mut() {
                *sample = if phase % 2 == 0 { 1.0 } else { -1.0 };
                phase += 1;
            }
            chain.process(&mut block);
            for sample in block.iter() {
                assert!(sample.is_finite());
                assert!(sample.abs() < 1.0e6);
            }
        }
        publisher.join().expect("publisher thread");
    }
}
