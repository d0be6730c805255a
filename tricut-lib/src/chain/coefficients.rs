//! Full set of stage values for one chain, derived from a settings snapshot.

use crate::chain::settings::ChainSettings;
use crate::chain::stage::StageCoefficients;
use crate::chain::{ChainPosition, CutGroup, STAGE_COUNT};
use crate::dsp::design::{make_high_cut_filter, make_low_cut_filter, make_peak_filter, CutFilterDesign};

/// What every stage of a chain should hold for one settings snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainCoefficients {
    pub stages: [StageCoefficients; STAGE_COUNT],
    degraded: usize,
}

impl ChainCoefficients {
    /// Chain with every stage bypassed.
    pub fn bypassed() -> Self {
        Self {
            stages: [StageCoefficients::BYPASSED; STAGE_COUNT],
            degraded: 0,
        }
    }

    /// Run the coefficient factory for all three filters.
    pub fn from_settings(settings: &ChainSettings, sample_rate: f64) -> Self {
        let mut chain = Self::bypassed();

        let peak = make_peak_filter(settings, sample_rate);
        if peak.is_none() {
            chain.degraded += 1;
        }
        chain.stages[ChainPosition::Peak.index()] = StageCoefficients::from_design(peak);

        chain.install_cut(CutGroup::LowCut, &make_low_cut_filter(settings, sample_rate));
        chain.install_cut(CutGroup::HighCut, &make_high_cut_filter(settings, sample_rate));
        chain
    }

    fn install_cut(&mut self, group: CutGroup, design: &CutFilterDesign) {
        for (section, position) in group.positions().enumerate() {
            let value = if section < design.active {
                let section_design = design.sections[section];
                if section_design.is_none() {
                    self.degraded += 1;
                }
                StageCoefficients::from_design(section_design)
            } else {
                StageCoefficients::BYPASSED
            };
            self.stages[position.index()] = value;
        }
    }

    pub fn stage(&self, position: ChainPosition) -> StageCoefficients {
        self.stages[position.index()]
    }

    /// Number of non-bypassed sections in a cut group.
    pub fn active_count(&self, group: CutGroup) -> usize {
        group
            .positions()
            .filter(|position| !self.stage(*position).bypassed)
            .count()
    }

    /// Stages that should be active but whose design failed.
    pub fn degraded_count(&self) -> usize {
        self.degraded
    }

    /// Linear magnitude of the whole chain at `freq_hz`.
    pub fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        magnitude_of(self.stages.iter(), freq_hz, sample_rate)
    }
}

impl Default for ChainCoefficients {
    fn default() -> Self {
        Self::bypassed()
    }
}

/// Product of the responses of every non-bypassed stage.
pub(crate) fn magnitude_of<'a>(
    stages: impl Iterator<Item = &'a StageCoefficients>,
    freq_hz: f64,
    sample_rate: f64,
) -> f64 {
    stages
        .filter(|stage| !stage.bypassed)
        .map(|stage| stage.coefficients.magnitude_for_frequency(freq_hz, sample_rate))
        .product()
}
