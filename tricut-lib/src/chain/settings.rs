//! Settings snapshot consumed by the coefficient factory.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_FREQ_HZ, MAX_GAIN_DB, MAX_Q, MIN_FREQ_HZ, MIN_GAIN_DB, MIN_Q};
use crate::dsp::level::deserialize_db_gain;

const DEFAULT_LOW_CUT_FREQ_HZ: f32 = MIN_FREQ_HZ;
const DEFAULT_HIGH_CUT_FREQ_HZ: f32 = MAX_FREQ_HZ;
const DEFAULT_PEAK_FREQ_HZ: f32 = 750.0;
const DEFAULT_PEAK_GAIN_DB: f32 = 0.0;
const DEFAULT_PEAK_QUALITY: f32 = 1.0;

/// Cut filter steepness.
///
/// The variant index selects how many 2nd-order sections are cascaded:
/// `Db12` uses one, `Db48` uses four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    #[serde(rename = "12", alias = "12 dB/Oct", alias = "12 db/Oct")]
    Db12,
    #[serde(rename = "24", alias = "24 dB/Oct", alias = "24 db/Oct")]
    Db24,
    #[serde(rename = "36", alias = "36 dB/Oct", alias = "36 db/Oct")]
    Db36,
    #[serde(rename = "48", alias = "48 dB/Oct", alias = "48 db/Oct")]
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Choice index as stored by the host (0..=3).
    pub fn index(self) -> usize {
        match self {
            Slope::Db12 => 0,
            Slope::Db24 => 1,
            Slope::Db36 => 2,
            Slope::Db48 => 3,
        }
    }

    /// Map a host choice index to a slope; out-of-range indices saturate.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Number of cascaded biquad sections.
    pub fn section_count(self) -> usize {
        self.index() + 1
    }

    /// Butterworth filter order.
    pub fn order(self) -> usize {
        self.section_count() * 2
    }

    pub fn db_per_octave(self) -> u32 {
        12 * self.section_count() as u32
    }
}

/// Immutable snapshot of every user-facing EQ parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    #[serde(alias = "LowCut Freq", alias = "low_cut_freq_hz")]
    pub low_cut_freq: f32,
    #[serde(alias = "HighCut Freq", alias = "high_cut_freq_hz")]
    pub high_cut_freq: f32,
    #[serde(alias = "Peak Freq", alias = "peak_freq_hz")]
    pub peak_freq: f32,
    #[serde(
        alias = "Peak Gain",
        alias = "peak_gain",
        deserialize_with = "deserialize_db_gain"
    )]
    pub peak_gain_db: f32,
    #[serde(alias = "Peak Quality", alias = "peak_q")]
    pub peak_quality: f32,
    #[serde(alias = "LowCut Slope")]
    pub low_cut_slope: Slope,
    #[serde(alias = "HighCut Slope")]
    pub high_cut_slope: Slope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            low_cut_freq: DEFAULT_LOW_CUT_FREQ_HZ,
            high_cut_freq: DEFAULT_HIGH_CUT_FREQ_HZ,
            peak_freq: DEFAULT_PEAK_FREQ_HZ,
            peak_gain_db: DEFAULT_PEAK_GAIN_DB,
            peak_quality: DEFAULT_PEAK_QUALITY,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
        }
    }
}

impl ChainSettings {
    /// Copy of these settings with every field forced into its legal range.
    ///
    /// Non-finite values fall back to the parameter default.
    pub fn sanitized(&self) -> Self {
        Self {
            low_cut_freq: sanitize_freq(self.low_cut_freq, DEFAULT_LOW_CUT_FREQ_HZ),
            high_cut_freq: sanitize_freq(self.high_cut_freq, DEFAULT_HIGH_CUT_FREQ_HZ),
            peak_freq: sanitize_freq(self.peak_freq, DEFAULT_PEAK_FREQ_HZ),
            peak_gain_db: sanitize(self.peak_gain_db, MIN_GAIN_DB, MAX_GAIN_DB, DEFAULT_PEAK_GAIN_DB),
            peak_quality: sanitize(self.peak_quality, MIN_Q, MAX_Q, DEFAULT_PEAK_QUALITY),
            low_cut_slope: self.low_cut_slope,
            high_cut_slope: self.high_cut_slope,
        }
    }
}

fn sanitize_freq(freq_hz: f32, fallback: f32) -> f32 {
    sanitize(freq_hz, MIN_FREQ_HZ, MAX_FREQ_HZ, fallback)
}

fn sanitize(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}
