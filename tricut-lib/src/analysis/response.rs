//! Static frequency response of a settings snapshot, for drawing and export.

use serde::{Deserialize, Serialize};

use crate::analysis::path::{jmap, map_to_log10, PathPoint, PlotArea};
use crate::chain::{ChainCoefficients, ChainSettings};
use crate::constants::{MAX_FREQ_HZ, MIN_FREQ_HZ, RESPONSE_CURVE_RANGE_DB};
use crate::dsp::level::linear_to_db;

/// One column of the response curve per horizontal pixel of the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCurve {
    magnitudes_db: Vec<f64>,
    points: Vec<PathPoint>,
}

impl ResponseCurve {
    pub fn empty() -> Self {
        Self {
            magnitudes_db: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn compute(settings: &ChainSettings, sample_rate: f64, plot: PlotArea) -> Self {
        let chain = ChainCoefficients::from_settings(settings, sample_rate);
        Self::from_chain(&chain, sample_rate, plot)
    }

    /// Sweep 20 Hz..20 kHz logarithmically across the plot width and map
    /// each column's level over +/-24 dB onto the plot height.
    pub fn from_chain(chain: &ChainCoefficients, sample_rate: f64, plot: PlotArea) -> Self {
        let columns = plot.width.max(0.0) as usize;
        let mut magnitudes_db = Vec::with_capacity(columns);
        let mut points = Vec::with_capacity(columns);

        for column in 0..columns {
            let proportion = column as f32 / columns as f32;
            let freq = map_to_log10(proportion, MIN_FREQ_HZ, MAX_FREQ_HZ) as f64;
            let db = linear_to_db(chain.magnitude_response(freq, sample_rate));
            let y = jmap(
                db as f32,
                -RESPONSE_CURVE_RANGE_DB as f32,
                RESPONSE_CURVE_RANGE_DB as f32,
                plot.bottom(),
                plot.y,
            );
            magnitudes_db.push(db);
            points.push(PathPoint {
                x: plot.x + column as f32,
                y,
            });
        }

        Self {
            magnitudes_db,
            points,
        }
    }

    pub fn magnitudes_db(&self) -> &[f64] {
        &self.magnitudes_db
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }
}

/// Response sample exported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponsePoint {
    pub freq_hz: f64,
    pub gain_db: f64,
}

/// `count` log-spaced response samples between 20 Hz and 20 kHz inclusive.
pub fn response_points(settings: &ChainSettings, sample_rate: f64, count: usize) -> Vec<ResponsePoint> {
    let chain = ChainCoefficients::from_settings(settings, sample_rate);
    let last = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|index| {
            let freq_hz = map_to_log10(index as f32 / last, MIN_FREQ_HZ, MAX_FREQ_HZ) as f64;
            ResponsePoint {
                freq_hz,
                gain_db: linear_to_db(chain.magnitude_response(freq_hz, sample_rate)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Slope;

    #[test]
    fn curve_has_one_point_per_column() {
        let plot = PlotArea::new(5.0, 0.0, 320.0, 96.0);
        let curve = ResponseCurve::compute(&ChainSettings::default(), 48_000.0, plot);
        assert_eq!(curve.points().len(), 320);
        assert_eq!(curve.magnitudes_db().len(), 320);
        assert_eq!(curve.points()[0].x, 5.0);
        // Flat settings sit on the 0 dB line in the middle of the plot.
        let mid = curve.points()[160];
        assert!((mid.y - 48.0).abs() < 0.5, "{}", mid.y);
    }

    #[test]
    fn boosted_peak_rises_above_center_line() {
        let settings = ChainSettings {
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            ..ChainSettings::default()
        };
        let points = response_points(&settings, 48_000.0, 61);
        assert_eq!(points.len(), 61);
        assert!((points[0].freq_hz - 20.0).abs() < 0.01);
        assert!((points[60].freq_hz - 20_000.0).abs() < 1.0);
        let loudest = points
            .iter()
            .fold(f64::MIN, |acc, point| acc.max(point.gain_db));
        assert!(loudest > 11.0 && loudest <= 12.01);
    }

    #[test]
    fn curve_matches_chain_response() {
        let settings = ChainSettings {
            low_cut_freq: 200.0,
            low_cut_slope: Slope::Db48,
            ..ChainSettings::default()
        };
        let chain = ChainCoefficients::from_settings(&settings, 44_100.0);
        let points = response_points(&settings, 44_100.0, 10);
        for point in points {
            let expected = linear_to_db(chain.magnitude_response(point.freq_hz, 44_100.0));
            assert_eq!(point.gain_db, expected);
        }
    }
}
