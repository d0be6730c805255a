//! Mapping spectra onto a plot: log-frequency x, linear dB y.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_FREQ_HZ, MIN_FREQ_HZ};

/// Rectangle a path is drawn into. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for PlotArea {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 600.0,
            height: 200.0,
        }
    }
}

impl PlotArea {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
}

/// Polyline for one channel. Replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPath {
    points: Vec<PathPoint>,
    plot: PlotArea,
    floor_db: f32,
    ceiling_db: f32,
}

impl RenderPath {
    pub fn empty(plot: PlotArea, floor_db: f32, ceiling_db: f32) -> Self {
        Self {
            points: Vec::new(),
            plot,
            floor_db,
            ceiling_db,
        }
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn plot(&self) -> PlotArea {
        self.plot
    }

    /// Highest point on screen, i.e. the loudest bin.
    pub fn peak(&self) -> Option<PathPoint> {
        self.points
            .iter()
            .copied()
            .fold(None, |best: Option<PathPoint>, point| match best {
                Some(current) if current.y <= point.y => Some(current),
                _ => Some(point),
            })
    }

    /// Frequency a point's x coordinate stands for.
    pub fn frequency_at(&self, point: PathPoint) -> f32 {
        let proportion = if self.plot.width > 0.0 {
            (point.x - self.plot.x) / self.plot.width
        } else {
            0.0
        };
        map_to_log10(proportion, MIN_FREQ_HZ, MAX_FREQ_HZ)
    }

    /// Level a point's y coordinate stands for.
    pub fn level_at(&self, point: PathPoint) -> f32 {
        jmap(
            point.y,
            self.plot.bottom(),
            self.plot.y,
            self.floor_db,
            self.ceiling_db,
        )
    }
}

/// Map a 0..1 proportion to a value on a log10 scale between `min` and `max`.
pub fn map_to_log10(proportion: f32, min: f32, max: f32) -> f32 {
    min * (max / min).powf(proportion)
}

/// Inverse of [`map_to_log10`].
pub fn map_from_log10(value: f32, min: f32, max: f32) -> f32 {
    (value / min).log10() / (max / min).log10()
}

/// Linear remap of `value` from one range onto another.
pub fn jmap(value: f32, src_min: f32, src_max: f32, dst_min: f32, dst_max: f32) -> f32 {
    if src_max == src_min {
        return dst_min;
    }
    dst_min + (value - src_min) * (dst_max - dst_min) / (src_max - src_min)
}

/// Convert one dB spectrum into a path.
///
/// Bins outside 20 Hz..20 kHz are skipped. `resolution` keeps every n-th
/// bin. Levels are clamped to `[floor_db, ceiling_db]` before mapping.
pub fn generate_path(
    fft_data: &[f32],
    bin_width_hz: f32,
    plot: PlotArea,
    floor_db: f32,
    ceiling_db: f32,
    resolution: usize,
) -> RenderPath {
    let mut path = RenderPath::empty(plot, floor_db, ceiling_db);
    if bin_width_hz.is_nan() || bin_width_hz <= 0.0 {
        return path;
    }

    path.points.reserve(fft_data.len() / resolution.max(1) + 1);
    for (bin, db) in fft_data.iter().enumerate().step_by(resolution.max(1)) {
        let freq = bin as f32 * bin_width_hz;
        if !(MIN_FREQ_HZ..=MAX_FREQ_HZ).contains(&freq) || !db.is_finite() {
            continue;
        }
        let x = plot.x + plot.width * map_from_log10(freq, MIN_FREQ_HZ, MAX_FREQ_HZ);
        let level = db.clamp(floor_db, ceiling_db);
        let y = jmap(level, floor_db, ceiling_db, plot.bottom(), plot.y);
        path.points.push(PathPoint { x, y });
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mapping_round_trips() {
        assert!((map_to_log10(0.0, 20.0, 20_000.0) - 20.0).abs() < 1e-3);
        assert!((map_to_log10(1.0, 20.0, 20_000.0) - 20_000.0).abs() < 1e-1);
        assert!((map_to_log10(1.0 / 3.0, 20.0, 20_000.0) - 200.0).abs() < 0.1);
        assert!((map_from_log10(2_000.0, 20.0, 20_000.0) - 2.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn jmap_maps_linearly() {
        assert_eq!(jmap(0.0, -48.0, 0.0, 200.0, 0.0), 0.0);
        assert_eq!(jmap(-48.0, -48.0, 0.0, 200.0, 0.0), 200.0);
        assert_eq!(jmap(-24.0, -48.0, 0.0, 200.0, 0.0), 100.0);
        assert_eq!(jmap(1.0, 1.0, 1.0, 5.0, 9.0), 5.0);
    }

    #[test]
    fn path_skips_out_of_band_bins_and_clamps_levels() {
        let plot = PlotArea::new(10.0, 20.0, 300.0, 100.0);
        // Bin width 10 Hz: bins 0 and 1 fall below 20 Hz.
        let data = vec![-10.0_f32, -10.0, 12.0, -100.0, -24.0];
        let path = generate_path(&data, 10.0, plot, -48.0, 0.0, 1);

        assert_eq!(path.len(), 3);
        let first = path.points()[0];
        assert!((first.x - 10.0).abs() < 1e-4);
        assert_eq!(first.y, 20.0);
        assert_eq!(path.points()[1].y, 120.0);
        assert!((path.level_at(path.points()[2]) + 24.0).abs() < 1e-4);
    }

    #[test]
    fn peak_reports_loudest_point() {
        let plot = PlotArea::default();
        let mut data = vec![-48.0_f32; 1024];
        data[100] = -6.0;
        let path = generate_path(&data, 10.0, plot, -48.0, 0.0, 1);
        let peak = path.peak().expect("non-empty path");
        assert!((path.frequency_at(peak) - 1000.0).abs() < 0.5);
        assert!((path.level_at(peak) + 6.0).abs() < 1e-3);
    }

    #[test]
    fn resolution_thins_the_path() {
        let data = vec![-20.0_f32; 400];
        let full = generate_path(&data, 25.0, PlotArea::default(), -48.0, 0.0, 1);
        let thinned = generate_path(&data, 25.0, PlotArea::default(), -48.0, 0.0, 4);
        assert!(thinned.len() < full.len());
        assert!(!thinned.is_empty());
    }
}
