//! Coefficient factory: turns a settings snapshot into biquad sections.
//!
//! Every function here is pure and allocation-free, so it can run on the
//! audio thread as well as on any message or timer thread.

use std::f64::consts::PI;

use crate::chain::settings::{ChainSettings, Slope};
use crate::constants::{MAX_CUT_SECTIONS, MAX_FREQ_HZ, MAX_GAIN_DB, MAX_Q, MIN_FREQ_HZ, MIN_GAIN_DB, MIN_Q};
use crate::dsp::biquad::FilterCoefficients;

/// Filters are never designed closer to Nyquist than this fraction of the
/// sample rate.
const MAX_FREQ_FRACTION_OF_SAMPLE_RATE: f64 = 0.49;

/// Sections of one cut filter, in processing order.
///
/// Only the first `active` entries belong to the design. An active entry
/// of `None` failed to produce a usable section and must be bypassed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutFilterDesign {
    pub sections: [Option<FilterCoefficients>; MAX_CUT_SECTIONS],
    pub active: usize,
}

impl CutFilterDesign {
    /// Iterate over the sections that take part in the design.
    pub fn active_sections(&self) -> impl Iterator<Item = &Option<FilterCoefficients>> {
        self.sections.iter().take(self.active)
    }
}

/// RBJ peaking section for the bell band.
pub fn make_peak_filter(settings: &ChainSettings, sample_rate: f64) -> Option<FilterCoefficients> {
    let sample_rate = sanitize_sample_rate(sample_rate)?;
    let freq_hz = sanitize_freq(settings.peak_freq as f64, sample_rate);
    let q = sanitize_q(settings.peak_quality as f64);
    let gain_db = sanitize_gain_db(settings.peak_gain_db as f64);
    checked(peaking_coefficients(sample_rate, freq_hz, q, gain_db))
}

/// Butterworth high-pass built from `slope.section_count()` cascaded sections.
pub fn make_low_cut_filter(settings: &ChainSettings, sample_rate: f64) -> CutFilterDesign {
    cut_filter(
        settings.low_cut_freq as f64,
        settings.low_cut_slope,
        sample_rate,
        high_pass_coefficients,
    )
}

/// Butterworth low-pass built from `slope.section_count()` cascaded sections.
pub fn make_high_cut_filter(settings: &ChainSettings, sample_rate: f64) -> CutFilterDesign {
    cut_filter(
        settings.high_cut_freq as f64,
        settings.high_cut_slope,
        sample_rate,
        low_pass_coefficients,
    )
}

/// Quality factor of section `index` in an order-`order` Butterworth cascade.
pub fn butterworth_section_q(index: usize, order: usize) -> f64 {
    let angle = (2 * index + 1) as f64 * PI / (2 * order) as f64;
    1.0 / (2.0 * angle.cos())
}

fn cut_filter(
    freq_hz: f64,
    slope: Slope,
    sample_rate: f64,
    design: fn(f64, f64, f64) -> FilterCoefficients,
) -> CutFilterDesign {
    let active = slope.section_count();
    let mut sections = [None; MAX_CUT_SECTIONS];

    if let Some(sample_rate) = sanitize_sample_rate(sample_rate) {
        let freq_hz = sanitize_freq(freq_hz, sample_rate);
        let order = slope.order();
        for (index, section) in sections.iter_mut().take(active).enumerate() {
            let q = butterworth_section_q(index, order);
            *section = checked(design(sample_rate, freq_hz, q));
        }
    }

    CutFilterDesign { sections, active }
}

fn checked(coeffs: FilterCoefficients) -> Option<FilterCoefficients> {
    if coeffs.is_finite() && coeffs.is_stable() {
        Some(coeffs)
    } else {
        None
    }
}

fn peaking_coefficients(sample_rate: f64, freq_hz: f64, q: f64, gain_db: f64) -> FilterCoefficients {
    let w0 = 2.0 * PI * freq_hz / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);
    let amplitude = 10.0_f64.powf(gain_db / 40.0);

    let b0 = 1.0 + alpha * amplitude;
    let b1 = -2.0 * cos_w0;
    let b2 = 1.0 - alpha * amplitude;
    let a0 = 1.0 + alpha / amplitude;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha / amplitude;

    FilterCoefficients::normalized(b0, b1, b2, a0, a1, a2)
}

fn low_pass_coefficients(sample_rate: f64, freq_hz: f64, q: f64) -> FilterCoefficients {
    let w0 = 2.0 * PI * freq_hz / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);

    let b1 = 1.0 - cos_w0;
    let b0 = b1 / 2.0;
    let b2 = b0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha;

    FilterCoefficients::normalized(b0, b1, b2, a0, a1, a2)
}

fn high_pass_coefficients(sample_rate: f64, freq_hz: f64, q: f64) -> FilterCoefficients {
    let w0 = 2.0 * PI * freq_hz / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);

    let b0 = (1.0 + cos_w0) / 2.0;
    let b1 = -1.0 - cos_w0;
    let b2 = b0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha;

    FilterCoefficients::normalized(b0, b1, b2, a0, a1, a2)
}

fn sanitize_sample_rate(sample_rate: f64) -> Option<f64> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Some(sample_rate)
    } else {
        None
    }
}

fn sanitize_freq(freq_hz: f64, sample_rate: f64) -> f64 {
    let freq_hz = if freq_hz.is_finite() {
        freq_hz.clamp(MIN_FREQ_HZ as f64, MAX_FREQ_HZ as f64)
    } else {
        MIN_FREQ_HZ as f64
    };
    freq_hz.min(sample_rate * MAX_FREQ_FRACTION_OF_SAMPLE_RATE)
}

fn sanitize_q(q: f64) -> f64 {
    if !q.is_finite() {
        return 1.0;
    }
    q.clamp(MIN_Q as f64, MAX_Q as f64)
}

fn sanitize_gain_db(gain_db: f64) -> f64 {
    if !gain_db.is_finite() {
        return 0.0;
    }
    gain_db.clamp(MIN_GAIN_DB as f64, MAX_GAIN_DB as f64)
}
