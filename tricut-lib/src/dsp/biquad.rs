//! Second-order IIR sections: immutable coefficient sets and the delay line
//! that runs them over one channel.

use std::f64::consts::PI;

/// Values below this are flushed to zero to keep the feedback path out of
/// denormal range once the input goes silent.
const DENORMAL_FLOOR: f64 = 1.0e-20;

/// One normalized biquad (`a0 == 1`).
///
/// Values are never patched field by field: a new design produces a new
/// value which replaces the old one wholesale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
}

impl FilterCoefficients {
    /// Pass-through section.
    pub const IDENTITY: FilterCoefficients = FilterCoefficients {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a0: 1.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Build a section from raw cookbook terms, dividing everything by `a0`.
    pub fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a0: 1.0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// True when every term is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a0, self.a1, self.a2]
            .iter()
            .all(|value| value.is_finite())
    }

    /// True when both poles sit strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Linear magnitude of the section's response at `freq_hz`.
    pub fn magnitude_for_frequency(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let (sin_w, cos_w) = w.sin_cos();
        let (sin_2w, cos_2w) = (2.0 * w).sin_cos();

        let num_re = self.b0 + self.b1 * cos_w + self.b2 * cos_2w;
        let num_im = -(self.b1 * sin_w + self.b2 * sin_2w);
        let den_re = self.a0 + self.a1 * cos_w + self.a2 * cos_2w;
        let den_im = -(self.a1 * sin_w + self.a2 * sin_2w);

        let num = (num_re * num_re + num_im * num_im).sqrt();
        let den = (den_re * den_re + den_im * den_im).sqrt();
        if den <= 0.0 {
            return 0.0;
        }
        num / den
    }
}

impl Default for FilterCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Direct-form I delay line for one channel of one section.
#[derive(Clone, Copy, Debug, Default)]
pub struct BiquadState {
    x_n1: f64,
    x_n2: f64,
    y_n1: f64,
    y_n2: f64,
}

impl BiquadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one sample through `coeffs`.
    #[inline]
    pub fn process_sample(&mut self, coeffs: &FilterCoefficients, sample: f32) -> f32 {
        let x = sample as f64;
        let mut y = coeffs.b0 * x + coeffs.b1 * self.x_n1 + coeffs.b2 * self.x_n2
            - coeffs.a1 * self.y_n1
            - coeffs.a2 * self.y_n2;
        if y.abs() < DENORMAL_FLOOR {
            y = 0.0;
        }

        self.x_n2 = self.x_n1;
        self.x_n1 = x;
        self.y_n2 = self.y_n1;
        self.y_n1 = y;

        y as f32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
