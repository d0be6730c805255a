//! Value ranges with step snapping and skewed normalisation.

/// Legal values of one parameter.
///
/// `interval` snaps plain values to a grid starting at `min` (zero disables
/// snapping). `skew` shapes the normalised mapping: values below one spend
/// more of the 0..1 travel on the low end of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub interval: f32,
    pub skew: f32,
}

impl ParameterRange {
    pub const fn new(min: f32, max: f32, interval: f32, skew: f32) -> Self {
        Self {
            min,
            max,
            interval,
            skew,
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp into the range and snap to the interval grid. NaN maps to `min`.
    pub fn constrain(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.interval <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.interval).round();
        (self.min + steps * self.interval).clamp(self.min, self.max)
    }

    /// Map a plain value to 0..1.
    pub fn to_normalized(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        let proportion = ((self.constrain(value) - self.min) / span).clamp(0.0, 1.0);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Map 0..1 back to a constrained plain value.
    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let mut proportion = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.constrain(self.min + (self.max - self.min) * proportion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREQ: ParameterRange = ParameterRange::new(20.0, 20_000.0, 1.0, 0.25);
    const GAIN: ParameterRange = ParameterRange::new(-24.0, 24.0, 0.5, 1.0);

    #[test]
    fn constrain_clamps_and_snaps() {
        assert_eq!(GAIN.constrain(30.0), 24.0);
        assert_eq!(GAIN.constrain(-100.0), -24.0);
        assert_eq!(GAIN.constrain(3.2), 3.0);
        assert_eq!(GAIN.constrain(3.3), 3.5);
        assert_eq!(GAIN.constrain(f32::NAN), -24.0);
        assert_eq!(FREQ.constrain(750.4), 750.0);
    }

    #[test]
    fn constrain_is_idempotent() {
        let q = ParameterRange::new(0.1, 10.0, 0.05, 1.0);
        for raw in [0.1_f32, 0.73, 1.0, 4.449, 9.99] {
            let once = q.constrain(raw);
            assert_eq!(q.constrain(once).to_bits(), once.to_bits());
        }
    }

    #[test]
    fn skewed_range_favours_low_frequencies() {
        let mid = FREQ.from_normalized(0.5);
        assert!(mid < 2_000.0, "midpoint was {}", mid);
        assert_eq!(FREQ.from_normalized(0.0), 20.0);
        assert_eq!(FREQ.from_normalized(1.0), 20_000.0);
    }

    #[test]
    fn normalized_round_trip_stays_on_grid() {
        for value in [20.0_f32, 100.0, 750.0, 5_000.0, 20_000.0] {
            let back = FREQ.from_normalized(FREQ.to_normalized(value));
            assert!((back - value).abs() <= 1.0, "{} came back as {}", value, back);
        }
        assert_eq!(GAIN.to_normalized(0.0), 0.5);
    }
}
