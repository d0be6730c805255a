//! Helpers for parsing and converting linear and dB gain values.

use serde::de::{Error as DeError, Visitor};
use serde::Deserializer;
use std::fmt;

/// Convert a linear gain to dB.
pub fn linear_to_db(value: f64) -> f64 {
    let v = value.max(f64::MIN_POSITIVE);
    20.0 * v.log10()
}

/// Convert a linear gain to dB, treating `floor_db` as negative infinity.
///
/// Silence, negative values and NaN all map to `floor_db`, so the result is
/// always finite and never below the floor.
pub fn gain_to_db_floored(gain: f32, floor_db: f32) -> f32 {
    if gain.is_nan() || gain <= 0.0 {
        return floor_db;
    }
    let db = 20.0 * gain.log10();
    if db.is_finite() {
        db.max(floor_db)
    } else {
        floor_db
    }
}

/// Deserialize a dB gain that may be written as a number or a string like `"+6 dB"`.
pub fn deserialize_db_gain<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    struct DbVisitor;

    impl<'de> Visitor<'de> for DbVisitor {
        type Value = f32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a string like \"6db\"")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(value as f32)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(value as f32)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(value as f32)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            parse_db_str(value)
                .ok_or_else(|| DeError::custom(format!("invalid gain value \"{}\"", value)))
        }
    }

    deserializer.deserialize_any(DbVisitor)
}

fn parse_db_str(value: &str) -> Option<f32> {
    let lower = value.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    let number = lower.strip_suffix("db").unwrap_or(&lower);
    number.trim().trim_start_matches('+').parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_converts_to_db() {
        assert!((linear_to_db(1.995_262) - 6.0).abs() < 1e-5);
        assert!((linear_to_db(0.5) + 6.020_6).abs() < 1e-3);
        assert!(linear_to_db(0.0).is_finite());
    }

    #[test]
    fn floored_conversion_never_goes_below_floor() {
        assert_eq!(gain_to_db_floored(0.0, -48.0), -48.0);
        assert_eq!(gain_to_db_floored(-1.0, -48.0), -48.0);
        assert_eq!(gain_to_db_floored(f32::NAN, -48.0), -48.0);
        assert_eq!(gain_to_db_floored(1e-9, -48.0), -48.0);
        assert!((gain_to_db_floored(1.0, -48.0)).abs() < 1e-6);
    }

    #[test]
    fn db_strings_parse_with_or_without_suffix() {
        assert_eq!(parse_db_str("6db"), Some(6.0));
        assert_eq!(parse_db_str(" +3.5 dB "), Some(3.5));
        assert_eq!(parse_db_str("-12"), Some(-12.0));
        assert_eq!(parse_db_str("loud"), None);
        assert_eq!(parse_db_str(""), None);
    }
}
