//! Shared constants for filter design, analysis and display defaults.

/// Sample rate assumed until the host calls `prepare` (Hz).
pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;

/// Lowest frequency any filter or display axis accepts (Hz).
pub const MIN_FREQ_HZ: f32 = 20.0;

/// Highest frequency any filter or display axis accepts (Hz).
pub const MAX_FREQ_HZ: f32 = 20_000.0;

/// Peak gain bounds (dB).
pub const MIN_GAIN_DB: f32 = -24.0;
pub const MAX_GAIN_DB: f32 = 24.0;

/// Peak quality bounds.
pub const MIN_Q: f32 = 0.1;
pub const MAX_Q: f32 = 10.0;

/// Number of cascaded sections available to each cut filter.
pub const MAX_CUT_SECTIONS: usize = 4;

/// Refresh rate of the display loop (Hz).
pub const DISPLAY_REFRESH_HZ: u32 = 60;

/// The static response curve is drawn over +/- this many dB.
pub const RESPONSE_CURVE_RANGE_DB: f64 = 24.0;
