//! DSP building blocks: biquad sections, coefficient design and level helpers.

pub mod biquad;
pub mod design;
pub mod level;
