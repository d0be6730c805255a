//! # tricut
//!
//! Real-time core of a three-band parametric equalizer: a low-cut filter, a
//! peak filter and a high-cut filter in series, applied identically to left
//! and right channels.
//!
//! The crate supplies the coefficient factory, the per-channel filter chain
//! with its lock-free coefficient handoff, a host-style parameter store, and
//! a spectrum analyzer that turns the processed signal into renderable
//! paths on a background thread.

pub mod analysis;
pub mod chain;
pub mod constants;
pub mod diagnostics;
pub mod dsp;
pub mod equalizer;
pub mod error;
pub mod params;
pub mod processor;

pub use chain::{ChainSettings, Slope};
pub use equalizer::EqualizerProcessor;
pub use error::{ParameterError, ProcessError, StateError};
pub use params::{ParameterId, ParameterStore};
pub use processor::{ChainControls, DualChannelProcessor};
