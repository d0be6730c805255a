//! Spectrum analysis and display: the audio fifo, FFT pipeline, path
//! mapping, response curve and the display refresh loop.

pub mod analyzer;
pub mod display;
pub mod fft;
pub mod fifo;
pub mod path;
pub mod response;

pub use analyzer::{spectrum_analyzer, AnalyzerConfig, AnalyzerTap, Channel, SpectrumAnalyzer, SpectrumPaths};
pub use display::{DisplayFrame, DisplayLoop};
pub use path::{PlotArea, RenderPath};
pub use response::{response_points, ResponseCurve, ResponsePoint};
