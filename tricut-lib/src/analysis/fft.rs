//! Windowed forward FFT producing magnitude-in-dB arrays.

use std::f32::consts::PI;

use crate::dsp::level::gain_to_db_floored;

#[cfg(not(feature = "real-fft"))]
mod complex_fft {
    use std::sync::Arc;

    use rustfft::{num_complex::Complex, Fft, FftPlanner};

    pub struct FftEngine {
        fft: Arc<dyn Fft<f32>>,
        buffer: Vec<Complex<f32>>,
        scratch: Vec<Complex<f32>>,
    }

    impl FftEngine {
        pub fn new(fft_size: usize) -> Self {
            let mut planner = FftPlanner::<f32>::new();
            let fft = planner.plan_fft_forward(fft_size);
            let scratch = vec![Complex { re: 0.0, im: 0.0 }; fft.get_inplace_scratch_len()];
            Self {
                fft,
                buffer: vec![Complex { re: 0.0, im: 0.0 }; fft_size],
                scratch,
            }
        }

        /// Transform `windowed` and write `|X[k]|` for `k < magnitudes.len()`.
        pub fn magnitudes(&mut self, windowed: &[f32], magnitudes: &mut [f32]) -> bool {
            for (dest, sample) in self.buffer.iter_mut().zip(windowed.iter()) {
                *dest = Complex { re: *sample, im: 0.0 };
            }
            self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
            for (dest, bin) in magnitudes.iter_mut().zip(self.buffer.iter()) {
                *dest = bin.norm();
            }
            true
        }
    }
}

#[cfg(feature = "real-fft")]
mod real_fft {
    use std::sync::Arc;

    use realfft::num_complex::Complex;
    use realfft::{RealFftPlanner, RealToComplex};

    pub struct FftEngine {
        r2c: Arc<dyn RealToComplex<f32>>,
        input: Vec<f32>,
        spectrum: Vec<Complex<f32>>,
        scratch: Vec<Complex<f32>>,
    }

    impl FftEngine {
        pub fn new(fft_size: usize) -> Self {
            let mut planner = RealFftPlanner::<f32>::new();
            let r2c = planner.plan_fft_forward(fft_size);
            let input = r2c.make_input_vec();
            let spectrum = r2c.make_output_vec();
            let scratch = r2c.make_scratch_vec();
            Self {
                r2c,
                input,
                spectrum,
                scratch,
            }
        }

        /// Transform `windowed` and write `|X[k]|` for `k < magnitudes.len()`.
        ///
        /// Returns `false` if the planner rejected the buffers.
        pub fn magnitudes(&mut self, windowed: &[f32], magnitudes: &mut [f32]) -> bool {
            self.input.copy_from_slice(windowed);
            if self
                .r2c
                .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
                .is_err()
            {
                return false;
            }
            for (dest, bin) in magnitudes.iter_mut().zip(self.spectrum.iter()) {
                *dest = bin.norm();
            }
            true
        }
    }
}

#[cfg(not(feature = "real-fft"))]
use complex_fft::FftEngine;
#[cfg(feature = "real-fft")]
use real_fft::FftEngine;

/// Four-term Blackman-Harris window of `len` points.
pub fn blackman_harris(len: usize) -> Vec<f32> {
    const A0: f32 = 0.358_75;
    const A1: f32 = 0.488_29;
    const A2: f32 = 0.141_28;
    const A3: f32 = 0.011_68;

    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f32;
    (0..len)
        .map(|n| {
            let phase = 2.0 * PI * n as f32 / denom;
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos() - A3 * (3.0 * phase).cos()
        })
        .collect()
}

/// Turns the sliding analysis buffer into one magnitude-in-dB array per call.
///
/// Output has `fft_size / 2` bins. Magnitudes are divided by that bin
/// count before conversion, and anything at or below `floor_db` (including
/// silence) reads as exactly `floor_db`.
pub struct FftDataGenerator {
    fft_size: usize,
    floor_db: f32,
    window: Vec<f32>,
    windowed: Vec<f32>,
    magnitudes: Vec<f32>,
    engine: FftEngine,
}

impl FftDataGenerator {
    pub fn new(fft_size: usize, floor_db: f32) -> Self {
        Self {
            fft_size,
            floor_db,
            window: blackman_harris(fft_size),
            windowed: vec![0.0; fft_size],
            magnitudes: vec![0.0; fft_size / 2],
            engine: FftEngine::new(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Window `audio` (exactly `fft_size` samples, oldest first) and write
    /// the dB spectrum into `out` (`num_bins` values).
    pub fn produce(&mut self, audio: impl IntoIterator<Item = f32>, out: &mut [f32]) {
        for ((dest, sample), gain) in self
            .windowed
            .iter_mut()
            .zip(audio)
            .zip(self.window.iter())
        {
            *dest = sample * gain;
        }

        let num_bins = self.num_bins().max(1) as f32;
        if !self.engine.magnitudes(&self.windowed, &mut self.magnitudes) {
            out.iter_mut().for_each(|value| *value = self.floor_db);
            return;
        }
        for (dest, magnitude) in out.iter_mut().zip(self.magnitudes.iter()) {
            *dest = gain_to_db_floored(magnitude / num_bins, self.floor_db);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_symmetric_and_tapered() {
        let window = blackman_harris(64);
        assert!(window[0] < 1e-3);
        assert!((window[0] - window[63]).abs() < 1e-6);
        assert!((window[10] - window[53]).abs() < 1e-5);
        let max = window.iter().cloned().fold(0.0_f32, f32::max);
        assert!(max > 0.99 && max <= 1.0);
    }

    #[test]
    fn silence_sits_on_the_floor() {
        let mut generator = FftDataGenerator::new(512, -48.0);
        let mut out = vec![0.0; generator.num_bins()];
        generator.produce(std::iter::repeat(0.0).take(512), &mut out);
        assert!(out.iter().all(|db| *db == -48.0));
    }

    #[test]
    fn sine_peaks_in_its_bin() {
        let fft_size = 1024;
        let sample_rate = 48_000.0_f32;
        let bin = 64;
        let freq = bin as f32 * sample_rate / fft_size as f32;
        let signal = (0..fft_size)
            .map(|n| (2.0 * PI * freq * n as f32 / sample_rate).sin());

        let mut generator = FftDataGenerator::new(fft_size, -120.0);
        let mut out = vec![0.0; generator.num_bins()];
        generator.produce(signal, &mut out);

        let (peak_bin, peak_db) = out
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, db)| if *db > best.1 { (i, *db) } else { best });
        assert_eq!(peak_bin, bin);
        // Unit sine through the window's coherent gain.
        assert!((peak_db - 20.0 * 0.358_75_f32.log10()).abs() < 0.5, "{}", peak_db);
        assert!(out.iter().all(|db| *db >= -120.0));
    }
}
