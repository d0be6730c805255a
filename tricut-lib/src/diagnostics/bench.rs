//! Synthetic benchmarks for the stereo filter chain.

use rand::Rng;

use crate::chain::{ChainSettings, Slope};
use crate::error::ProcessError;
use crate::processor::DualChannelProcessor;

/// Configuration parameters for a processing benchmark run.
#[derive(Debug, Clone, Copy)]
pub struct ProcessBenchConfig {
    pub sample_rate: u32,
    pub input_seconds: f32,
    pub block_size: usize,
    pub iterations: usize,
}

impl Default for ProcessBenchConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            input_seconds: 1.0,
            block_size: 512,
            iterations: 10,
        }
    }
}

/// Timing results from a benchmark run.
#[derive(Debug, Clone, Copy)]
pub struct ProcessBenchResult {
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub audio_time_ms: f64,
    pub rt_factor: f64,
    pub blocks: usize,
}

/// Random settings spanning the full parameter ranges.
pub fn random_settings<R: Rng>(rng: &mut R) -> ChainSettings {
    let log_freq = |rng: &mut R| 20.0_f32 * 1000.0_f32.powf(rng.gen_range(0.0..1.0));
    ChainSettings {
        low_cut_freq: log_freq(rng),
        high_cut_freq: log_freq(rng),
        peak_freq: log_freq(rng),
        peak_gain_db: rng.gen_range(-24.0..=24.0),
        peak_quality: rng.gen_range(0.1..=10.0),
        low_cut_slope: Slope::from_index(rng.gen_range(0..4)),
        high_cut_slope: Slope::from_index(rng.gen_range(0..4)),
    }
}

/// Time stereo processing of random noise with random settings, refreshing
/// coefficients once per block the way a host callback does.
pub fn bench_processor(config: ProcessBenchConfig) -> Result<ProcessBenchResult, ProcessError> {
    let block_size = config.block_size.max(1);
    let input_len = (config.sample_rate as f32 * config.input_seconds).max(1.0) as usize;

    let mut rng = rand::thread_rng();
    let left_input: Vec<f32> = (0..input_len)
        .map(|_| rng.gen_range(-1.0_f32..1.0_f32))
        .collect();
    let right_input: Vec<f32> = (0..input_len)
        .map(|_| rng.gen_range(-1.0_f32..1.0_f32))
        .collect();
    let settings = random_settings(&mut rng);

    let mut processor = DualChannelProcessor::new();
    processor.prepare(config.sample_rate as f64, block_size);

    let mut left = left_input.clone();
    let mut right = right_input.clone();
    let mut times: Vec<f64> = Vec::with_capacity(config.iterations.max(1));
    let mut blocks = 0;

    for _ in 0..config.iterations.max(1) {
        left.copy_from_slice(&left_input);
        right.copy_from_slice(&right_input);
        blocks = 0;

        let start = std::time::Instant::now();
        for (left_block, right_block) in left
            .chunks_mut(block_size)
            .zip(right.chunks_mut(block_size))
        {
            processor.update_from_settings(&settings);
            processor.process(&mut [left_block, right_block])?;
            blocks += 1;
        }
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        times.push(elapsed);
    }

    let min_ms = times
        .iter()
        .copied()
        .fold(f64::INFINITY, |a, b| a.min(b));
    let max_ms = times.iter().copied().fold(0.0_f64, |a, b| a.max(b));
    let avg_ms = times.iter().sum::<f64>() / times.len() as f64;
    let audio_time_ms = (input_len as f64 / config.sample_rate.max(1) as f64) * 1000.0;
    let rt_factor = if audio_time_ms > 0.0 {
        avg_ms / audio_time_ms
    } else {
        0.0
    };

    Ok(ProcessBenchResult {
        avg_ms,
        min_ms: if min_ms.is_finite() { min_ms } else { 0.0 },
        max_ms,
        audio_time_ms,
        rt_factor,
        blocks,
    })
}

/// Run a sweep of block sizes using a shared base configuration.
pub fn bench_processor_sweep(
    base: ProcessBenchConfig,
    block_sizes: &[usize],
) -> Result<Vec<(usize, ProcessBenchResult)>, ProcessError> {
    let mut results = Vec::new();
    for &block_size in block_sizes {
        let config = ProcessBenchConfig { block_size, ..base };
        results.push((block_size, bench_processor(config)?));
    }
    Ok(results)
}
