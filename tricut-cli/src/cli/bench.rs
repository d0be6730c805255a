use std::error::Error;

use clap::ArgMatches;
use tricut_lib::diagnostics::bench::{bench_processor, bench_processor_sweep, ProcessBenchConfig};

const SWEEP_BLOCK_SIZES: [usize; 6] = [32, 64, 128, 256, 512, 1024];

pub fn run_bench(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let defaults = ProcessBenchConfig::default();
    let config = ProcessBenchConfig {
        block_size: args
            .get_one::<usize>("block-size")
            .copied()
            .unwrap_or(defaults.block_size),
        input_seconds: args
            .get_one::<f32>("seconds")
            .copied()
            .unwrap_or(defaults.input_seconds),
        iterations: args
            .get_one::<usize>("iterations")
            .copied()
            .unwrap_or(defaults.iterations),
        ..defaults
    };
    if config.block_size == 0 || config.iterations == 0 {
        return Err("block size and iterations must be at least 1".into());
    }
    if config.input_seconds.is_nan() || config.input_seconds <= 0.0 {
        return Err("input length must be positive".into());
    }

    if args.get_flag("sweep") {
        return run_sweep_bench(config);
    }

    let result = bench_processor(config)?;
    println!(
        "EQ bench (block={} input={}s iters={}): avg {:.3}ms (min {:.3}ms max {:.3}ms), audio {:.2}ms, rt {:.1}x, blocks {}",
        config.block_size,
        config.input_seconds,
        config.iterations,
        result.avg_ms,
        result.min_ms,
        result.max_ms,
        result.audio_time_ms,
        result.rt_factor,
        result.blocks
    );
    Ok(0)
}

fn run_sweep_bench(base: ProcessBenchConfig) -> Result<i32, Box<dyn Error>> {
    let results = bench_processor_sweep(base, &SWEEP_BLOCK_SIZES)?;
    println!(
        "EQ sweep (input={}s iters={})",
        base.input_seconds, base.iterations
    );
    println!("block | avg_ms | min_ms | max_ms | rt_x");
    for (block_size, result) in results {
        println!(
            "{:>5} | {:>6.3} | {:>6.3} | {:>6.3} | {:>6.1}",
            block_size, result.avg_ms, result.min_ms, result.max_ms, result.rt_factor
        );
    }
    Ok(0)
}
