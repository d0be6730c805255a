//! Spectrum analysis of a WAV file, printed as JSON.

use std::error::Error;
use std::path::Path;

use clap::ArgMatches;
use log::{info, warn};
use serde::Serialize;
use tricut_lib::analysis::{spectrum_analyzer, AnalyzerConfig, Channel, PlotArea};
use tricut_lib::EqualizerProcessor;

use super::render::{load_settings, parameter_store};
use super::wav::read_wav;

#[derive(Debug, Serialize)]
struct ChannelPeak {
    channel: &'static str,
    peak_hz: Option<f32>,
    peak_db: Option<f32>,
    dropped_blocks: u64,
}

#[derive(Debug, Serialize)]
struct AnalysisReport {
    sample_rate: u32,
    fft_size: usize,
    bin_width_hz: f32,
    channels: Vec<ChannelPeak>,
}

pub fn run_analyze(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let input = args
        .get_one::<String>("INPUT")
        .ok_or("missing input path")?;
    let fft_size = args.get_one::<usize>("fft-size").copied().unwrap_or(2048);

    let mut audio = read_wav(Path::new(input))?;
    if audio.channels.is_empty() || audio.channels.len() > 2 {
        return Err(format!(
            "{} has {} channels; only mono and stereo are supported",
            input,
            audio.channels.len()
        )
        .into());
    }

    let config = AnalyzerConfig {
        fft_size,
        ..AnalyzerConfig::default()
    };
    let (mut analyzer, tap) = spectrum_analyzer(config, audio.sample_rate as f64);
    if analyzer.config().fft_size != fft_size {
        warn!(
            "fft size {} adjusted to {}",
            fft_size,
            analyzer.config().fft_size
        );
    }
    let block_len = analyzer.config().fifo_block_len;
    let plot = PlotArea::default();

    // Analysis runs after every block so the fifo never has to evict.
    let frames = audio.frames();
    if args.get_one::<String>("settings").is_some() {
        let settings = load_settings(args)?;
        let mut equalizer = EqualizerProcessor::new(parameter_store(&settings)).with_analyzer_tap(tap);
        equalizer.prepare(audio.sample_rate as f64, block_len);
        let mut start = 0;
        while start < frames {
            let end = (start + block_len).min(frames);
            let mut blocks: Vec<&mut [f32]> = audio
                .channels
                .iter_mut()
                .map(|channel| &mut channel[start..end])
                .collect();
            equalizer.process_block(&mut blocks)?;
            analyzer.process(plot);
            start = end;
        }
    } else {
        let mut tap = tap;
        let mut start = 0;
        while start < frames {
            let end = (start + block_len).min(frames);
            let blocks: Vec<&[f32]> = audio
                .channels
                .iter()
                .map(|channel| &channel[start..end])
                .collect();
            tap.push(&blocks);
            analyzer.process(plot);
            start = end;
        }
    }

    let channels = Channel::ALL
        .iter()
        .take(audio.channels.len())
        .map(|channel| {
            let peak = analyzer.peak(*channel);
            ChannelPeak {
                channel: match channel {
                    Channel::Left => "left",
                    Channel::Right => "right",
                },
                peak_hz: peak.map(|(freq, _)| freq),
                peak_db: peak.map(|(_, db)| db),
                dropped_blocks: analyzer.dropped_blocks(*channel),
            }
        })
        .collect();

    let report = AnalysisReport {
        sample_rate: audio.sample_rate,
        fft_size: analyzer.config().fft_size,
        bin_width_hz: analyzer.bin_width_hz(),
        channels,
    };
    info!("analyzed {} frames from {}", frames, input);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}
