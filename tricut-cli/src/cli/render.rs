//! Offline rendering of a WAV file through the equalizer.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::ArgMatches;
use log::{info, warn};
use tricut_lib::{ChainSettings, EqualizerProcessor, ParameterId, ParameterStore};

use super::wav::{read_wav, write_wav};

/// Load settings from `--settings`, or defaults when absent. Values outside
/// the parameter ranges are clamped.
pub fn load_settings(args: &ArgMatches) -> Result<ChainSettings, Box<dyn Error>> {
    let path = match args.get_one::<String>("settings") {
        Some(path) => path,
        None => return Ok(ChainSettings::default()),
    };
    let json = std::fs::read_to_string(path)?;
    let loaded: ChainSettings = serde_json::from_str(&json)?;
    let settings = loaded.sanitized();
    if settings != loaded {
        warn!("{}: out-of-range settings clamped to {:?}", path, settings);
    }
    Ok(settings)
}

/// Parameter store primed with `settings`, with every value logged in its
/// display form.
pub fn parameter_store(settings: &ChainSettings) -> Arc<ParameterStore> {
    let params = Arc::new(ParameterStore::new());
    params.apply_settings(settings);
    for id in ParameterId::ALL {
        let descriptor = id.descriptor();
        info!("{}: {}", id.name(), descriptor.display_value(params.value(id)));
    }
    params
}

pub fn run_render(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let input = args
        .get_one::<String>("INPUT")
        .ok_or("missing input path")?;
    let output = args
        .get_one::<String>("OUTPUT")
        .ok_or("missing output path")?;
    let block_size = args.get_one::<usize>("block-size").copied().unwrap_or(512);
    if block_size == 0 {
        return Err("block size must be at least 1".into());
    }

    let mut audio = read_wav(Path::new(input))?;
    if audio.channels.is_empty() || audio.channels.len() > 2 {
        return Err(format!(
            "{} has {} channels; only mono and stereo are supported",
            input,
            audio.channels.len()
        )
        .into());
    }

    let settings = load_settings(args)?;
    let mut equalizer = EqualizerProcessor::new(parameter_store(&settings));
    equalizer.prepare(audio.sample_rate as f64, block_size);

    let started = Instant::now();
    let frames = audio.frames();
    let mut start = 0;
    while start < frames {
        let end = (start + block_size).min(frames);
        let mut blocks: Vec<&mut [f32]> = audio
            .channels
            .iter_mut()
            .map(|channel| &mut channel[start..end])
            .collect();
        equalizer.process_block(&mut blocks)?;
        start = end;
    }
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    write_wav(Path::new(output), &audio)?;
    info!(
        "rendered {} frames x {} channels at {} Hz in {:.2}ms",
        frames,
        audio.channels.len(),
        audio.sample_rate,
        elapsed_ms
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::build_cli;
    use tricut_lib::Slope;

    fn response_args(settings_path: &str) -> ArgMatches {
        let matches = build_cli()
            .try_get_matches_from(["tricut", "response", "--settings", settings_path])
            .expect("valid arguments");
        let (_, sub) = matches.subcommand().expect("subcommand");
        sub.clone()
    }

    #[test]
    fn loaded_settings_are_clamped_into_range() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "peak_gain_db": 40.0, "peak_quality": 0.0, "high_cut_freq": 96000.0, "low_cut_slope": "36" }"#,
        )
        .expect("write settings");

        let settings = load_settings(&response_args(path.to_str().expect("utf8 path")))
            .expect("load settings");
        assert_eq!(settings.peak_gain_db, 24.0);
        assert_eq!(settings.peak_quality, 0.1);
        assert_eq!(settings.high_cut_freq, 20_000.0);
        assert_eq!(settings.low_cut_slope, Slope::Db36);
        assert_eq!(settings.peak_freq, ChainSettings::default().peak_freq);
    }

    #[test]
    fn missing_settings_flag_gives_defaults() {
        let matches = build_cli()
            .try_get_matches_from(["tricut", "response"])
            .expect("valid arguments");
        let (_, sub) = matches.subcommand().expect("subcommand");
        assert_eq!(load_settings(sub).expect("defaults"), ChainSettings::default());
    }
}
