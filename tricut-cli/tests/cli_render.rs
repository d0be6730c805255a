use std::f32::consts::PI;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const SAMPLE_RATE: u32 = 48_000;

fn write_stereo_wav(path: &Path, left_hz: f32, right_hz: f32, frames: usize) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for n in 0..frames {
        let t = n as f32 / SAMPLE_RATE as f32;
        for freq in [left_hz, right_hz] {
            let sample = 0.5 * (2.0 * PI * freq * t).sin();
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn render_applies_high_cut() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    let settings = dir.path().join("settings.json");
    write_stereo_wav(&input, 100.0, 5_000.0, 24_000);
    std::fs::write(
        &settings,
        r#"{ "high_cut_freq": 1000.0, "high_cut_slope": "48" }"#,
    )
    .expect("write settings");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tricut"));
    cmd.arg("render")
        .arg(&input)
        .arg(&output)
        .arg("--settings")
        .arg(&settings)
        .args(["--block-size", "256"])
        .assert()
        .success();

    let mut reader = hound::WavReader::open(&output).expect("open output");
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    assert_eq!(spec.bits_per_sample, 32);

    let samples: Vec<f32> = reader
        .samples::<f32>()
        .collect::<Result<_, _>>()
        .expect("read samples");
    assert_eq!(samples.len(), 48_000);

    // Skip the first quarter second of filter settling.
    let settled = &samples[24_000..];
    let left: Vec<f32> = settled.iter().step_by(2).copied().collect();
    let right: Vec<f32> = settled.iter().skip(1).step_by(2).copied().collect();
    assert!(rms(&left) > 0.3, "left rms {}", rms(&left));
    assert!(rms(&right) < 0.01, "right rms {}", rms(&right));
}

#[test]
fn render_logs_parameter_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_stereo_wav(&input, 440.0, 440.0, 1_000);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tricut"));
    cmd.env("RUST_LOG", "info")
        .arg("render")
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Peak Freq: 750 Hz"))
        .stderr(predicate::str::contains("LowCut Slope: 12 dB/Oct"));
}

#[test]
fn render_fails_on_missing_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tricut"));
    cmd.arg("render")
        .arg(dir.path().join("missing.wav"))
        .arg(dir.path().join("out.wav"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("[ERROR]"));
}
