//! WAV file I/O in planar `f32`.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Decoded audio, one `Vec` per channel.
pub struct PlanarAudio {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PlanarAudio {
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

/// Read integer or float WAV data scaled to [-1, 1].
pub fn read_wav(path: &Path) -> Result<PlanarAudio, hound::Error> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channel_count = (spec.channels as usize).max(1);

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, sample) in channels.iter_mut().zip(frame.iter()) {
            channel.push(*sample);
        }
    }

    Ok(PlanarAudio {
        sample_rate: spec.sample_rate,
        channels,
    })
}

/// Write `audio` as 32-bit float WAV.
pub fn write_wav(path: &Path, audio: &PlanarAudio) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: audio.channels.len() as u16,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for frame in 0..audio.frames() {
        for channel in &audio.channels {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()
}
