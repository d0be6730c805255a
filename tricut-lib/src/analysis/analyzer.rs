//! Spectrum analyzer: audio tap, per-channel FFT pipelines and path handoff.
//!
//! The audio thread owns an [`AnalyzerTap`] and pushes filtered samples
//! into per-channel fifos. A timer thread owns the [`SpectrumAnalyzer`],
//! drains the fifos into sliding buffers, runs FFTs and publishes the
//! newest [`RenderPath`] for each channel. Readers clone a
//! [`SpectrumPaths`] handle and pick up whatever path is current.

use std::sync::Arc;

use dasp_ring_buffer::Fixed;
use log::info;
use parking_lot::Mutex;
use portable_atomic::{AtomicF64, Ordering};
use serde::{Deserialize, Serialize};

use crate::analysis::fft::FftDataGenerator;
use crate::analysis::fifo::{audio_fifo, FifoConsumer, FifoProducer};
use crate::analysis::path::{generate_path, PlotArea, RenderPath};

const MIN_FFT_SIZE: usize = 512;
const MAX_FFT_SIZE: usize = 16_384;

/// Analyzer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub fft_size: usize,
    pub fifo_block_len: usize,
    pub fifo_capacity: usize,
    pub hop: usize,
    pub floor_db: f32,
    pub ceiling_db: f32,
    /// Keep every n-th bin when building paths.
    pub path_resolution: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            fifo_block_len: 512,
            fifo_capacity: 32,
            hop: 512,
            floor_db: -48.0,
            ceiling_db: 0.0,
            path_resolution: 1,
        }
    }
}

impl AnalyzerConfig {
    /// Copy with every field forced into a workable range.
    ///
    /// The FFT size becomes a power of two in 512..=16384; block length and
    /// hop never exceed it.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let fft_size = self
            .fft_size
            .clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
            .next_power_of_two();
        let (floor_db, ceiling_db) = if self.floor_db.is_finite()
            && self.ceiling_db.is_finite()
            && self.ceiling_db > self.floor_db
        {
            (self.floor_db, self.ceiling_db)
        } else {
            (defaults.floor_db, defaults.ceiling_db)
        };
        Self {
            fft_size,
            fifo_block_len: self.fifo_block_len.clamp(1, fft_size),
            fifo_capacity: self.fifo_capacity.max(1),
            hop: self.hop.clamp(1, fft_size),
            floor_db,
            ceiling_db,
            path_resolution: self.path_resolution.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Left, Channel::Right];
}

/// Build a connected analyzer and audio tap.
pub fn spectrum_analyzer(config: AnalyzerConfig, sample_rate: f64) -> (SpectrumAnalyzer, AnalyzerTap) {
    let config = config.sanitized();
    let sample_rate = Arc::new(AtomicF64::new(sample_rate));
    let plot = PlotArea::default();

    let (left_producer, left_consumer) = audio_fifo(config.fifo_capacity, config.fifo_block_len);
    let (right_producer, right_consumer) = audio_fifo(config.fifo_capacity, config.fifo_block_len);

    let empty = Arc::new(RenderPath::empty(plot, config.floor_db, config.ceiling_db));
    let paths = SpectrumPaths {
        left: Arc::new(Mutex::new(Arc::clone(&empty))),
        right: Arc::new(Mutex::new(empty)),
    };

    info!(
        "spectrum analyzer: fft_size={} hop={} fifo={}x{} floor={} dB",
        config.fft_size, config.hop, config.fifo_capacity, config.fifo_block_len, config.floor_db
    );

    let analyzer = SpectrumAnalyzer {
        config,
        sample_rate: Arc::clone(&sample_rate),
        left: ChannelPipeline::new(&config, left_consumer),
        right: ChannelPipeline::new(&config, right_consumer),
        paths,
    };
    let tap = AnalyzerTap {
        left: TapChannel::new(left_producer),
        right: TapChannel::new(right_producer),
        sample_rate,
    };
    (analyzer, tap)
}

/// Fixed-length window over the most recent samples of one channel.
pub struct SlidingMonoBuffer {
    samples: Fixed<Vec<f32>>,
}

impl SlidingMonoBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            samples: Fixed::from(vec![0.0; len.max(1)]),
        }
    }

    /// Drop the oldest `block.len()` samples and append `block`.
    pub fn push_block(&mut self, block: &[f32]) {
        for sample in block {
            self.samples.push(*sample);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }
}

struct ChannelPipeline {
    consumer: FifoConsumer,
    buffer: SlidingMonoBuffer,
    generator: FftDataGenerator,
    block: Vec<f32>,
    pending: usize,
    fft_data: Vec<f32>,
    fresh: bool,
}

impl ChannelPipeline {
    fn new(config: &AnalyzerConfig, consumer: FifoConsumer) -> Self {
        let generator = FftDataGenerator::new(config.fft_size, config.floor_db);
        Self {
            block: vec![0.0; consumer.block_len()],
            consumer,
            buffer: SlidingMonoBuffer::new(config.fft_size),
            fft_data: vec![config.floor_db; generator.num_bins()],
            generator,
            pending: 0,
            fresh: false,
        }
    }

    /// Drain the fifo and refresh the FFT slot once a hop has accumulated.
    fn pull(&mut self, hop: usize) -> bool {
        while self.consumer.pop_into(&mut self.block) {
            self.buffer.push_block(&self.block);
            self.pending += self.block.len();
        }
        if self.pending < hop {
            return false;
        }
        self.pending = 0;
        self.generator.produce(self.buffer.iter(), &mut self.fft_data);
        self.fresh = true;
        true
    }
}

type PathSlot = Arc<Mutex<Arc<RenderPath>>>;

/// Cloneable read handle on the latest path of each channel.
#[derive(Clone)]
pub struct SpectrumPaths {
    left: PathSlot,
    right: PathSlot,
}

impl SpectrumPaths {
    /// Most recently published path for `channel`.
    pub fn latest_path(&self, channel: Channel) -> Arc<RenderPath> {
        Arc::clone(&self.slot(channel).lock())
    }

    fn publish(&self, channel: Channel, path: RenderPath) {
        *self.slot(channel).lock() = Arc::new(path);
    }

    fn slot(&self, channel: Channel) -> &PathSlot {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }
}

/// Analysis side. Lives on a non-audio thread.
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    sample_rate: Arc<AtomicF64>,
    left: ChannelPipeline,
    right: ChannelPipeline,
    paths: SpectrumPaths,
}

impl SpectrumAnalyzer {
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Sample rate last reported by the tap.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate.load(Ordering::Acquire)
    }

    /// Width of one FFT bin at the current sample rate.
    pub fn bin_width_hz(&self) -> f32 {
        (self.sample_rate() / self.config.fft_size as f64) as f32
    }

    /// Drain both fifos; returns how many channels produced new FFT data.
    pub fn pull(&mut self) -> usize {
        let hop = self.config.hop;
        [&mut self.left, &mut self.right]
            .into_iter()
            .map(|pipeline| pipeline.pull(hop))
            .filter(|produced| *produced)
            .count()
    }

    /// Turn fresh FFT data into paths and publish them; returns how many
    /// paths were replaced.
    pub fn generate_paths(&mut self, plot: PlotArea) -> usize {
        let bin_width = self.bin_width_hz();
        let mut published = 0;
        for channel in Channel::ALL {
            let pipeline = match channel {
                Channel::Left => &mut self.left,
                Channel::Right => &mut self.right,
            };
            if !pipeline.fresh {
                continue;
            }
            pipeline.fresh = false;
            let path = generate_path(
                &pipeline.fft_data,
                bin_width,
                plot,
                self.config.floor_db,
                self.config.ceiling_db,
                self.config.path_resolution,
            );
            self.paths.publish(channel, path);
            published += 1;
        }
        published
    }

    /// One analysis pass: [`pull`](Self::pull) then
    /// [`generate_paths`](Self::generate_paths).
    pub fn process(&mut self, plot: PlotArea) -> usize {
        self.pull();
        self.generate_paths(plot)
    }

    /// Shareable read handle for the published paths.
    pub fn paths(&self) -> SpectrumPaths {
        self.paths.clone()
    }

    pub fn latest_path(&self, channel: Channel) -> Arc<RenderPath> {
        self.paths.latest_path(channel)
    }

    /// Frequency and level of the loudest point on the channel's path.
    pub fn peak(&self, channel: Channel) -> Option<(f32, f32)> {
        let path = self.latest_path(channel);
        path.peak()
            .map(|point| (path.frequency_at(point), path.level_at(point)))
    }

    /// Blocks the audio side had to evict because analysis fell behind.
    pub fn dropped_blocks(&self, channel: Channel) -> u64 {
        match channel {
            Channel::Left => self.left.consumer.dropped(),
            Channel::Right => self.right.consumer.dropped(),
        }
    }
}

struct TapChannel {
    producer: FifoProducer,
    staging: Vec<f32>,
    filled: usize,
}

impl TapChannel {
    fn new(producer: FifoProducer) -> Self {
        Self {
            staging: vec![0.0; producer.block_len()],
            producer,
            filled: 0,
        }
    }

    fn push(&mut self, mut samples: &[f32]) {
        while !samples.is_empty() {
            let take = (self.staging.len() - self.filled).min(samples.len());
            self.staging[self.filled..self.filled + take].copy_from_slice(&samples[..take]);
            self.filled += take;
            samples = &samples[take..];
            if self.filled == self.staging.len() {
                self.producer.push(&self.staging);
                self.filled = 0;
            }
        }
    }
}

/// Audio-thread side of the analyzer. Allocation-free after construction.
pub struct AnalyzerTap {
    left: TapChannel,
    right: TapChannel,
    sample_rate: Arc<AtomicF64>,
}

impl AnalyzerTap {
    /// Report the stream sample rate to the analysis side.
    pub fn set_sample_rate(&self, sample_rate: f64) {
        self.sample_rate.store(sample_rate, Ordering::Release);
    }

    /// Feed one block of planar audio. A single channel feeds both sides.
    pub fn push(&mut self, channels: &[&[f32]]) {
        match channels {
            [mono] => {
                self.left.push(mono);
                self.right.push(mono);
            }
            [left, right, ..] => {
                self.left.push(left);
                self.right.push(right);
            }
            [] => {}
        }
    }

    pub fn push_channel(&mut self, channel: Channel, samples: &[f32]) {
        match channel {
            Channel::Left => self.left.push(samples),
            Channel::Right => self.right.push(samples),
        }
    }
}
