//! Host-facing entry point: parameter store, stereo filter chains and the
//! optional analyzer tap behind one `prepare`/`process_block` surface.

use std::sync::Arc;

use crate::analysis::AnalyzerTap;
use crate::error::{ProcessError, StateError};
use crate::params::ParameterStore;
use crate::processor::{ChainControls, DualChannelProcessor};

/// What a plugin host drives from its audio callback.
pub struct EqualizerProcessor {
    params: Arc<ParameterStore>,
    processor: DualChannelProcessor,
    tap: Option<AnalyzerTap>,
    left_scratch: Vec<f32>,
    right_scratch: Vec<f32>,
}

impl EqualizerProcessor {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            params,
            processor: DualChannelProcessor::new(),
            tap: None,
            left_scratch: Vec::new(),
            right_scratch: Vec::new(),
        }
    }

    /// Feed filtered output into a spectrum analyzer.
    pub fn with_analyzer_tap(mut self, tap: AnalyzerTap) -> Self {
        self.tap = Some(tap);
        self
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    /// Handle for reading the installed coefficients off the audio thread.
    pub fn controls(&self) -> Arc<ChainControls> {
        self.processor.controls()
    }

    pub fn processor(&self) -> &DualChannelProcessor {
        &self.processor
    }

    /// Prepare for a stream format and install the current settings.
    ///
    /// Allocates interleave scratch space, so call it outside the audio
    /// callback.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.processor.prepare(sample_rate, max_block_size);
        self.left_scratch = vec![0.0; max_block_size];
        self.right_scratch = vec![0.0; max_block_size];
        self.controls().update_from_settings(&self.params.snapshot());
        if let Some(tap) = &self.tap {
            tap.set_sample_rate(self.processor.sample_rate());
        }
    }

    /// Refresh coefficients from the parameter store, filter `channels` in
    /// place, then feed the analyzer tap.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]]) -> Result<(), ProcessError> {
        if !self.processor.is_prepared() {
            return Err(ProcessError::NotPrepared);
        }
        self.processor.update_from_settings(&self.params.snapshot());
        self.processor.process(channels)?;

        if let Some(tap) = self.tap.as_mut() {
            match channels {
                [mono] => tap.push(&[&**mono]),
                [left, right] => tap.push(&[&**left, &**right]),
                _ => {}
            }
        }
        Ok(())
    }

    /// Interleaved variant of [`process_block`](Self::process_block).
    pub fn process_interleaved(
        &mut self,
        samples: &mut [f32],
        channels: usize,
    ) -> Result<(), ProcessError> {
        if channels == 0 || channels > 2 {
            return Err(ProcessError::UnsupportedChannels(channels));
        }
        if samples.len() % channels != 0 {
            return Err(ProcessError::ChannelLengthMismatch);
        }
        if !self.processor.is_prepared() {
            return Err(ProcessError::NotPrepared);
        }
        let frames = samples.len() / channels;
        let max = self.processor.max_block_size().min(self.left_scratch.len());
        if frames > max {
            return Err(ProcessError::BlockTooLarge { len: frames, max });
        }

        let mut left = std::mem::take(&mut self.left_scratch);
        let mut right = std::mem::take(&mut self.right_scratch);
        for (frame, chunk) in samples.chunks_exact(channels).enumerate() {
            left[frame] = chunk[0];
            if channels == 2 {
                right[frame] = chunk[1];
            }
        }

        let result = if channels == 2 {
            self.process_block(&mut [&mut left[..frames], &mut right[..frames]])
        } else {
            self.process_block(&mut [&mut left[..frames]])
        };

        if result.is_ok() {
            for (frame, chunk) in samples.chunks_exact_mut(channels).enumerate() {
                chunk[0] = left[frame];
                if channels == 2 {
                    chunk[1] = right[frame];
                }
            }
        }
        self.left_scratch = left;
        self.right_scratch = right;
        result
    }

    /// Linear magnitude of the installed left chain at `freq_hz`.
    pub fn magnitude_response(&self, freq_hz: f64) -> f64 {
        self.processor.magnitude_response(freq_hz)
    }

    /// Current parameters as a JSON state blob.
    pub fn state_json(&self) -> Result<String, StateError> {
        self.params.to_json()
    }

    /// Restore parameters and, once prepared, push them to the chains
    /// straight away.
    pub fn restore_state_json(&mut self, json: &str) -> Result<(), StateError> {
        self.params.restore_json(json)?;
        if self.processor.is_prepared() {
            self.controls().update_from_settings(&self.params.snapshot());
        }
        Ok(())
    }
}
