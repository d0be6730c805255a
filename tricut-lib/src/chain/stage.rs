//! One slot of a filter chain and the handoff that replaces its coefficients.
//!
//! Each stage owns a triple buffer. The writer side lives behind a short
//! mutex so that any thread can publish; the reader side is owned by the
//! audio thread and never waits.

use parking_lot::Mutex;
use triple_buffer::{Input, Output, TripleBuffer};

use crate::dsp::biquad::{BiquadState, FilterCoefficients};

/// Coefficients plus bypass flag, published together so the audio thread
/// never sees one without the other.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageCoefficients {
    pub coefficients: FilterCoefficients,
    pub bypassed: bool,
}

impl StageCoefficients {
    pub const BYPASSED: StageCoefficients = StageCoefficients {
        coefficients: FilterCoefficients::IDENTITY,
        bypassed: true,
    };

    pub fn active(coefficients: FilterCoefficients) -> Self {
        Self {
            coefficients,
            bypassed: false,
        }
    }

    /// A failed design (`None`) turns into a bypassed stage.
    pub fn from_design(design: Option<FilterCoefficients>) -> Self {
        match design {
            Some(coefficients) => Self::active(coefficients),
            None => Self::BYPASSED,
        }
    }
}

impl Default for StageCoefficients {
    fn default() -> Self {
        Self::BYPASSED
    }
}

/// Create a connected reader/writer pair for one stage, starting bypassed.
pub fn filter_stage() -> (FilterStage, StageWriter) {
    let (input, output) = TripleBuffer::new(&StageCoefficients::BYPASSED).split();
    let stage = FilterStage {
        output,
        installed: StageCoefficients::BYPASSED,
        state: BiquadState::new(),
    };
    let writer = StageWriter {
        inner: Mutex::new(WriterInner {
            input,
            last: StageCoefficients::BYPASSED,
        }),
    };
    (stage, writer)
}

/// Audio-thread side of a stage.
pub struct FilterStage {
    output: Output<StageCoefficients>,
    installed: StageCoefficients,
    state: BiquadState,
}

impl FilterStage {
    /// Pick up the most recently published coefficients, if any.
    ///
    /// A stage that comes back from bypass starts from a silent delay line
    /// instead of whatever it held when it was switched off.
    #[inline]
    pub fn refresh(&mut self) {
        let latest = *self.output.read();
        if self.installed.bypassed && !latest.bypassed {
            self.state.reset();
        }
        self.installed = latest;
    }

    /// Filter `samples` in place with the installed coefficients.
    #[inline]
    pub fn process(&mut self, samples: &mut [f32]) {
        if self.installed.bypassed {
            return;
        }
        let coeffs = self.installed.coefficients;
        for sample in samples.iter_mut() {
            *sample = self.state.process_sample(&coeffs, *sample);
        }
    }

    /// Coefficients in use since the last refresh.
    pub fn installed(&self) -> StageCoefficients {
        self.installed
    }

    /// Whether the stage currently passes audio through untouched.
    pub fn is_bypassed(&self) -> bool {
        self.installed.bypassed
    }

    /// Zero the delay line.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

struct WriterInner {
    input: Input<StageCoefficients>,
    last: StageCoefficients,
}

/// Publishing side of a stage. Shared between threads.
pub struct StageWriter {
    inner: Mutex<WriterInner>,
}

impl StageWriter {
    /// Publish a new value, waiting for any concurrent writer to finish.
    pub fn publish(&self, value: StageCoefficients) {
        let mut inner = self.inner.lock();
        inner.write(value);
    }

    /// Publish without waiting. Returns `false` when another writer holds
    /// the stage; the caller is expected to try again on its next pass.
    pub fn try_publish(&self, value: StageCoefficients) -> bool {
        match self.inner.try_lock() {
            Some(mut inner) => {
                inner.write(value);
                true
            }
            None => false,
        }
    }

    /// Change only the bypass flag, keeping the last published coefficients.
    pub fn set_bypassed(&self, bypassed: bool) {
        let mut inner = self.inner.lock();
        let mut value = inner.last;
        value.bypassed = bypassed;
        inner.write(value);
    }

    /// Last value handed to the audio thread.
    pub fn current(&self) -> StageCoefficients {
        self.inner.lock().last
    }
}

impl WriterInner {
    fn write(&mut self, value: StageCoefficients) {
        self.input.write(value);
        self.last = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halving() -> FilterCoefficients {
        FilterCoefficients::normalized(0.5, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[test]
    fn new_stage_is_bypassed_pass_through() {
        let (mut stage, _writer) = filter_stage();
        stage.refresh();
        let mut block = [0.25_f32, -0.5, 1.0];
        stage.process(&mut block);
        assert_eq!(block, [0.25, -0.5, 1.0]);
        assert!(stage.is_bypassed());
    }

    #[test]
    fn published_coefficients_apply_after_refresh() {
        let (mut stage, writer) = filter_stage();
        writer.publish(StageCoefficients::active(halving()));

        let mut block = [1.0_f32; 4];
        stage.process(&mut block);
        assert_eq!(block, [1.0; 4]);

        stage.refresh();
        stage.process(&mut block);
        assert_eq!(block, [0.5; 4]);
    }

    #[test]
    fn newest_value_wins_between_refreshes() {
        let (mut stage, writer) = filter_stage();
        writer.publish(StageCoefficients::active(FilterCoefficients::IDENTITY));
        writer.publish(StageCoefficients::active(halving()));
        stage.refresh();
        assert_eq!(stage.installed().coefficients, halving());
    }

    #[test]
    fn bypass_flag_keeps_coefficients() {
        let (mut stage, writer) = filter_stage();
        writer.publish(StageCoefficients::active(halving()));
        writer.set_bypassed(true);
        stage.refresh();
        assert!(stage.is_bypassed());
        assert_eq!(writer.current().coefficients, halving());

        writer.set_bypassed(false);
        stage.refresh();
        assert!(!stage.is_bypassed());
    }

    #[test]
    fn try_publish_fails_while_writer_is_held() {
        let (_stage, writer) = filter_stage();
        let guard = writer.inner.lock();
        assert!(!writer.try_publish(StageCoefficients::BYPASSED));
        drop(guard);
        assert!(writer.try_publish(StageCoefficients::active(halving())));
    }

    #[test]
    fn failed_design_maps_to_bypass() {
        assert_eq!(StageCoefficients::from_design(None), StageCoefficients::BYPASSED);
        assert!(!StageCoefficients::from_design(Some(halving())).bypassed);
    }
}
