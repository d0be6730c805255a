//! Parameter storage for the seven EQ controls.
//!
//! [`ParameterStore`] stands in for host parameter storage: values are
//! atomics, so any thread can read a consistent-enough snapshot without
//! locking, and writers notify subscribed [`ChangeFlag`]s.

mod flag;
mod range;
mod state;

pub use flag::ChangeFlag;
pub use range::ParameterRange;
pub use state::{ParameterState, STATE_VERSION};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;
use portable_atomic::AtomicF32;

use crate::chain::{ChainSettings, Slope};
use crate::error::{ParameterError, StateError};

pub const PARAMETER_COUNT: usize = 7;

const FREQ_RANGE: ParameterRange = ParameterRange::new(20.0, 20_000.0, 1.0, 0.25);
const GAIN_RANGE: ParameterRange = ParameterRange::new(-24.0, 24.0, 0.5, 1.0);
const QUALITY_RANGE: ParameterRange = ParameterRange::new(0.1, 10.0, 0.05, 1.0);
const SLOPE_RANGE: ParameterRange = ParameterRange::new(0.0, 3.0, 1.0, 1.0);

/// The seven automatable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
}

impl ParameterId {
    pub const ALL: [ParameterId; PARAMETER_COUNT] = [
        ParameterId::LowCutFreq,
        ParameterId::HighCutFreq,
        ParameterId::PeakFreq,
        ParameterId::PeakGain,
        ParameterId::PeakQuality,
        ParameterId::LowCutSlope,
        ParameterId::HighCutSlope,
    ];

    pub fn index(self) -> usize {
        match self {
            ParameterId::LowCutFreq => 0,
            ParameterId::HighCutFreq => 1,
            ParameterId::PeakFreq => 2,
            ParameterId::PeakGain => 3,
            ParameterId::PeakQuality => 4,
            ParameterId::LowCutSlope => 5,
            ParameterId::HighCutSlope => 6,
        }
    }

    /// Host-visible parameter name, also used as the persisted state key.
    pub fn name(self) -> &'static str {
        match self {
            ParameterId::LowCutFreq => "LowCut Freq",
            ParameterId::HighCutFreq => "HighCut Freq",
            ParameterId::PeakFreq => "Peak Freq",
            ParameterId::PeakGain => "Peak Gain",
            ParameterId::PeakQuality => "Peak Quality",
            ParameterId::LowCutSlope => "LowCut Slope",
            ParameterId::HighCutSlope => "HighCut Slope",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }

    pub fn descriptor(self) -> ParameterDescriptor {
        let (range, default, style) = match self {
            ParameterId::LowCutFreq => (FREQ_RANGE, 20.0, ControlStyle::LabeledKnob { unit: "Hz" }),
            ParameterId::HighCutFreq => {
                (FREQ_RANGE, 20_000.0, ControlStyle::LabeledKnob { unit: "Hz" })
            }
            ParameterId::PeakFreq => (FREQ_RANGE, 750.0, ControlStyle::LabeledKnob { unit: "Hz" }),
            ParameterId::PeakGain => (GAIN_RANGE, 0.0, ControlStyle::LabeledKnob { unit: "dB" }),
            ParameterId::PeakQuality => (QUALITY_RANGE, 1.0, ControlStyle::Knob),
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => {
                (SLOPE_RANGE, 0.0, ControlStyle::LabeledKnob { unit: "dB/Oct" })
            }
        };
        ParameterDescriptor {
            id: self,
            range,
            default,
            style,
        }
    }
}

/// How a control for the parameter is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStyle {
    /// Plain rotary knob.
    Knob,
    /// Rotary knob with a value label carrying a unit suffix.
    LabeledKnob { unit: &'static str },
}

impl ControlStyle {
    /// Unit suffix shown next to the value, when the style has one.
    pub fn extended_label(&self) -> Option<&'static str> {
        match self {
            ControlStyle::Knob => None,
            ControlStyle::LabeledKnob { unit } => Some(*unit),
        }
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor {
    pub id: ParameterId,
    pub range: ParameterRange,
    pub default: f32,
    pub style: ControlStyle,
}

impl ParameterDescriptor {
    /// Human-readable value, e.g. `750 Hz`, `1.20 kHz`, `+3.0 dB`.
    pub fn display_value(&self, value: f32) -> String {
        let value = self.range.constrain(value);
        match self.id {
            ParameterId::LowCutFreq | ParameterId::HighCutFreq | ParameterId::PeakFreq => {
                if value >= 1000.0 {
                    format!("{:.2} kHz", value / 1000.0)
                } else {
                    format!("{:.0} Hz", value)
                }
            }
            ParameterId::PeakGain => format!("{:+.1} dB", value),
            ParameterId::PeakQuality => format!("{:.2}", value),
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => {
                let slope = Slope::from_index(value.round() as usize);
                format!("{} dB/Oct", slope.db_per_octave())
            }
        }
    }
}

/// Lock-free parameter values plus change notification.
pub struct ParameterStore {
    values: [AtomicF32; PARAMETER_COUNT],
    listeners: RwLock<Vec<Arc<ChangeFlag>>>,
    changes: AtomicU64,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|index| {
                let descriptor = ParameterId::ALL[index].descriptor();
                AtomicF32::new(descriptor.range.constrain(descriptor.default))
            }),
            listeners: RwLock::new(Vec::new()),
            changes: AtomicU64::new(0),
        }
    }

    /// Current plain value of `id`.
    pub fn value(&self, id: ParameterId) -> f32 {
        self.values[id.index()].load(Ordering::Acquire)
    }

    /// Store `value` after clamping and snapping it; returns what was stored.
    pub fn set_value(&self, id: ParameterId, value: f32) -> f32 {
        let stored = self.store(id, value);
        self.notify();
        stored
    }

    /// Current value of `id` mapped into 0..=1.
    pub fn normalized(&self, id: ParameterId) -> f32 {
        id.descriptor().range.to_normalized(self.value(id))
    }

    /// Store a host-normalized value; returns the plain value stored.
    pub fn set_normalized(&self, id: ParameterId, normalized: f32) -> f32 {
        let plain = id.descriptor().range.from_normalized(normalized);
        self.set_value(id, plain)
    }

    /// Look up a value by its persisted name.
    pub fn value_by_name(&self, name: &str) -> Result<f32, ParameterError> {
        let id = lookup(name)?;
        Ok(self.value(id))
    }

    /// Store a value by its persisted name.
    pub fn set_by_name(&self, name: &str, value: f32) -> Result<f32, ParameterError> {
        let id = lookup(name)?;
        Ok(self.set_value(id, value))
    }

    /// Register a flag that is marked on every subsequent change.
    pub fn subscribe(&self) -> Arc<ChangeFlag> {
        let flag = Arc::new(ChangeFlag::new(false));
        self.listeners.write().push(Arc::clone(&flag));
        flag
    }

    pub fn unsubscribe(&self, flag: &Arc<ChangeFlag>) {
        self.listeners
            .write()
            .retain(|listener| !Arc::ptr_eq(listener, flag));
    }

    /// Number of change notifications sent so far.
    pub fn change_count(&self) -> u64 {
        self.changes.load(Ordering::Acquire)
    }

    /// Current values as filter settings. Lock-free.
    pub fn snapshot(&self) -> ChainSettings {
        ChainSettings {
            low_cut_freq: self.value(ParameterId::LowCutFreq),
            high_cut_freq: self.value(ParameterId::HighCutFreq),
            peak_freq: self.value(ParameterId::PeakFreq),
            peak_gain_db: self.value(ParameterId::PeakGain),
            peak_quality: self.value(ParameterId::PeakQuality),
            low_cut_slope: Slope::from_index(self.value(ParameterId::LowCutSlope).round() as usize),
            high_cut_slope: Slope::from_index(
                self.value(ParameterId::HighCutSlope).round() as usize,
            ),
        }
    }

    /// Overwrite every parameter from `settings` with a single notification.
    pub fn apply_settings(&self, settings: &ChainSettings) {
        self.store(ParameterId::LowCutFreq, settings.low_cut_freq);
        self.store(ParameterId::HighCutFreq, settings.high_cut_freq);
        self.store(ParameterId::PeakFreq, settings.peak_freq);
        self.store(ParameterId::PeakGain, settings.peak_gain_db);
        self.store(ParameterId::PeakQuality, settings.peak_quality);
        self.store(ParameterId::LowCutSlope, settings.low_cut_slope.index() as f32);
        self.store(ParameterId::HighCutSlope, settings.high_cut_slope.index() as f32);
        self.notify();
    }

    /// Snapshot every parameter under its persisted name.
    pub fn state(&self) -> ParameterState {
        let mut state = ParameterState::default();
        for id in ParameterId::ALL {
            state.parameters.insert(id.name().to_string(), self.value(id));
        }
        state
    }

    /// Load values from a saved state. Names this store does not know are
    /// skipped; parameters missing from the state keep their value.
    pub fn restore(&self, state: &ParameterState) -> Result<(), StateError> {
        if state.version > STATE_VERSION {
            return Err(StateError::UnsupportedVersion(state.version));
        }

        let mut restored = 0;
        for (name, value) in state.parameters.iter() {
            match ParameterId::from_name(name) {
                Some(id) => {
                    self.store(id, *value);
                    restored += 1;
                }
                None => warn!("skipping unknown parameter \"{}\" in saved state", name),
            }
        }
        self.notify();
        info!("restored {} parameter(s) from state v{}", restored, state.version);
        Ok(())
    }

    /// Serialize [`Self::state`] as pretty JSON.
    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(&self.state())?)
    }

    pub fn restore_json(&self, json: &str) -> Result<(), StateError> {
        let state: ParameterState = serde_json::from_str(json)?;
        self.restore(&state)
    }

    fn store(&self, id: ParameterId, value: f32) -> f32 {
        let range = id.descriptor().range;
        let stored = range.constrain(value);
        if !range.contains(value) {
            debug!("{} value {} clamped to {}", id.name(), value, stored);
        }
        self.values[id.index()].store(stored, Ordering::Release);
        stored
    }

    fn notify(&self) {
        self.changes.fetch_add(1, Ordering::AcqRel);
        for listener in self.listeners.read().iter() {
            listener.mark();
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup(name: &str) -> Result<ParameterId, ParameterError> {
    ParameterId::from_name(name).ok_or_else(|| ParameterError::UnknownParameter(name.to_string()))
}
