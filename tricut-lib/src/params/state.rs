//! Persisted parameter state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current layout version written by [`ParameterStore::state`].
///
/// [`ParameterStore::state`]: crate::params::ParameterStore::state
pub const STATE_VERSION: u32 = 1;

/// Named parameter values as stored by a host session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterState {
    pub version: u32,
    pub parameters: BTreeMap<String, f32>,
}

impl Default for ParameterState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            parameters: BTreeMap::new(),
        }
    }
}
