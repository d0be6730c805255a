use std::fmt::{Display, Formatter};

/// Rejection reasons for the host-facing processing entry points.
///
/// Every variant is plain data so that returning one from the audio thread
/// never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessError {
    NotPrepared,
    BlockTooLarge { len: usize, max: usize },
    UnsupportedChannels(usize),
    ChannelLengthMismatch,
}

impl Display for ProcessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPrepared => write!(f, "process called before prepare"),
            Self::BlockTooLarge { len, max } => write!(
                f,
                "block of {} samples exceeds prepared maximum of {}",
                len, max
            ),
            Self::UnsupportedChannels(count) => {
                write!(f, "unsupported channel count {} (expected 1 or 2)", count)
            }
            Self::ChannelLengthMismatch => write!(f, "channel buffers differ in length"),
        }
    }
}

impl std::error::Error for ProcessError {}

/// Error type for parameter lookups by host name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    UnknownParameter(String),
}

impl Display for ParameterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownParameter(name) => write!(f, "unknown parameter \"{}\"", name),
        }
    }
}

impl std::error::Error for ParameterError {}

/// Error type for saving and restoring persisted parameter state.
#[derive(Debug)]
pub enum StateError {
    Json(serde_json::Error),
    UnsupportedVersion(u32),
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "state json error: {}", err),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported state version {}", version)
            }
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnsupportedVersion(_) => None,
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
