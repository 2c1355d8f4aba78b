//! Error types for guide operations.

use crate::time::EpgTime;

/// A time literal or stored timestamp that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time format {input:?}: {reason}")]
pub struct TimeFormatError {
    input: String,
    reason: String,
}

impl TimeFormatError {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: String::from(input),
            reason: reason.into(),
        }
    }

    /// The rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Failure of a guide operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EpgError {
    /// The referenced channel does not exist.
    #[error("channel {0} does not exist")]
    ChannelNotFound(String),

    /// A channel with the same ID is already present.
    #[error("channel {0} already exists")]
    ChannelAlreadyExists(String),

    /// No programme matches the channel and exact interval.
    #[error("no programme on channel {channel_id} from {start} to {stop}")]
    ProgrammeNotFound {
        /// Channel that was searched.
        channel_id: String,
        /// Requested start.
        start: EpgTime,
        /// Requested stop.
        stop: EpgTime,
    },

    /// A time argument could not be converted.
    #[error("failed to convert time")]
    TimeConvert(#[source] TimeFormatError),

    /// Start is not strictly earlier than stop.
    #[error("programme start {start} must be earlier than stop {stop}")]
    InvalidInterval {
        /// Offending start.
        start: EpgTime,
        /// Offending stop.
        stop: EpgTime,
    },

    /// The interval intersects an existing programme on the same channel.
    #[error("programme {start} - {stop} overlaps an existing programme on channel {channel_id}")]
    Overlap {
        /// Channel of the rejected programme.
        channel_id: String,
        /// Rejected start.
        start: EpgTime,
        /// Rejected stop.
        stop: EpgTime,
    },

    /// A stored programme timestamp is not in canonical form.
    #[error("failed to parse programme time {value:?}")]
    InvalidStoredTime {
        /// Raw attribute value.
        value: String,
        /// Parse failure.
        #[source]
        source: TimeFormatError,
    },
}

impl EpgError {
    /// Returns `true` for guide rule violations (interval ordering, overlap,
    /// corrupt stored time) as opposed to lookup or input-format failures.
    #[must_use]
    pub const fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInterval { .. } | Self::Overlap { .. } | Self::InvalidStoredTime { .. }
        )
    }
}
