//! Errors reported by encoder sessions.

use thiserror::Error;

use crate::engine::codec::PixelFormat;
use crate::engine::params::ValidationError;
use crate::engine::session::SessionState;

/// Errors that can occur while configuring, opening or driving a session.
///
/// Nothing here is retried; a failed session stays failed and the caller
/// builds a new one with different settings.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A supplied value is outside its declared range or enumeration.
    #[error(transparent)]
    SchemaViolation(#[from] ValidationError),

    /// The hardware rejected the profile/level/tier/rate-control combination.
    #[error("unsupported encoder configuration: {0}")]
    UnsupportedCombination(String),

    /// No hardware device matches the requested selection.
    #[error("no usable NVENC device: {0}")]
    DeviceUnavailable(String),

    /// `device=list` was requested; devices were logged instead of opening one.
    #[error("listed {0} NVENC device(s), no session opened")]
    DevicesListed(usize),

    #[error("pixel format {format} is not supported by {codec}")]
    UnsupportedPixelFormat {
        format: PixelFormat,
        codec: &'static str,
    },

    /// Any other failure reported by the hardware session.
    #[error("hardware encoder error: {0}")]
    Hardware(String),

    #[error("cannot {operation} a session that is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}
