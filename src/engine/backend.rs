//! Contract with the hardware encode session.
//!
//! The NVENC driver itself lives behind these traits: the front-end resolves
//! options into `SessionParams`, asks a `HardwareBackend` to open a session on
//! a device, then forwards frames and drains packets.

use serde::Serialize;

use crate::engine::codec::PixelFormat;
use crate::engine::error::EncodeError;
use crate::engine::tuning::SessionParams;

/// One raw input frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Presentation timestamp in stream time base units
    pub pts: i64,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// One encoded access unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub pts: i64,
    pub data: Vec<u8>,
    pub keyframe: bool,
}

/// An encode-capable device as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    /// (major, minor)
    pub compute_capability: Option<(u32, u32)>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            compute_capability: None,
        }
    }
}

/// Opens hardware encode sessions.
pub trait HardwareBackend: Send + Sync {
    /// Devices in driver order; `device=N` indexes this list.
    fn devices(&self) -> Vec<DeviceInfo>;

    /// Open a session on `device`.
    ///
    /// Rejections of the configuration itself should be reported as
    /// `EncodeError::UnsupportedCombination` so they reach the caller unchanged.
    fn open(
        &self,
        device: usize,
        params: &SessionParams,
    ) -> Result<Box<dyn HardwareSession>, EncodeError>;
}

/// A live hardware encode session.
pub trait HardwareSession: Send {
    /// Submit one frame, or `None` to drain.
    ///
    /// Returns `Ok(None)` while the encoder is still buffering, and once it is
    /// fully drained.
    fn encode(&mut self, frame: Option<&Frame>) -> Result<Option<Packet>, EncodeError>;

    /// Release every hardware resource. Called exactly once.
    fn close(&mut self);
}
