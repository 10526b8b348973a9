//! Codec descriptors published to the host framework.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use serde::Serialize;

use crate::engine::backend::{Frame, Packet};
use crate::engine::defaults::DefaultOverlayEntry;
use crate::engine::error::EncodeError;
use crate::engine::params::{SdkVersion, Schema};
use crate::engine::session::EncoderSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecId {
    H264,
    Hevc,
}

/// Raw frame layouts the encoder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Nv12,
    Yuv420p,
    Yuv444p,
    /// 10-bit 4:2:0, SDK 7+
    P010le,
    /// 16-bit 4:4:4, SDK 7+
    Yuv444p16le,
    /// Frames already resident in CUDA memory
    Cuda,
}

impl PixelFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nv12 => "nv12",
            Self::Yuv420p => "yuv420p",
            Self::Yuv444p => "yuv444p",
            Self::P010le => "p010le",
            Self::Yuv444p16le => "yuv444p16le",
            Self::Cuda => "cuda",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Nv12,
            Self::Yuv420p,
            Self::Yuv444p,
            Self::P010le,
            Self::Yuv444p16le,
            Self::Cuda,
        ]
        .into_iter()
        .find(|f| f.name() == name)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static PIX_FMTS_SDK6: &[PixelFormat] = &[
    PixelFormat::Nv12,
    PixelFormat::Yuv420p,
    PixelFormat::Yuv444p,
    PixelFormat::Cuda,
];

static PIX_FMTS_SDK7: &[PixelFormat] = &[
    PixelFormat::Nv12,
    PixelFormat::Yuv420p,
    PixelFormat::Yuv444p,
    PixelFormat::P010le,
    PixelFormat::Yuv444p16le,
    PixelFormat::Cuda,
];

/// Pixel formats NVENC accepts on `sdk`
pub fn nvenc_pix_fmts(sdk: SdkVersion) -> &'static [PixelFormat] {
    if sdk.major >= 7 {
        PIX_FMTS_SDK7
    } else {
        PIX_FMTS_SDK6
    }
}

/// Capability bits advertised with a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Capabilities(u32);

impl Capabilities {
    /// Output may lag input; callers drain with an empty frame.
    pub const DELAY: Capabilities = Capabilities(1 << 5);
    /// `close` must run even when `init` failed part way.
    pub const INIT_CLEANUP: Capabilities = Capabilities(1 << 16);

    pub const fn empty() -> Self {
        Capabilities(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::DELAY) {
            names.push("delay");
        }
        if self.contains(Self::INIT_CLEANUP) {
            names.push("init-cleanup");
        }
        names
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 | rhs.0)
    }
}

pub type InitFn = fn(&mut EncoderSession) -> Result<(), EncodeError>;
pub type EncodeFn = fn(&mut EncoderSession, Option<&Frame>) -> Result<Option<Packet>, EncodeError>;
pub type CloseFn = fn(&mut EncoderSession);

/// Immutable registration record for one codec name.
#[derive(Clone)]
pub struct CodecDescriptor {
    pub name: &'static str,
    pub long_name: &'static str,
    pub media_type: MediaType,
    pub id: CodecId,
    pub init: InitFn,
    pub encode: EncodeFn,
    pub close: CloseFn,
    pub priv_data_size: usize,
    pub schema: Arc<Schema>,
    pub defaults: &'static [DefaultOverlayEntry],
    pub pix_fmts: &'static [PixelFormat],
    pub capabilities: Capabilities,
}

impl CodecDescriptor {
    /// A second registration of this codec under an old name.
    ///
    /// Everything is shared with `self` except the name and the init entry
    /// point, which is expected to wrap `self.init`.
    pub fn deprecated_alias(&self, name: &'static str, init: InitFn) -> CodecDescriptor {
        CodecDescriptor {
            name,
            init,
            ..self.clone()
        }
    }

    pub fn supports_pix_fmt(&self, format: PixelFormat) -> bool {
        self.pix_fmts.contains(&format)
    }
}

impl fmt::Debug for CodecDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecDescriptor")
            .field("name", &self.name)
            .field("long_name", &self.long_name)
            .field("media_type", &self.media_type)
            .field("id", &self.id)
            .field("priv_data_size", &self.priv_data_size)
            .field("sdk", &self.schema.sdk())
            .field("pix_fmts", &self.pix_fmts)
            .field("capabilities", &self.capabilities.names())
            .finish_non_exhaustive()
    }
}
