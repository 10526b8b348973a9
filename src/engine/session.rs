//! Encoder session lifecycle.
//!
//! A session is created from a codec descriptor, configured with options
//! while uninitialized, opened through the descriptor's init entry point,
//! fed frames and finally closed.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::engine::backend::{Frame, HardwareBackend, HardwareSession, Packet};
use crate::engine::codec::{Capabilities, CodecDescriptor, PixelFormat};
use crate::engine::defaults::GenericProperties;
use crate::engine::error::EncodeError;
use crate::engine::params::parse_option_string;
use crate::engine::settings::EncoderSettings;
use crate::engine::tuning::SessionParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
    Failed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Per-session configuration visible to the codec entry points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodecContext {
    pub width: u32,
    pub height: u32,
    pub pix_fmt: PixelFormat,
    pub generic: GenericProperties,
    pub settings: EncoderSettings,
}

pub struct EncoderSession {
    codec: Arc<CodecDescriptor>,
    pub(crate) backend: Arc<dyn HardwareBackend>,
    pub(crate) ctx: CodecContext,
    pub(crate) hw: Option<Box<dyn HardwareSession>>,
    pub(crate) params: Option<SessionParams>,
    state: SessionState,
}

impl EncoderSession {
    /// New session with the codec's default overlay and option defaults applied.
    pub fn new(codec: Arc<CodecDescriptor>, backend: Arc<dyn HardwareBackend>) -> Self {
        let mut generic = GenericProperties::host_defaults();
        generic.apply_overlay(codec.defaults);
        let settings = codec.schema.defaults();

        Self {
            backend,
            ctx: CodecContext {
                width: 0,
                height: 0,
                pix_fmt: PixelFormat::Yuv420p,
                generic,
                settings,
            },
            hw: None,
            params: None,
            state: SessionState::Uninitialized,
            codec,
        }
    }

    pub fn codec(&self) -> &CodecDescriptor {
        &self.codec
    }

    pub fn context(&self) -> &CodecContext {
        &self.ctx
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Parameters handed to the hardware, once init got that far
    pub fn params(&self) -> Option<&SessionParams> {
        self.params.as_ref()
    }

    fn require(&self, operation: &'static str, state: SessionState) -> Result<(), EncodeError> {
        if self.state != state {
            return Err(EncodeError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Set one option, generic or codec-private.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), EncodeError> {
        self.require("configure", SessionState::Uninitialized)?;

        if GenericProperties::is_generic(key) {
            self.ctx.generic.set(key, value)?;
            debug!(option = key, value, "applied generic option");
        } else {
            self.codec.schema.apply(&mut self.ctx.settings, key, value)?;
        }
        Ok(())
    }

    /// Apply a `key=value:key=value` string in order.
    pub fn set_options(&mut self, options: &str) -> Result<(), EncodeError> {
        for (key, value) in parse_option_string(options)? {
            self.set_option(&key, &value)?;
        }
        Ok(())
    }

    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), EncodeError> {
        self.require("configure", SessionState::Uninitialized)?;
        self.ctx.width = width;
        self.ctx.height = height;
        Ok(())
    }

    pub fn set_pixel_format(&mut self, format: PixelFormat) -> Result<(), EncodeError> {
        self.require("configure", SessionState::Uninitialized)?;
        self.ctx.pix_fmt = format;
        Ok(())
    }

    /// Run the codec's init entry point.
    ///
    /// On failure the session is `Failed`; only `close` is accepted afterwards.
    pub fn open(&mut self) -> Result<(), EncodeError> {
        self.require("open", SessionState::Uninitialized)?;

        let init = self.codec.init;
        match init(self) {
            Ok(()) => {
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Submit a frame, or `None` to drain buffered output.
    pub fn encode(&mut self, frame: Option<&Frame>) -> Result<Option<Packet>, EncodeError> {
        self.require("encode", SessionState::Ready)?;
        let encode = self.codec.encode;
        encode(self, frame)
    }

    /// Release the session. Safe from any state; a second call does nothing.
    pub fn close(&mut self) {
        match self.state {
            SessionState::Closed => return,
            SessionState::Failed
                if !self.codec.capabilities.contains(Capabilities::INIT_CLEANUP) =>
            {
                self.hw = None;
            }
            SessionState::Ready | SessionState::Failed => {
                let close = self.codec.close;
                close(self);
            }
            SessionState::Uninitialized => {}
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        if matches!(self.state, SessionState::Ready | SessionState::Failed) {
            self.close();
        }
    }
}

impl fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderSession")
            .field("codec", &self.codec.name)
            .field("state", &self.state)
            .field("ctx", &self.ctx)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
