//! Generic encoder properties and the NVENC default overlay.
//!
//! The host framework gives every encoder generic rate-control properties
//! with its own defaults (200 kb/s, qmin 2, ...). NVENC overrides those
//! defaults so that, unless the user sets them, the hardware rate control
//! decides instead.

use serde::Serialize;
use tracing::warn;

use crate::engine::params::ValidationError;

const INT_MIN: i64 = i32::MIN as i64;
const INT_MAX: i64 = i32::MAX as i64;

/// One generic property forced to its "unset" value before options are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DefaultOverlayEntry {
    pub key: &'static str,
    pub value: &'static str,
}

/// Overlay applied to every NVENC HEVC session
pub static DEFAULTS: &[DefaultOverlayEntry] = &[
    DefaultOverlayEntry { key: "b", value: "0" },
    DefaultOverlayEntry { key: "qmin", value: "-1" },
    DefaultOverlayEntry { key: "qmax", value: "-1" },
    DefaultOverlayEntry { key: "qdiff", value: "-1" },
    DefaultOverlayEntry { key: "qblur", value: "-1" },
    DefaultOverlayEntry { key: "qcomp", value: "-1" },
];

/// A generic property either delegated to the encoder or set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tunable<T> {
    Delegate,
    Set(T),
}

impl<T: Copy> Tunable<T> {
    pub fn get(self) -> Option<T> {
        match self {
            Tunable::Delegate => None,
            Tunable::Set(v) => Some(v),
        }
    }

    pub fn is_set(self) -> bool {
        matches!(self, Tunable::Set(_))
    }
}

/// Generic (codec-independent) encoder properties of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericProperties {
    /// `b`: target bitrate in bits/s
    pub bit_rate: Tunable<i64>,
    /// `maxrate`
    pub rc_max_rate: Tunable<i64>,
    /// `bufsize`
    pub rc_buffer_size: Tunable<i64>,
    pub qmin: Tunable<i64>,
    pub qmax: Tunable<i64>,
    /// `qdiff`: max QP step between frames
    pub max_qdiff: Tunable<i64>,
    pub qblur: Tunable<f32>,
    /// `qcomp`
    pub qcompress: Tunable<f32>,
    pub global_quality: Tunable<i64>,
}

impl GenericProperties {
    /// Property names accepted by `set`.
    pub const KEYS: [&'static str; 9] = [
        "b",
        "maxrate",
        "bufsize",
        "qmin",
        "qmax",
        "qdiff",
        "qblur",
        "qcomp",
        "global_quality",
    ];

    /// Defaults the host framework gives every encoder.
    pub fn host_defaults() -> Self {
        Self {
            bit_rate: Tunable::Set(200_000),
            rc_max_rate: Tunable::Delegate,
            rc_buffer_size: Tunable::Delegate,
            qmin: Tunable::Set(2),
            qmax: Tunable::Set(31),
            max_qdiff: Tunable::Set(3),
            qblur: Tunable::Set(0.5),
            qcompress: Tunable::Set(0.5),
            global_quality: Tunable::Delegate,
        }
    }

    /// Host defaults with `overlay` applied.
    pub fn with_overlay(overlay: &[DefaultOverlayEntry]) -> Self {
        let mut props = Self::host_defaults();
        props.apply_overlay(overlay);
        props
    }

    pub fn is_generic(key: &str) -> bool {
        Self::KEYS.contains(&key)
    }

    /// Hand every overlaid property back to the encoder.
    pub fn apply_overlay(&mut self, overlay: &[DefaultOverlayEntry]) {
        for entry in overlay {
            if !self.delegate(entry.key) {
                warn!(key = entry.key, "default overlay names an unknown generic property");
            }
        }
    }

    fn delegate(&mut self, key: &str) -> bool {
        match key {
            "b" => self.bit_rate = Tunable::Delegate,
            "maxrate" => self.rc_max_rate = Tunable::Delegate,
            "bufsize" => self.rc_buffer_size = Tunable::Delegate,
            "qmin" => self.qmin = Tunable::Delegate,
            "qmax" => self.qmax = Tunable::Delegate,
            "qdiff" => self.max_qdiff = Tunable::Delegate,
            "qblur" => self.qblur = Tunable::Delegate,
            "qcomp" => self.qcompress = Tunable::Delegate,
            "global_quality" => self.global_quality = Tunable::Delegate,
            _ => return false,
        }
        true
    }

    /// Set a generic property from a user-supplied string.
    ///
    /// An explicit value is always `Tunable::Set`, including `0`.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), ValidationError> {
        let raw = raw.trim();
        match key {
            "qblur" => self.qblur = Tunable::Set(parse_float(key, raw)?),
            "qcomp" => self.qcompress = Tunable::Set(parse_float(key, raw)?),
            "b" => self.bit_rate = Tunable::Set(parse_int(key, raw, 0, i64::MAX)?),
            "maxrate" => self.rc_max_rate = Tunable::Set(parse_int(key, raw, 0, i64::MAX)?),
            "bufsize" => self.rc_buffer_size = Tunable::Set(parse_int(key, raw, 0, i64::MAX)?),
            "qmin" => self.qmin = Tunable::Set(parse_int(key, raw, -1, 69)?),
            "qmax" => self.qmax = Tunable::Set(parse_int(key, raw, -1, 1024)?),
            "qdiff" => self.max_qdiff = Tunable::Set(parse_int(key, raw, INT_MIN, INT_MAX)?),
            "global_quality" => {
                self.global_quality = Tunable::Set(parse_int(key, raw, INT_MIN, INT_MAX)?)
            }
            _ => return Err(ValidationError::UnknownParameter(key.to_string())),
        }
        Ok(())
    }
}

impl Default for GenericProperties {
    fn default() -> Self {
        Self::with_overlay(DEFAULTS)
    }
}

fn parse_int(key: &str, raw: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value = raw.parse::<i64>().map_err(|_| ValidationError::InvalidValue {
        param: key.to_string(),
        value: raw.to_string(),
    })?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            param: key.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn parse_float(key: &str, raw: &str) -> Result<f32, ValidationError> {
    raw.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= -1.0)
        .ok_or_else(|| ValidationError::InvalidValue {
            param: key.to_string(),
            value: raw.to_string(),
        })
}
