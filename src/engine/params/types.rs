/// Type definitions for the NVENC HEVC option schema.
///
/// These types describe the option table that is generated from
/// hevc-nvenc-options.toml at build time.
use std::fmt;

use serde::Serialize;

use crate::engine::settings::StorageField;

/// Whether a descriptor stores a value or only labels one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// A settable integer option backed by a settings field
    Integer,
    /// A labeled value belonging to the selector of the same group
    NamedConstant,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Integer => write!(f, "int"),
            ParamKind::NamedConstant => write!(f, "const"),
        }
    }
}

/// NVENC SDK version the schema is built against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SdkVersion {
    pub major: u32,
}

impl SdkVersion {
    pub const fn new(major: u32) -> Self {
        Self { major }
    }

    /// Whether an entry guarded by `guard` is available on this SDK.
    pub fn satisfies(self, guard: Option<u32>) -> bool {
        guard.is_none_or(|required| self.major >= required)
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SDK {}", self.major)
    }
}

/// One entry of the option schema.
///
/// Selectors (`ParamKind::Integer`) are bound to a settings field; named
/// constants carry their value in `default_value` and have a degenerate
/// `0..=0` range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDescriptor {
    /// Option name as typed by the user (e.g., "preset", "rc-lookahead")
    pub name: &'static str,

    /// Human-readable help text
    pub description: &'static str,

    /// Settings field written by this option (None for constants)
    pub storage_field: Option<StorageField>,

    pub kind: ParamKind,

    /// Default for selectors, labeled value for constants
    pub default_value: i64,

    /// Inclusive lower bound
    pub min: i64,

    /// Inclusive upper bound
    pub max: i64,

    /// Enumeration this entry belongs to (e.g., "preset", "profile")
    pub group: Option<&'static str>,

    /// Closed selectors take their range from their constants (and the sentinel)
    pub closed: bool,

    /// Extra value inside a closed selector's range, e.g. rc `-1` = "use the preset's"
    pub sentinel: Option<i64>,

    /// Minimum SDK major version; None = always available
    pub version_guard: Option<u32>,
}

impl ParamDescriptor {
    pub fn is_selector(&self) -> bool {
        self.kind == ParamKind::Integer
    }

    pub fn is_constant(&self) -> bool {
        self.kind == ParamKind::NamedConstant
    }

    /// The value a named constant stands for.
    pub fn constant_value(&self) -> Option<i64> {
        self.is_constant().then_some(self.default_value)
    }

    /// Check if a value is within this descriptor's declared range
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn available_on(&self, sdk: SdkVersion) -> bool {
        sdk.satisfies(self.version_guard)
    }
}
