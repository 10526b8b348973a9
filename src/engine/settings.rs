//! Per-session private encoder settings.
//!
//! `EncoderSettings` holds one value per option storage field. Options are
//! bound to fields through `StorageField`, so two option names (`async_depth`
//! and `delay`) can share a field without any offset arithmetic.

use serde::Serialize;

/// Settings field an option writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageField {
    Preset,
    Profile,
    Level,
    Tier,
    Rc,
    Surfaces,
    Device,
    AsyncDepth,
    RcLookahead,
    NoScenecut,
    SpatialAq,
    Zerolatency,
    NonrefP,
    StrictGop,
    AqStrength,
    Quality,
}

impl StorageField {
    pub const ALL: [StorageField; 16] = [
        StorageField::Preset,
        StorageField::Profile,
        StorageField::Level,
        StorageField::Tier,
        StorageField::Rc,
        StorageField::Surfaces,
        StorageField::Device,
        StorageField::AsyncDepth,
        StorageField::RcLookahead,
        StorageField::NoScenecut,
        StorageField::SpatialAq,
        StorageField::Zerolatency,
        StorageField::NonrefP,
        StorageField::StrictGop,
        StorageField::AqStrength,
        StorageField::Quality,
    ];
}

/// Private settings of one encoder session.
///
/// Fields backing SDK 7+ options are `None` when the schema was built for an
/// older SDK; they are absent, not zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncoderSettings {
    pub preset: i64,
    pub profile: i64,
    pub level: i64,
    pub tier: i64,
    /// -1 = use the preset's rate control
    pub rc: i64,
    pub surfaces: i64,
    /// -1 = any device, -2 = list devices
    pub device: i64,
    /// Shared by `async_depth` and `delay`
    pub async_depth: i64,

    pub rc_lookahead: Option<i64>,
    pub no_scenecut: Option<i64>,
    pub spatial_aq: Option<i64>,
    pub zerolatency: Option<i64>,
    pub nonref_p: Option<i64>,
    pub strict_gop: Option<i64>,
    pub aq_strength: Option<i64>,
    /// `cq`; 0 = automatic
    pub quality: Option<i64>,
}

/// Size reported as the codec's private data size.
pub const PRIV_DATA_SIZE: usize = std::mem::size_of::<EncoderSettings>();

impl EncoderSettings {
    /// Settings with no option applied yet. Gated fields start absent; the
    /// schema fills in every field it advertises.
    pub(crate) fn unpopulated() -> Self {
        Self {
            preset: 0,
            profile: 0,
            level: 0,
            tier: 0,
            rc: 0,
            surfaces: 0,
            device: 0,
            async_depth: 0,
            rc_lookahead: None,
            no_scenecut: None,
            spatial_aq: None,
            zerolatency: None,
            nonref_p: None,
            strict_gop: None,
            aq_strength: None,
            quality: None,
        }
    }

    /// Read a field; None if the field is absent for this session's SDK.
    pub fn get(&self, field: StorageField) -> Option<i64> {
        match field {
            StorageField::Preset => Some(self.preset),
            StorageField::Profile => Some(self.profile),
            StorageField::Level => Some(self.level),
            StorageField::Tier => Some(self.tier),
            StorageField::Rc => Some(self.rc),
            StorageField::Surfaces => Some(self.surfaces),
            StorageField::Device => Some(self.device),
            StorageField::AsyncDepth => Some(self.async_depth),
            StorageField::RcLookahead => self.rc_lookahead,
            StorageField::NoScenecut => self.no_scenecut,
            StorageField::SpatialAq => self.spatial_aq,
            StorageField::Zerolatency => self.zerolatency,
            StorageField::NonrefP => self.nonref_p,
            StorageField::StrictGop => self.strict_gop,
            StorageField::AqStrength => self.aq_strength,
            StorageField::Quality => self.quality,
        }
    }

    /// Write a field. Values must already be validated by the schema.
    pub(crate) fn store(&mut self, field: StorageField, value: i64) {
        match field {
            StorageField::Preset => self.preset = value,
            StorageField::Profile => self.profile = value,
            StorageField::Level => self.level = value,
            StorageField::Tier => self.tier = value,
            StorageField::Rc => self.rc = value,
            StorageField::Surfaces => self.surfaces = value,
            StorageField::Device => self.device = value,
            StorageField::AsyncDepth => self.async_depth = value,
            StorageField::RcLookahead => self.rc_lookahead = Some(value),
            StorageField::NoScenecut => self.no_scenecut = Some(value),
            StorageField::SpatialAq => self.spatial_aq = Some(value),
            StorageField::Zerolatency => self.zerolatency = Some(value),
            StorageField::NonrefP => self.nonref_p = Some(value),
            StorageField::StrictGop => self.strict_gop = Some(value),
            StorageField::AqStrength => self.aq_strength = Some(value),
            StorageField::Quality => self.quality = Some(value),
        }
    }
}
