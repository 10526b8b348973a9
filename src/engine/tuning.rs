//! Resolution of session settings into hardware session parameters.
//!
//! Raw option values become typed presets, profiles and rate-control modes
//! here, and the preset/rate-control precedence rules are applied before the
//! hardware session is opened.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::codec::PixelFormat;
use crate::engine::defaults::GenericProperties;
use crate::engine::error::EncodeError;
use crate::engine::settings::EncoderSettings;

/// Fewest surfaces a session runs with
pub const MIN_SURFACES: i64 = 4;
/// Most input surfaces the hardware can register
pub const MAX_SURFACES: i64 = 64;

/// User-facing preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Default,
    Slow,
    Medium,
    Fast,
    Hp,
    Hq,
    Bd,
    LowLatencyDefault,
    LowLatencyHq,
    LowLatencyHp,
    LosslessDefault,
    LosslessHp,
}

/// Preset as understood by the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BasePreset {
    Default,
    Hp,
    Hq,
    Bd,
    LowLatencyDefault,
    LowLatencyHq,
    LowLatencyHp,
    LosslessDefault,
    LosslessHp,
}

/// What a user preset means to the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresetTuning {
    pub base: BasePreset,
    pub low_latency: bool,
    pub lossless: bool,
    /// Some(true) = two passes, Some(false) = one pass, None = hardware default
    pub two_pass: Option<bool>,
}

impl Preset {
    pub fn from_value(value: i64) -> Option<Self> {
        Some(match value {
            0 => Self::Default,
            1 => Self::Slow,
            2 => Self::Medium,
            3 => Self::Fast,
            4 => Self::Hp,
            5 => Self::Hq,
            6 => Self::Bd,
            7 => Self::LowLatencyDefault,
            8 => Self::LowLatencyHq,
            9 => Self::LowLatencyHp,
            10 => Self::LosslessDefault,
            11 => Self::LosslessHp,
            _ => return None,
        })
    }

    pub fn tuning(self) -> PresetTuning {
        let plain = |base| PresetTuning {
            base,
            low_latency: false,
            lossless: false,
            two_pass: None,
        };
        match self {
            Self::Default => plain(BasePreset::Default),
            Self::Hp => plain(BasePreset::Hp),
            Self::Hq => plain(BasePreset::Hq),
            Self::Bd => plain(BasePreset::Bd),
            Self::Slow => PresetTuning {
                two_pass: Some(true),
                ..plain(BasePreset::Hq)
            },
            Self::Medium => PresetTuning {
                two_pass: Some(false),
                ..plain(BasePreset::Hq)
            },
            Self::Fast => PresetTuning {
                two_pass: Some(false),
                ..plain(BasePreset::Hp)
            },
            Self::LowLatencyDefault => PresetTuning {
                low_latency: true,
                ..plain(BasePreset::LowLatencyDefault)
            },
            Self::LowLatencyHq => PresetTuning {
                low_latency: true,
                ..plain(BasePreset::LowLatencyHq)
            },
            Self::LowLatencyHp => PresetTuning {
                low_latency: true,
                ..plain(BasePreset::LowLatencyHp)
            },
            Self::LosslessDefault => PresetTuning {
                lossless: true,
                ..plain(BasePreset::LosslessDefault)
            },
            Self::LosslessHp => PresetTuning {
                lossless: true,
                ..plain(BasePreset::LosslessHp)
            },
        }
    }
}

/// Hardware rate-control modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateControl {
    ConstQp,
    Vbr,
    Cbr,
    VbrMinQp,
    TwoPassQuality,
    TwoPassFrameSizeCap,
    TwoPassVbr,
}

impl RateControl {
    pub fn from_value(value: i64) -> Option<Self> {
        Some(match value {
            0 => Self::ConstQp,
            1 => Self::Vbr,
            2 => Self::Cbr,
            4 => Self::VbrMinQp,
            8 => Self::TwoPassQuality,
            16 => Self::TwoPassFrameSizeCap,
            32 => Self::TwoPassVbr,
            _ => return None,
        })
    }

    /// Modes only meaningful with low-latency presets
    pub fn needs_low_latency(self) -> bool {
        matches!(self, Self::TwoPassQuality | Self::TwoPassFrameSizeCap)
    }
}

impl fmt::Display for RateControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConstQp => "constqp",
            Self::Vbr => "vbr",
            Self::Cbr => "cbr",
            Self::VbrMinQp => "vbr_minqp",
            Self::TwoPassQuality => "ll_2pass_quality",
            Self::TwoPassFrameSizeCap => "ll_2pass_size",
            Self::TwoPassVbr => "vbr_2pass",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Main,
    Main10,
    Rext,
}

impl Profile {
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Main),
            1 => Some(Self::Main10),
            2 => Some(Self::Rext),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Main,
    High,
}

/// HEVC level; `Idc` holds general_level_idc (30 × level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Auto,
    Idc(u32),
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Auto => f.write_str("auto"),
            Level::Idc(idc) => write!(f, "{}.{}", idc / 30, (idc % 30) / 3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSelection {
    /// First device that accepts the configuration
    Any,
    /// Log every device, open none
    List,
    Index(usize),
}

impl DeviceSelection {
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Any),
            -2 => Some(Self::List),
            v if v >= 0 => usize::try_from(v).ok().map(Self::Index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QpTriple {
    pub p: i64,
    pub b: i64,
    pub i: i64,
}

impl QpTriple {
    pub fn uniform(qp: i64) -> Self {
        Self { p: qp, b: qp, i: qp }
    }
}

/// Rate-control block handed to the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RateControlParams {
    /// None = keep the preset's own rate control
    pub mode: Option<RateControl>,
    /// True when `rc` was set explicitly
    pub overrides_preset: bool,
    pub const_qp: Option<QpTriple>,
    pub min_qp: Option<i64>,
    pub max_qp: Option<i64>,
    pub average_bitrate: Option<i64>,
    pub max_bitrate: Option<i64>,
    pub vbv_buffer_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lookahead {
    pub depth: i64,
    /// Adaptive I-frame insertion at scene cuts
    pub scenecut: bool,
}

/// Settings that only exist on SDK 7 and later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sdk7Extensions {
    /// Spatial AQ strength when enabled
    pub spatial_aq: Option<i64>,
    pub lookahead: Option<Lookahead>,
    pub zero_latency: bool,
    pub nonref_p: bool,
    pub strict_gop: bool,
    /// `cq`; None = automatic
    pub target_quality: Option<i64>,
}

/// Everything the hardware session needs to open
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionParams {
    pub width: u32,
    pub height: u32,
    pub pix_fmt: PixelFormat,
    pub preset: Preset,
    pub tuning: PresetTuning,
    pub profile: Profile,
    pub level: Level,
    pub tier: Tier,
    pub rate_control: RateControlParams,
    pub device: DeviceSelection,
    pub surfaces: i64,
    pub async_depth: i64,
    pub extensions: Option<Sdk7Extensions>,
}

fn invalid(what: &str, value: i64) -> EncodeError {
    EncodeError::UnsupportedCombination(format!("{} value {} is not recognized", what, value))
}

impl SessionParams {
    pub fn resolve(
        width: u32,
        height: u32,
        pix_fmt: PixelFormat,
        settings: &EncoderSettings,
        generic: &GenericProperties,
    ) -> Result<Self, EncodeError> {
        let preset = Preset::from_value(settings.preset).ok_or_else(|| invalid("preset", settings.preset))?;
        let tuning = preset.tuning();
        let profile =
            Profile::from_value(settings.profile).ok_or_else(|| invalid("profile", settings.profile))?;
        let tier = match settings.tier {
            0 => Tier::Main,
            1 => Tier::High,
            other => return Err(invalid("tier", other)),
        };
        let level = match u32::try_from(settings.level) {
            Ok(0) => Level::Auto,
            Ok(idc) => Level::Idc(idc),
            Err(_) => return Err(invalid("level", settings.level)),
        };
        let device =
            DeviceSelection::from_value(settings.device).ok_or_else(|| invalid("device", settings.device))?;

        let surfaces = settings.surfaces.clamp(MIN_SURFACES, MAX_SURFACES);
        if surfaces != settings.surfaces {
            debug!(requested = settings.surfaces, surfaces, "surface count clamped");
        }
        let async_depth = settings.async_depth.min(surfaces - 1);

        let rate_control = resolve_rate_control(settings.rc, tuning, generic)?;
        let extensions = resolve_extensions(settings, surfaces, async_depth);

        Ok(Self {
            width,
            height,
            pix_fmt,
            preset,
            tuning,
            profile,
            level,
            tier,
            rate_control,
            device,
            surfaces,
            async_depth,
            extensions,
        })
    }
}

fn resolve_rate_control(
    rc: i64,
    tuning: PresetTuning,
    generic: &GenericProperties,
) -> Result<RateControlParams, EncodeError> {
    let qmin = generic.qmin.get().filter(|q| *q >= 0);
    let qmax = generic.qmax.get().filter(|q| *q >= 0);
    let global_quality = generic.global_quality.get().filter(|q| *q > 0);

    let mut params = RateControlParams {
        average_bitrate: generic.bit_rate.get().filter(|b| *b > 0),
        max_bitrate: generic.rc_max_rate.get().filter(|b| *b > 0),
        ..RateControlParams::default()
    };

    if rc >= 0 {
        let mode = RateControl::from_value(rc).ok_or_else(|| invalid("rc", rc))?;
        params.mode = Some(mode);
        params.overrides_preset = true;

        match mode {
            RateControl::ConstQp => match global_quality {
                Some(q) => params.const_qp = Some(QpTriple::uniform(q)),
                None => warn!("constqp rate control without global_quality, using hardware QP"),
            },
            RateControl::Vbr | RateControl::TwoPassVbr => {
                if qmin.is_none() && qmax.is_none() {
                    debug!(%mode, "no qmin/qmax, quantizer left to the hardware");
                }
                params.min_qp = qmin;
                params.max_qp = qmax;
            }
            RateControl::VbrMinQp => {
                if qmin.is_none() {
                    warn!("vbr_minqp rate control without qmin");
                }
                params.min_qp = qmin;
                params.max_qp = qmax;
            }
            RateControl::TwoPassQuality | RateControl::TwoPassFrameSizeCap => {
                if !tuning.low_latency {
                    warn!(%mode, "rate control is only meaningful with low-latency presets");
                }
                params.min_qp = qmin;
                params.max_qp = qmax;
            }
            RateControl::Cbr => {}
        }
    } else if tuning.lossless {
        params.mode = Some(RateControl::ConstQp);
        params.const_qp = Some(QpTriple::uniform(0));
    } else if let Some(q) = global_quality {
        params.mode = Some(RateControl::ConstQp);
        params.const_qp = Some(QpTriple::uniform(q));
    } else if let (Some(min), Some(max)) = (qmin, qmax) {
        params.mode = Some(RateControl::Vbr);
        params.min_qp = Some(min);
        params.max_qp = Some(max);
    }

    params.vbv_buffer_size = generic
        .rc_buffer_size
        .get()
        .filter(|b| *b > 0)
        .or_else(|| params.average_bitrate.map(|b| b.saturating_mul(2)));

    Ok(params)
}

fn resolve_extensions(
    settings: &EncoderSettings,
    surfaces: i64,
    async_depth: i64,
) -> Option<Sdk7Extensions> {
    let (
        Some(rc_lookahead),
        Some(no_scenecut),
        Some(spatial_aq),
        Some(zerolatency),
        Some(nonref_p),
        Some(strict_gop),
        Some(aq_strength),
        Some(quality),
    ) = (
        settings.rc_lookahead,
        settings.no_scenecut,
        settings.spatial_aq,
        settings.zerolatency,
        settings.nonref_p,
        settings.strict_gop,
        settings.aq_strength,
        settings.quality,
    )
    else {
        return None;
    };

    let lookahead = if rc_lookahead > 0 {
        let bound = surfaces.min(async_depth) - MIN_SURFACES;
        if bound <= 0 {
            warn!(
                rc_lookahead,
                surfaces, "not enough surfaces for look-ahead, disabling it"
            );
            None
        } else {
            Some(Lookahead {
                depth: rc_lookahead.min(bound),
                scenecut: no_scenecut == 0,
            })
        }
    } else {
        None
    };

    Some(Sdk7Extensions {
        spatial_aq: (spatial_aq != 0).then_some(aq_strength),
        lookahead,
        zero_latency: zerolatency != 0,
        nonref_p: nonref_p != 0,
        strict_gop: strict_gop != 0,
        target_quality: (quality > 0).then_some(quality),
    })
}
