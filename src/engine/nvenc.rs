//! Entry points shared by every NVENC HEVC registration.

use tracing::{debug, info, warn};

use crate::engine::backend::{Frame, HardwareSession, Packet};
use crate::engine::error::EncodeError;
use crate::engine::registry::CANONICAL_NAME;
use crate::engine::session::EncoderSession;
use crate::engine::tuning::{DeviceSelection, SessionParams};

/// Resolve the session settings and open a hardware session.
pub fn encode_init(session: &mut EncoderSession) -> Result<(), EncodeError> {
    let codec = session.codec();
    let pix_fmt = session.ctx.pix_fmt;
    if !codec.supports_pix_fmt(pix_fmt) {
        return Err(EncodeError::UnsupportedPixelFormat {
            format: pix_fmt,
            codec: codec.name,
        });
    }

    let ctx = &session.ctx;
    let params = SessionParams::resolve(ctx.width, ctx.height, pix_fmt, &ctx.settings, &ctx.generic)?;
    debug!(?params, "resolved session parameters");
    // Kept even if opening fails, so callers can inspect what was attempted
    session.params = Some(params.clone());

    let (index, hw) = open_device(session, &params)?;
    session.hw = Some(hw);

    info!(
        codec = session.codec().name,
        device = index,
        width = params.width,
        height = params.height,
        pix_fmt = %params.pix_fmt,
        preset = ?params.preset,
        "opened NVENC session"
    );
    Ok(())
}

fn open_device(
    session: &EncoderSession,
    params: &SessionParams,
) -> Result<(usize, Box<dyn HardwareSession>), EncodeError> {
    let devices = session.backend.devices();
    if devices.is_empty() {
        return Err(EncodeError::DeviceUnavailable("no CUDA capable devices found".to_string()));
    }

    match params.device {
        DeviceSelection::List => {
            for (index, device) in devices.iter().enumerate() {
                match device.compute_capability {
                    Some((major, minor)) => {
                        info!("[ GPU #{} - < {} > has Compute SM {}.{} ]", index, device.name, major, minor)
                    }
                    None => info!("[ GPU #{} - < {} > ]", index, device.name),
                }
            }
            Err(EncodeError::DevicesListed(devices.len()))
        }
        DeviceSelection::Index(index) => {
            if index >= devices.len() {
                return Err(EncodeError::DeviceUnavailable(format!(
                    "requested GPU {} but only {} found",
                    index,
                    devices.len()
                )));
            }
            let hw = session.backend.open(index, params)?;
            Ok((index, hw))
        }
        DeviceSelection::Any => {
            let mut last_error = None;
            for (index, device) in devices.iter().enumerate() {
                match session.backend.open(index, params) {
                    Ok(hw) => return Ok((index, hw)),
                    Err(e) => {
                        debug!(device = %device.name, index, error = %e, "device rejected session");
                        last_error = Some(e);
                    }
                }
            }
            match last_error {
                Some(EncodeError::UnsupportedCombination(reason)) => {
                    Err(EncodeError::UnsupportedCombination(reason))
                }
                Some(e) => Err(EncodeError::DeviceUnavailable(format!(
                    "no device accepted the session: {}",
                    e
                ))),
                None => Err(EncodeError::DeviceUnavailable("no device accepted the session".to_string())),
            }
        }
    }
}

pub fn encode_frame(
    session: &mut EncoderSession,
    frame: Option<&Frame>,
) -> Result<Option<Packet>, EncodeError> {
    let hw = session
        .hw
        .as_mut()
        .ok_or_else(|| EncodeError::Hardware("no hardware session".to_string()))?;
    hw.encode(frame)
}

/// Release whatever init managed to acquire.
pub fn encode_close(session: &mut EncoderSession) {
    if let Some(mut hw) = session.hw.take() {
        hw.close();
        debug!(codec = session.codec().name, "closed NVENC session");
    }
}

/// Init for the old codec name: warn, then behave exactly like the canonical codec.
pub fn deprecated_init(session: &mut EncoderSession) -> Result<(), EncodeError> {
    warn!("This encoder is deprecated, use '{}' instead", CANONICAL_NAME);
    encode_init(session)
}
