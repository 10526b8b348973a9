// Opening, driving and closing sessions against a fake backend

use std::sync::Arc;

use hevc_nvenc::engine::defaults::Tunable;
use hevc_nvenc::engine::params::{SdkVersion, ValidationError};
use hevc_nvenc::engine::tuning::{BasePreset, DeviceSelection, Preset, RateControl};
use hevc_nvenc::engine::{
    CANONICAL_NAME, CodecDescriptor, CodecRegistry, EncodeError, EncoderSession, Frame,
    PixelFormat, SessionState,
};

use crate::common::{FakeBackend, capture_logs};

fn codec(sdk: u32, name: &str) -> Arc<CodecDescriptor> {
    CodecRegistry::with_sdk(SdkVersion::new(sdk))
        .find_encoder(name)
        .unwrap()
}

fn frame(pts: i64) -> Frame {
    Frame {
        pts,
        format: PixelFormat::Nv12,
        width: 64,
        height: 64,
        data: vec![pts as u8; 16],
    }
}

#[test]
fn test_llhq_two_pass_vbr_on_first_device() {
    let backend = FakeBackend::with_devices(2);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    session.set_size(1920, 1080).unwrap();
    session.set_pixel_format(PixelFormat::Nv12).unwrap();
    session
        .set_options("preset=llhq:rc=vbr_2pass:device=any")
        .unwrap();
    session.open().unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    let opened = backend.opened();
    assert_eq!(opened.len(), 1);
    let (device, params) = &opened[0];
    assert_eq!(*device, 0);
    assert_eq!(params.preset, Preset::LowLatencyHq);
    assert_eq!(params.tuning.base, BasePreset::LowLatencyHq);
    assert!(params.tuning.low_latency);
    assert_eq!(params.rate_control.mode, Some(RateControl::TwoPassVbr));
    assert!(params.rate_control.overrides_preset);
    assert_eq!(params.device, DeviceSelection::Any);
    assert_eq!((params.width, params.height), (1920, 1080));
}

#[test]
fn test_any_skips_devices_that_fail() {
    let backend = FakeBackend::with_devices(3).rejecting(0);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    session.open().unwrap();
    assert_eq!(backend.attempts(), vec![0, 1]);
    assert_eq!(backend.opened()[0].0, 1);
}

#[test]
fn test_explicit_device_index() {
    let backend = FakeBackend::with_devices(3);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    session.set_option("device", "2").unwrap();
    session.open().unwrap();
    assert_eq!(backend.attempts(), vec![2]);
}

#[test]
fn test_missing_device_is_unavailable() {
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    session.set_option("device", "4").unwrap();
    let err = session.open().unwrap_err();
    assert!(matches!(err, EncodeError::DeviceUnavailable(_)), "{}", err);
    assert_eq!(session.state(), SessionState::Failed);
    assert!(backend.attempts().is_empty());
}

#[test]
fn test_no_devices_is_unavailable() {
    let backend = FakeBackend::with_devices(0);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    assert!(matches!(session.open(), Err(EncodeError::DeviceUnavailable(_))));
}

#[test]
fn test_device_list_logs_and_opens_nothing() {
    let backend = FakeBackend::with_devices(2);
    let (result, logs) = capture_logs(|| {
        let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
        session.set_option("device", "list").unwrap();
        session.open()
    });
    assert!(matches!(result, Err(EncodeError::DevicesListed(2))));
    assert!(logs.contains("GPU #0 - < gpu0 > has Compute SM 7.5"), "{}", logs);
    assert!(logs.contains("GPU #1 - < gpu1 >"), "{}", logs);
    assert!(backend.attempts().is_empty());
}

#[test]
fn test_configuration_refusal_reaches_caller() {
    let backend = FakeBackend::with_devices(2).refusing_configuration("rext at level 1.0");
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    session.set_options("profile=rext:level=1.0").unwrap();
    let err = session.open().unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedCombination(ref r) if r == "rext at level 1.0"));
}

#[test]
fn test_unnamed_rc_value_refused_at_open() {
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    session.set_size(1280, 720).unwrap();
    session.set_pixel_format(PixelFormat::Nv12).unwrap();
    session.set_option("rc", "3").unwrap();
    assert_eq!(session.context().settings.rc, 3);

    let err = session.open().unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedCombination(_)), "{}", err);
    assert_eq!(session.state(), SessionState::Failed);
    assert!(backend.attempts().is_empty());
}

#[test]
fn test_rext_rejected_on_sdk6() {
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec(6, CANONICAL_NAME), backend.shared());
    let err = session.set_option("profile", "rext").unwrap_err();
    assert!(matches!(
        err,
        EncodeError::SchemaViolation(ValidationError::Unavailable { required: 7, .. })
    ));
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert_eq!(session.context().settings.profile, 0);
}

#[test]
fn test_gated_option_rejected_on_sdk6() {
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec(6, CANONICAL_NAME), backend.shared());
    assert!(matches!(
        session.set_option("rc-lookahead", "8"),
        Err(EncodeError::SchemaViolation(ValidationError::Unavailable { .. }))
    ));
    assert!(matches!(
        session.set_option("bogus", "1"),
        Err(EncodeError::SchemaViolation(ValidationError::UnknownParameter(_)))
    ));
}

#[cfg(feature = "legacy-name")]
#[test]
fn test_legacy_name_resolves_identically() {
    use hevc_nvenc::engine::LEGACY_NAME;

    let backend = FakeBackend::with_devices(1);
    let mut canonical = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    let mut legacy = EncoderSession::new(codec(8, LEGACY_NAME), backend.shared());
    canonical.open().unwrap();
    legacy.open().unwrap();

    assert_eq!(canonical.context(), legacy.context());
    assert_eq!(canonical.params(), legacy.params());
    let opened = backend.opened();
    assert_eq!(opened[0], opened[1]);
}

#[test]
fn test_overlay_applied_before_options() {
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    let generic = &session.context().generic;
    assert_eq!(generic.bit_rate, Tunable::Delegate);
    assert_eq!(generic.qmin, Tunable::Delegate);
    assert_eq!(generic.qcompress, Tunable::Delegate);

    session.set_options("b=0:qmin=-1").unwrap();
    let generic = &session.context().generic;
    assert_eq!(generic.bit_rate, Tunable::Set(0));
    assert_eq!(generic.qmin, Tunable::Set(-1));
}

#[test]
fn test_unsupported_pixel_format() {
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec(6, CANONICAL_NAME), backend.shared());
    session.set_pixel_format(PixelFormat::P010le).unwrap();
    let err = session.open().unwrap_err();
    assert!(matches!(
        err,
        EncodeError::UnsupportedPixelFormat {
            format: PixelFormat::P010le,
            ..
        }
    ));
}

#[test]
fn test_delayed_output_is_drained() {
    let backend = FakeBackend::with_devices(1).with_delay(2);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    session.open().unwrap();

    let mut packets = Vec::new();
    for pts in 0..4 {
        if let Some(packet) = session.encode(Some(&frame(pts))).unwrap() {
            packets.push(packet.pts);
        }
    }
    assert_eq!(packets, vec![0, 1]);

    while let Some(packet) = session.encode(None).unwrap() {
        packets.push(packet.pts);
    }
    assert_eq!(packets, vec![0, 1, 2, 3]);

    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(backend.closed(), 1);
}

#[test]
fn test_state_machine_guards() {
    let backend = FakeBackend::with_devices(1);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    assert!(matches!(
        session.encode(None),
        Err(EncodeError::InvalidState {
            state: SessionState::Uninitialized,
            ..
        })
    ));

    session.open().unwrap();
    assert!(matches!(
        session.set_option("preset", "hq"),
        Err(EncodeError::InvalidState { .. })
    ));
    assert!(matches!(session.open(), Err(EncodeError::InvalidState { .. })));

    session.close();
    session.close();
    assert_eq!(backend.closed(), 1);
    assert!(matches!(
        session.encode(None),
        Err(EncodeError::InvalidState {
            state: SessionState::Closed,
            ..
        })
    ));
}

#[test]
fn test_failed_session_closes_cleanly() {
    let backend = FakeBackend::with_devices(1).rejecting(0);
    let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
    assert!(session.open().is_err());
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.params().is_some());
    assert!(matches!(session.encode(None), Err(EncodeError::InvalidState { .. })));

    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(backend.closed(), 0);
}

#[test]
fn test_drop_releases_open_session() {
    let backend = FakeBackend::with_devices(1);
    {
        let mut session = EncoderSession::new(codec(8, CANONICAL_NAME), backend.shared());
        session.open().unwrap();
    }
    assert_eq!(backend.closed(), 1);
}
