// Both codec names answer with one shared implementation

use std::sync::Arc;

use hevc_nvenc::engine::codec::{CodecId, MediaType};
use hevc_nvenc::engine::params::SdkVersion;
use hevc_nvenc::engine::{
    CANONICAL_NAME, Capabilities, CodecRegistry, EncoderSession, LEGACY_NAME, PixelFormat,
};

use crate::common::{FakeBackend, capture_logs};

const DEPRECATION: &str = "This encoder is deprecated, use 'hevc_nvenc' instead";

#[test]
fn test_canonical_name_is_registered() {
    let registry = CodecRegistry::with_sdk(SdkVersion::new(8));
    let codec = registry.find_encoder(CANONICAL_NAME).unwrap();
    assert_eq!(codec.long_name, "NVIDIA NVENC HEVC encoder");
    assert_eq!(codec.media_type, MediaType::Video);
    assert_eq!(codec.id, CodecId::Hevc);
    assert!(codec.capabilities.contains(Capabilities::DELAY | Capabilities::INIT_CLEANUP));
    assert_eq!(registry.iter().next().map(|c| c.name), Some(CANONICAL_NAME));
}

#[cfg(feature = "legacy-name")]
#[test]
fn test_legacy_name_shares_schema_and_formats() {
    for sdk in [6, 7, 8] {
        let registry = CodecRegistry::with_sdk(SdkVersion::new(sdk));
        assert_eq!(registry.len(), 2);

        let canonical = registry.find_encoder(CANONICAL_NAME).unwrap();
        let legacy = registry.find_encoder(LEGACY_NAME).unwrap();
        assert!(Arc::ptr_eq(&canonical.schema, &legacy.schema));
        assert_eq!(canonical.pix_fmts, legacy.pix_fmts);
        assert_eq!(canonical.capabilities, legacy.capabilities);
        assert_eq!(canonical.id, legacy.id);
        assert_eq!(canonical.priv_data_size, legacy.priv_data_size);
        assert_eq!(
            legacy.supports_pix_fmt(PixelFormat::P010le),
            sdk >= 7,
            "SDK {}",
            sdk
        );
    }
}

#[cfg(not(feature = "legacy-name"))]
#[test]
fn test_legacy_name_absent_without_feature() {
    let registry = CodecRegistry::with_sdk(SdkVersion::new(8));
    assert!(registry.find_encoder(LEGACY_NAME).is_none());
}

#[cfg(feature = "legacy-name")]
#[test]
fn test_legacy_init_warns_once_per_session() {
    let registry = CodecRegistry::with_sdk(SdkVersion::new(8));
    let backend = FakeBackend::with_devices(1);

    let (result, logs) = capture_logs(|| {
        let mut session =
            EncoderSession::new(registry.find_encoder(LEGACY_NAME).unwrap(), backend.shared());
        session.set_size(1280, 720)?;
        session.open()?;
        session.encode(None)?;
        session.close();
        Ok::<_, hevc_nvenc::engine::EncodeError>(())
    });
    result.unwrap();
    assert_eq!(logs.matches(DEPRECATION).count(), 1, "{}", logs);
    assert!(logs.contains("WARN"));
}

#[test]
fn test_canonical_init_does_not_warn() {
    let registry = CodecRegistry::with_sdk(SdkVersion::new(8));
    let backend = FakeBackend::with_devices(1);

    let (result, logs) = capture_logs(|| {
        let mut session =
            EncoderSession::new(registry.find_encoder(CANONICAL_NAME).unwrap(), backend.shared());
        session.open()
    });
    result.unwrap();
    assert!(!logs.contains("deprecated"), "{}", logs);
}

#[cfg(feature = "legacy-name")]
#[test]
fn test_legacy_init_warns_even_when_open_fails() {
    let registry = CodecRegistry::with_sdk(SdkVersion::new(8));
    let backend = FakeBackend::with_devices(0);

    let (result, logs) = capture_logs(|| {
        let mut session =
            EncoderSession::new(registry.find_encoder(LEGACY_NAME).unwrap(), backend.shared());
        session.open()
    });
    assert!(result.is_err());
    assert_eq!(logs.matches(DEPRECATION).count(), 1);
}
