//! Codec registration.
//!
//! One canonical descriptor is built for the SDK in use; the legacy name is
//! registered as an alias of it that only swaps the init entry point.

use std::sync::{Arc, OnceLock};

use crate::engine::codec::{Capabilities, CodecDescriptor, CodecId, MediaType, nvenc_pix_fmts};
use crate::engine::defaults::DEFAULTS;
use crate::engine::nvenc;
use crate::engine::params::{Schema, SdkVersion};
use crate::engine::settings::PRIV_DATA_SIZE;

pub const CANONICAL_NAME: &str = "hevc_nvenc";
pub const LEGACY_NAME: &str = "nvenc_hevc";
pub const LONG_NAME: &str = "NVIDIA NVENC HEVC encoder";

/// Canonical descriptor for `sdk`
pub fn hevc_nvenc(sdk: SdkVersion) -> CodecDescriptor {
    CodecDescriptor {
        name: CANONICAL_NAME,
        long_name: LONG_NAME,
        media_type: MediaType::Video,
        id: CodecId::Hevc,
        init: nvenc::encode_init,
        encode: nvenc::encode_frame,
        close: nvenc::encode_close,
        priv_data_size: PRIV_DATA_SIZE,
        schema: Arc::new(Schema::for_sdk(sdk)),
        defaults: DEFAULTS,
        pix_fmts: nvenc_pix_fmts(sdk),
        capabilities: Capabilities::DELAY | Capabilities::INIT_CLEANUP,
    }
}

/// Encoders known by name, in registration order
#[derive(Debug, Default)]
pub struct CodecRegistry {
    codecs: Vec<Arc<CodecDescriptor>>,
}

static BUILTIN: OnceLock<CodecRegistry> = OnceLock::new();

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Returns false if the name is already taken.
    pub fn register(&mut self, codec: CodecDescriptor) -> bool {
        if self.find_encoder(codec.name).is_some() {
            return false;
        }
        self.codecs.push(Arc::new(codec));
        true
    }

    /// Registry holding the HEVC encoder (and its legacy name) for `sdk`
    pub fn with_sdk(sdk: SdkVersion) -> Self {
        let mut registry = Self::new();
        let canonical = hevc_nvenc(sdk);
        #[cfg(feature = "legacy-name")]
        let legacy = canonical.deprecated_alias(LEGACY_NAME, nvenc::deprecated_init);
        registry.register(canonical);
        #[cfg(feature = "legacy-name")]
        registry.register(legacy);
        registry
    }

    /// Registry for the SDK the crate was built against
    pub fn builtin() -> &'static CodecRegistry {
        BUILTIN.get_or_init(|| CodecRegistry::with_sdk(SdkVersion::BUILT))
    }

    pub fn find_encoder(&self, name: &str) -> Option<Arc<CodecDescriptor>> {
        self.codecs.iter().find(|c| c.name == name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CodecDescriptor>> {
        self.codecs.iter()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
