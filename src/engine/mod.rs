// Encoder front-end: option schema, codec registration and session lifecycle

pub mod backend;
pub mod codec;
pub mod defaults;
pub mod error;
pub mod hardware;
pub mod nvenc;
pub mod params;
pub mod registry;
pub mod session;
pub mod settings;
pub mod tuning;

pub use backend::{DeviceInfo, Frame, HardwareBackend, HardwareSession, Packet};
pub use codec::{Capabilities, CodecDescriptor, PixelFormat};
pub use error::EncodeError;
pub use registry::{CANONICAL_NAME, CodecRegistry, LEGACY_NAME};
pub use session::{CodecContext, EncoderSession, SessionState};
pub use tuning::SessionParams;
