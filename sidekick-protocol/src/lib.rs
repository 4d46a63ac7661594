//! # sidekick-protocol
//!
//! Wire protocol spoken between sidekick clients and a secret agent.
//!
//! This crate provides:
//! - The 8-byte frame header (magic + payload length, big-endian)
//! - JSON request and reply message types
//! - Trimming and base64 decoding of returned secret values
//! - Protocol error types and constants
//!
//! It performs no I/O; see `sidekick-client` for the socket side.

pub mod error;
pub mod frame;
pub mod message;
pub mod secret;

pub use error::ProtocolError;
pub use frame::{encode_frame, FrameHeader, FRAME_HEADER_SIZE, MAGIC};
pub use message::{AgentReply, SecretId, SecretRequest};
pub use secret::{trim_encoded, Base64Decoder, Secret, SecretDecoder};

/// Maximum accepted reply payload size (100 KiB).
pub const MAX_RESPONSE_SIZE: u32 = 100 * 1024;

/// Default TCP port a secret agent listens on.
pub const DEFAULT_AGENT_PORT: u16 = 3005;
