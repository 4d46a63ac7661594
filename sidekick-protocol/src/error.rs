//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors: the peer sent something that does not match the
/// framing or message contract, or a request could not be framed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("bad magic: expected {:#x}, got {0:#x}", crate::frame::MAGIC)]
    BadMagic(u32),

    #[error("response too big: {size} bytes (max {max})")]
    ResponseTooLarge { size: u32, max: u32 },

    #[error("request too big: {size} bytes does not fit the frame length field")]
    RequestTooLarge { size: usize },

    #[error("failed to parse response JSON line {line} column {column} ({reason})")]
    MalformedReply {
        line: usize,
        column: usize,
        reason: String,
    },

    #[error("failed to find \"{0}\" in response")]
    MissingField(&'static str),

    #[error("failed to base64-decode secret: {0}")]
    InvalidBase64(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Builds a `MalformedReply` carrying the parser's position and message.
    pub fn malformed(err: &serde_json::Error) -> Self {
        ProtocolError::MalformedReply {
            line: err.line(),
            column: err.column(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::BadMagic(0xdeadbeef);
        let msg = err.to_string();
        assert!(msg.contains("0xdeadbeef"));
        assert!(msg.contains("0x51dec1cc"));

        let err = ProtocolError::ResponseTooLarge {
            size: 1_000_000,
            max: 102_400,
        };
        assert!(err.to_string().contains("1000000"));
        assert!(err.to_string().contains("102400"));

        let err = ProtocolError::MissingField("SecretValue");
        assert_eq!(
            err.to_string(),
            "failed to find \"SecretValue\" in response"
        );

        let err = ProtocolError::InvalidBase64("Invalid padding".to_string());
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_malformed_carries_position() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let err = ProtocolError::malformed(&parse_err);

        match err {
            ProtocolError::MalformedReply { line, column, .. } => {
                assert_eq!(line, 2);
                assert!(column > 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_magic_names_expected_magic() {
        let msg = ProtocolError::BadMagic(0).to_string();
        assert!(msg.contains(&format!("{:#x}", crate::frame::MAGIC)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_slice::<serde_json::Value>(b"nope").unwrap_err();
        let err: ProtocolError = json_err.into();
        assert!(matches!(err, ProtocolError::Json(_)));
        assert!(err.to_string().starts_with("JSON error: "));
    }
}
