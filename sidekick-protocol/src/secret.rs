//! Extraction of the secret value from an agent reply.
//!
//! Agents return the secret base64-encoded. Some encoders pad their output
//! with trailing whitespace or newlines, which is trimmed before decoding.

use crate::error::ProtocolError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// Characters stripped from the end of an encoded secret.
pub const TRAILING_WHITESPACE: [char; 6] = [' ', '\t', '\n', '\r', '\x0c', '\x0b'];

/// Strips trailing whitespace from an encoded secret.
///
/// Returns `None` if nothing is left.
pub fn trim_encoded(value: &str) -> Option<&str> {
    let trimmed = value.trim_end_matches(&TRAILING_WHITESPACE[..]);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Decodes the text of a `SecretValue` field into raw bytes.
pub trait SecretDecoder {
    /// Upper bound on the decoded size of `encoded_len` input bytes.
    fn decoded_size_upper_bound(&self, encoded_len: usize) -> usize;

    /// Validates `encoded` and decodes it into `out`, returning the number of
    /// bytes written.
    fn validate_and_decode(&self, encoded: &[u8], out: &mut [u8]) -> Result<usize, ProtocolError>;

    /// Decodes a trimmed value into an owned [`Secret`].
    fn decode_secret(&self, encoded: &str) -> Result<Secret, ProtocolError> {
        let bound = self.decoded_size_upper_bound(encoded.len());

        // One spare byte past the bound for callers appending a terminator.
        let mut buf = vec![0u8; bound + 1];
        let decoded = self
            .validate_and_decode(encoded.as_bytes(), &mut buf[..bound])
            .and_then(|len| {
                if len > bound {
                    Err(ProtocolError::InvalidBase64(format!(
                        "decoder reported {len} bytes for a {bound} byte buffer"
                    )))
                } else {
                    Ok(len)
                }
            });

        match decoded {
            Ok(len) => {
                buf.truncate(len);
                Ok(Secret { bytes: buf })
            }
            Err(e) => {
                buf.fill(0);
                Err(e)
            }
        }
    }
}

/// Standard-alphabet base64 with canonical padding required.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Decoder;

impl SecretDecoder for Base64Decoder {
    fn decoded_size_upper_bound(&self, encoded_len: usize) -> usize {
        base64::decoded_len_estimate(encoded_len)
    }

    fn validate_and_decode(&self, encoded: &[u8], out: &mut [u8]) -> Result<usize, ProtocolError> {
        STANDARD
            .decode_slice(encoded, out)
            .map_err(|e| ProtocolError::InvalidBase64(e.to_string()))
    }
}

/// A decoded secret, owned by the caller.
///
/// The allocation always has room for at least one byte past the secret, so
/// [`Secret::into_nul_terminated`] never reallocates. Zeroing the bytes when
/// done is up to the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl Secret {
    /// Wraps already decoded bytes.
    pub fn new(mut bytes: Vec<u8>) -> Self {
        bytes.reserve_exact(1);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes the allocation can hold without growing.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Interprets the secret as UTF-8 text.
    pub fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends a NUL byte, using the reserved spare capacity.
    pub fn into_nul_terminated(mut self) -> Vec<u8> {
        self.bytes.push(0);
        self.bytes
    }
}

impl AsRef<[u8]> for Secret {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.bytes.len())
    }
}
