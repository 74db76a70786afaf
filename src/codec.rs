//! Textual transport encoding for binary ciphertext
//!
//! Encrypted files are stored as plain base64 text so they remain printable
//! and can be opened in any editor. Encoding uses the standard alphabet with
//! padding, emitted as a single unwrapped line. Decoding tolerates embedded
//! whitespace (including newlines) so line-wrapped input still round-trips.

use crate::error::{ErrorCategory, ErrorKind, Result, TextcryptError};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Encode bytes as base64 text.
///
/// Output length is exactly ceil(n/3)*4 characters.
pub fn encode(body: &[u8]) -> String {
    STANDARD.encode(body)
}

/// Decode base64 text back into bytes.
///
/// ASCII whitespace is stripped before decoding. Fails when the remaining
/// text has a length that is not a multiple of 4 or contains characters
/// outside the alphabet. An empty input decodes to an empty byte sequence.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact.as_bytes()).map_err(|e| {
        TextcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Decode,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}
