//! Byte-level codec helpers shared by every wire field.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::CryptoError;

pub fn base64_to_bytes(s: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD.decode(s.trim()).map_err(CryptoError::Base64Decode)
}

pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_utf8(bytes: Vec<u8>) -> Result<String, CryptoError> {
    String::from_utf8(bytes).map_err(CryptoError::Utf8Decode)
}
