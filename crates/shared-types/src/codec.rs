//! # Wire Codec
//!
//! Two encodings are used:
//!
//! - [`encode`]/[`decode`]: `bincode` with fixed-width integers for wire
//!   messages and storage values. Decoding untrusted bytes is size-limited and
//!   rejects trailing garbage.
//! - [`Encoder`]: an infallible big-endian writer producing the canonical
//!   preimages that are hashed (block/transaction identity) or signed (votes,
//!   proposals). Every field is fixed-width or length-prefixed.

use crate::errors::CodecError;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Largest message accepted from a peer.
pub const MAX_MESSAGE_SIZE: u64 = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_SIZE)
}

/// Serialize a value to bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    options()
        .serialize(value)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// Deserialize a value from untrusted bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    options()
        .deserialize(bytes)
        .map_err(|e| CodecError::Decode(e.to_string()))
}

/// Canonical preimage writer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// New empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one byte.
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// Write a bool as one byte.
    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_u8(u8::from(value))
    }

    /// Write a big-endian u32.
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Write a big-endian u64.
    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Write fixed-width bytes without a prefix.
    pub fn write_fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Write a u32 length prefix followed by the bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        // Payloads are bounded well below 4 GiB by MAX_MESSAGE_SIZE.
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Finish and return the buffer.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_layout() {
        let bytes = Encoder::new()
            .write_u8(7)
            .write_u32(1)
            .write_bytes(b"ab")
            .write_bool(true)
            .finish();

        assert_eq!(bytes, vec![7, 0, 0, 0, 1, 0, 0, 0, 2, b'a', b'b', 1]);
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode(&42u64).unwrap();
        assert_eq!(decode::<u64>(&bytes).unwrap(), 42);

        bytes.push(0);
        assert!(decode::<u64>(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let bytes = encode(&(1u64, vec![1u8, 2, 3])).unwrap();
        assert!(decode::<(u64, Vec<u8>)>(&bytes[..bytes.len() - 1]).is_err());
    }
}
