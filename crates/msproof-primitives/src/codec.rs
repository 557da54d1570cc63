//! Length-prefixed binary codec
//!
//! Proof payloads travel as `uvarint(len(body)) || body`, where the body is
//! the bincode encoding of the value. A `Codec` is an explicit value handed
//! to whoever needs to decode; its only configuration is the frame limit.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Default maximum body size accepted by [`Codec::decode_length_prefixed`] (4 MiB)
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 4 * 1024 * 1024;

/// Errors raised while framing or (de)serializing a payload
#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame ended before the declared length prefix or body
    #[error("Truncated payload: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Length prefix is not a valid varint
    #[error("Invalid length prefix")]
    InvalidLengthPrefix,

    /// Declared body length exceeds the configured limit
    #[error("Payload of {len} bytes exceeds limit of {max} bytes")]
    TooLarge { len: usize, max: usize },

    /// Extra bytes after the declared body
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    /// Body failed to (de)serialize
    #[error("Body encoding error: {0}")]
    Body(#[from] bincode::Error),
}

/// Append `value` as an unsigned LEB128 varint
pub fn encode_uvarint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Read an unsigned LEB128 varint, returning the value and bytes consumed
pub fn decode_uvarint(bytes: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        if i == 10 {
            return Err(CodecError::InvalidLengthPrefix);
        }
        let low = u64::from(byte & 0x7f);
        if i == 9 && low > 1 {
            return Err(CodecError::InvalidLengthPrefix);
        }
        value |= low << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::Truncated {
        expected: bytes.len() + 1,
        actual: bytes.len(),
    })
}

/// Explicit codec configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    max_payload_len: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_LEN)
    }
}

impl Codec {
    /// Create a codec accepting bodies up to `max_payload_len` bytes
    pub const fn new(max_payload_len: usize) -> Self {
        Self { max_payload_len }
    }

    /// Configured body limit
    pub const fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    /// Serialize `value` with a varint length prefix
    pub fn encode_length_prefixed<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let body = bincode::serialize(value)?;
        if body.len() > self.max_payload_len {
            return Err(CodecError::TooLarge {
                len: body.len(),
                max: self.max_payload_len,
            });
        }
        let mut out = Vec::with_capacity(body.len() + 10);
        encode_uvarint(body.len() as u64, &mut out);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Deserialize a length-prefixed frame; the frame must be consumed exactly
    pub fn decode_length_prefixed<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let (declared, prefix_len) = decode_uvarint(bytes)?;
        let declared = usize::try_from(declared).map_err(|_| CodecError::InvalidLengthPrefix)?;
        if declared > self.max_payload_len {
            return Err(CodecError::TooLarge {
                len: declared,
                max: self.max_payload_len,
            });
        }

        let body = &bytes[prefix_len..];
        if body.len() < declared {
            return Err(CodecError::Truncated {
                expected: declared,
                actual: body.len(),
            });
        }
        if body.len() > declared {
            return Err(CodecError::TrailingBytes(body.len() - declared));
        }

        Ok(bincode::deserialize(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        data: Vec<u8>,
    }

    fn sample() -> Sample {
        Sample {
            name: "acc".to_string(),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_uvarint_encoding() {
        let mut out = Vec::new();
        encode_uvarint(0, &mut out);
        assert_eq!(out, vec![0x00]);

        out.clear();
        encode_uvarint(127, &mut out);
        assert_eq!(out, vec![0x7f]);

        out.clear();
        encode_uvarint(300, &mut out);
        assert_eq!(out, vec![0xac, 0x02]);

        assert_eq!(decode_uvarint(&[0xac, 0x02, 0xff]).unwrap(), (300, 2));
    }

    #[test]
    fn test_uvarint_max_value() {
        let mut out = Vec::new();
        encode_uvarint(u64::MAX, &mut out);
        assert_eq!(out.len(), 10);
        assert_eq!(decode_uvarint(&out).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn test_uvarint_overflow_rejected() {
        let bytes = [0xff; 11];
        assert!(matches!(decode_uvarint(&bytes), Err(CodecError::InvalidLengthPrefix)));
    }

    #[test]
    fn test_uvarint_unterminated() {
        assert!(matches!(decode_uvarint(&[0x80, 0x80]), Err(CodecError::Truncated { .. })));
        assert!(matches!(decode_uvarint(&[]), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_frame_roundtrip() {
        let codec = Codec::default();
        let bytes = codec.encode_length_prefixed(&sample()).unwrap();
        let decoded: Sample = codec.decode_length_prefixed(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let codec = Codec::default();
        let bytes = codec.encode_length_prefixed(&sample()).unwrap();
        let result: Result<Sample, _> = codec.decode_length_prefixed(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let codec = Codec::default();
        let mut bytes = codec.encode_length_prefixed(&sample()).unwrap();
        bytes.push(0);
        let result: Result<Sample, _> = codec.decode_length_prefixed(&bytes);
        assert!(matches!(result, Err(CodecError::TrailingBytes(1))));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let small = Codec::new(4);
        let bytes = Codec::default().encode_length_prefixed(&sample()).unwrap();
        let result: Result<Sample, _> = small.decode_length_prefixed(&bytes);
        assert!(matches!(result, Err(CodecError::TooLarge { max: 4, .. })));
        assert!(matches!(
            small.encode_length_prefixed(&sample()),
            Err(CodecError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_garbage_body_rejected() {
        let codec = Codec::default();
        // Declares a 3-byte body that cannot hold a string length
        let result: Result<Sample, _> = codec.decode_length_prefixed(&[0x03, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(CodecError::Body(_))));
    }
}
