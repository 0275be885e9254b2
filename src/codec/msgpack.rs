//! MsgPack object carriage using `rmp-serde`.
//!
//! The framing layer does not define the object-graph wire format; this
//! module is the reference carriage proving any self-delimiting format fits
//! between blocks. Inline objects are MessagePack values decoded to
//! [`serde_json::Value`].
//!
//! **CRITICAL**: encoding always uses `to_vec_named`, never `to_vec` —
//! peers expect struct-as-map format, and positional arrays do not survive
//! schema evolution.
//!
//! An object whose first byte collides with a framing tag (`0xF8..=0xFB`,
//! MessagePack negative fixints -8..=-5) cannot appear inline: the framing
//! layer claims the lead byte first. Wrap such values in a map or array.
//!
//! # Example
//!
//! ```
//! use blockwire_client::codec::MsgPackCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message {
//!     id: u32,
//!     content: String,
//! }
//!
//! let msg = Message { id: 42, content: "hello".to_string() };
//! let encoded = MsgPackCodec::encode(&msg).unwrap();
//! let decoded: Message = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use std::io::Read;

use bytes::Bytes;

use crate::error::Result;
use crate::source::ObjectSource;

/// MessagePack codec for structured data.
///
/// Uses `rmp_serde::to_vec_named` so structs are serialized as maps (with
/// field names) rather than arrays (positional).
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes (struct-as-map format).
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// In-memory [`ObjectSource`] whose inline objects are MessagePack values.
///
/// This is the reference Raw Stream Owner: a byte cursor over `Bytes` plus
/// object decoding via `rmp-serde`. Identity caching and class resolution do
/// not apply to the self-describing MessagePack model, so the `unshared` and
/// `discard_missing` flags are accepted and ignored.
pub struct MsgPackSource {
    data: Bytes,
    pos: usize,
}

impl MsgPackSource {
    /// Create a source over a complete in-memory stream.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ObjectSource for MsgPackSource {
    type Value = serde_json::Value;

    fn read(&mut self) -> Result<Option<u8>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let count = buf.len().min(self.remaining());
        buf[..count].copy_from_slice(&self.data[self.pos..self.pos + count]);
        self.pos += count;
        Ok(Some(count))
    }

    fn skip(&mut self, n: u64) -> Result<u64> {
        let count = usize::try_from(n).unwrap_or(usize::MAX).min(self.remaining());
        self.pos += count;
        Ok(count as u64)
    }

    fn available(&self) -> usize {
        self.remaining()
    }

    fn read_object(
        &mut self,
        lead: u8,
        _unshared: bool,
        _discard_missing: bool,
    ) -> Result<Self::Value> {
        let mut reader = LeadReader {
            lead: Some(lead),
            rest: &self.data[self.pos..],
            consumed: 0,
        };
        let value = rmp_serde::from_read(&mut reader)?;
        self.pos += reader.consumed;
        Ok(value)
    }
}

/// Re-presents an already-consumed lead byte ahead of the remaining buffer,
/// tracking how much of the buffer the decoder consumed.
struct LeadReader<'a> {
    lead: Option<u8>,
    rest: &'a [u8],
    consumed: usize,
}

impl Read for LeadReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(lead) = self.lead.take() {
            buf[0] = lead;
            return Ok(1);
        }
        let count = buf.len().min(self.rest.len() - self.consumed);
        buf[..count].copy_from_slice(&self.rest[self.consumed..self.consumed + count]);
        self.consumed += count;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestStruct {
        id: u32,
        name: String,
        active: bool,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = TestStruct {
            id: 42,
            name: "test".to_string(),
            active: true,
        };

        let encoded = MsgPackCodec::encode(&original).unwrap();
        let decoded: TestStruct = MsgPackCodec::decode(&encoded).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_to_vec_named_produces_map_format() {
        // Structs must serialize as maps (with field names), not arrays.
        let test = TestStruct {
            id: 1,
            name: "x".to_string(),
            active: false,
        };

        let encoded = MsgPackCodec::encode(&test).unwrap();

        // MsgPack map format starts with 0x8X (fixmap); array format would
        // start with 0x9X (fixarray).
        assert_eq!(
            encoded[0] & 0xF0,
            0x80,
            "Expected map format (0x8X), got {:02X}",
            encoded[0]
        );
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let invalid = [0xC1u8]; // reserved, never valid msgpack
        let result: Result<TestStruct> = MsgPackCodec::decode(&invalid);
        assert!(result.is_err());
    }

    #[test]
    fn test_binary_payload_roundtrip() {
        let data: Vec<u8> = vec![0x01, 0x02, 0x03, 0x04, 0x05];
        let encoded = MsgPackCodec::encode(&serde_bytes::Bytes::new(&data)).unwrap();

        // bin8 format: 0xc4 + length + data.
        assert_eq!(encoded[0], 0xC4, "Expected bin8 format");

        let decoded: serde_bytes::ByteBuf = MsgPackCodec::decode(&encoded).unwrap();
        assert_eq!(decoded.as_ref(), &data);
    }

    #[test]
    fn test_source_byte_reads() {
        let mut source = MsgPackSource::new(vec![10u8, 20, 30]);

        assert_eq!(source.read().unwrap(), Some(10));
        let mut buf = [0u8; 8];
        assert_eq!(source.read_into(&mut buf).unwrap(), Some(2));
        assert_eq!(&buf[..2], &[20, 30]);
        assert_eq!(source.read().unwrap(), None);
        assert_eq!(source.read_into(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_source_skip_and_available() {
        let mut source = MsgPackSource::new(vec![0u8; 10]);
        assert_eq!(source.available(), 10);
        assert_eq!(source.skip(4).unwrap(), 4);
        assert_eq!(source.available(), 6);
        assert_eq!(source.skip(100).unwrap(), 6);
        assert_eq!(source.skip(1).unwrap(), 0);
    }

    #[test]
    fn test_source_fixed_width_reads() {
        let mut source = MsgPackSource::new(vec![0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        assert_eq!(source.read_u16().unwrap(), 0x0102);
        assert_eq!(source.read_u32().unwrap(), 0x0304_0506);
        assert_eq!(source.read_u8().unwrap(), 0x07);
        assert!(source.read_u8().is_err());
    }

    #[test]
    fn test_source_read_object_consumes_exactly_one_value() {
        let mut stream = MsgPackCodec::encode(&serde_json::json!({"a": 1})).unwrap();
        stream.push(0xEE); // trailing byte the object must not touch

        let mut source = MsgPackSource::new(stream);
        let lead = source.read_u8().unwrap();
        let value = source.read_object(lead, false, false).unwrap();

        assert_eq!(value, serde_json::json!({"a": 1}));
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.read().unwrap(), Some(0xEE));
    }

    #[test]
    fn test_source_read_object_nested() {
        let original = serde_json::json!({
            "name": "envelope",
            "items": [1, 2, 3],
            "meta": {"ok": true}
        });
        let mut source = MsgPackSource::new(MsgPackCodec::encode(&original).unwrap());

        let lead = source.read_u8().unwrap();
        assert_eq!(source.read_object(lead, false, false).unwrap(), original);
        assert_eq!(source.remaining(), 0);
    }
}
