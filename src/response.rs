//! Invocation-response envelope parsing.
//!
//! A response message carries a 16-bit invocation identifier, a marshalled
//! result value, and a marshalled mapping of string keys to attachment
//! values. Decoding is two-phase:
//!
//! 1. [`InvocationResponse::read_header`] consumes exactly the identifier, so
//!    the correlation layer (external) can route the message to its pending
//!    invocation without touching the rest of the stream.
//! 2. [`InvocationResponse::into_result`] decodes the remainder when the
//!    result is explicitly requested.
//!
//! The deferred decode reads the stream exactly once; requesting the result
//! again would mean re-consuming stream data, so callers must request it
//! exactly once. One attachment may carry a "weak affinity" routing hint,
//! surfaced via [`DecodedResponse::weak_affinity`] for the outer layer to
//! consume.

use crate::error::Result;
use crate::source::{CountingSource, ObjectSource};

/// Attachment key carrying the weak-affinity routing hint.
pub const WEAK_AFFINITY_KEY: &str = "weak-affinity";

/// A response whose result has not been decoded yet.
pub struct InvocationResponse<S> {
    invocation_id: u16,
    source: S,
}

impl<S: ObjectSource> InvocationResponse<S> {
    /// Read the invocation identifier and capture the stream for deferred
    /// decoding.
    pub fn read_header(mut source: S) -> Result<Self> {
        let invocation_id = source.read_u16()?;
        Ok(Self {
            invocation_id,
            source,
        })
    }

    /// Identifier correlating this response to a pending invocation.
    #[inline]
    pub fn invocation_id(&self) -> u16 {
        self.invocation_id
    }

    /// Decode the result value and the attachment mapping.
    ///
    /// Consumes the response; the stream is read here and must not be read
    /// again for this message.
    pub fn into_result(self) -> Result<DecodedResponse<S::Value>> {
        let mut source = CountingSource::new(self.source);
        let result = read_marshalled(&mut source)?;
        let attachments = read_marshalled(&mut source)?;
        tracing::debug!(
            "Decoded response for invocation {} ({} bytes through the raw seam)",
            self.invocation_id,
            source.bytes_read()
        );
        Ok(DecodedResponse {
            result,
            attachments,
        })
    }
}

/// A fully decoded invocation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse<V> {
    /// The marshalled invocation result.
    pub result: V,
    /// The marshalled attachment mapping (string keys to values).
    pub attachments: V,
}

impl DecodedResponse<serde_json::Value> {
    /// The weak-affinity routing hint, if the server attached one.
    pub fn weak_affinity(&self) -> Option<&serde_json::Value> {
        self.attachments
            .as_object()
            .and_then(|map| map.get(WEAK_AFFINITY_KEY))
    }
}

/// One marshalled value read directly from the source (lead byte, then the
/// owner's full object decode).
fn read_marshalled<S: ObjectSource>(source: &mut S) -> Result<S::Value> {
    let lead = source.read_u8()?;
    source.read_object(lead, false, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MsgPackCodec, MsgPackSource};
    use crate::error::BlockwireError;

    fn envelope(
        invocation_id: u16,
        result: &serde_json::Value,
        attachments: &serde_json::Value,
    ) -> Vec<u8> {
        let mut stream = invocation_id.to_be_bytes().to_vec();
        stream.extend(MsgPackCodec::encode(result).unwrap());
        stream.extend(MsgPackCodec::encode(attachments).unwrap());
        stream
    }

    #[test]
    fn test_header_reads_only_the_invocation_id() {
        let stream = envelope(0x0102, &serde_json::json!("ok"), &serde_json::json!({}));
        let total = stream.len();

        let response = InvocationResponse::read_header(MsgPackSource::new(stream)).unwrap();
        assert_eq!(response.invocation_id(), 0x0102);
        assert_eq!(response.source.remaining(), total - 2);
    }

    #[test]
    fn test_lazy_result_decode() {
        let result = serde_json::json!({"rows": [1, 2, 3]});
        let attachments = serde_json::json!({WEAK_AFFINITY_KEY: "node-7", "trace": "abc"});
        let stream = envelope(41, &result, &attachments);

        let response = InvocationResponse::read_header(MsgPackSource::new(stream)).unwrap();
        let decoded = response.into_result().unwrap();

        assert_eq!(decoded.result, result);
        assert_eq!(decoded.weak_affinity(), Some(&serde_json::json!("node-7")));
    }

    #[test]
    fn test_no_weak_affinity() {
        let stream = envelope(7, &serde_json::json!(true), &serde_json::json!({"other": 1}));

        let decoded = InvocationResponse::read_header(MsgPackSource::new(stream))
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(decoded.weak_affinity(), None);
    }

    #[test]
    fn test_truncated_header_errors() {
        let result = InvocationResponse::read_header(MsgPackSource::new(vec![0x01u8]));
        assert!(matches!(result, Err(BlockwireError::UnexpectedEof)));
    }

    #[test]
    fn test_truncated_body_errors() {
        // Identifier only; the result value is missing.
        let response =
            InvocationResponse::read_header(MsgPackSource::new(vec![0x00u8, 0x05])).unwrap();
        assert!(response.into_result().is_err());
    }
}
