//! Error types for blockwire-client.

use thiserror::Error;

/// Main error type for all blockwire operations.
///
/// Soft end conditions are not errors: byte-oriented reads signal exhaustion
/// with a `None` sentinel, and object reads signal optional data through
/// [`ObjectRead`](crate::protocol::ObjectRead) variants. Everything here is a
/// hard failure that aborts the current decode.
#[derive(Debug, Error)]
pub enum BlockwireError {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MsgPack serialization error (reference object codec).
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error (reference object codec).
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Stream corruption (unrecognized lead byte, bad block length, ...).
    #[error("Corrupted stream: {0}")]
    Corrupted(String),

    /// End of stream where data was required.
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// A typed object read decoded a value of the wrong type.
    #[error("Object is of the wrong type (expected {expected}, got {actual})")]
    WrongType {
        /// Type the caller asked for.
        expected: &'static str,
        /// Type the stream actually carried.
        actual: &'static str,
        /// The original narrowing failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation not valid on a nested block view (lifecycle management
    /// belongs to the top-level decoder), or `close_segment` with unconsumed
    /// block data.
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),
}

/// Result type alias using BlockwireError.
pub type Result<T> = std::result::Result<T, BlockwireError>;
