//! Codec module - reference object carriage for the framing layer.
//!
//! - [`MsgPackCodec`] - MessagePack encode/decode using `rmp-serde`
//!   (`to_vec_named` for struct-as-map format)
//! - [`MsgPackSource`] - in-memory [`ObjectSource`](crate::source::ObjectSource)
//!   whose inline objects are MessagePack values
//!
//! The framing layer itself is format-agnostic; these types exist so the
//! crate ships one working carriage (and so the tests have a Raw Stream
//! Owner to drive the decoder with).

mod msgpack;

pub use msgpack::{MsgPackCodec, MsgPackSource};
