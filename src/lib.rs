//! # blockwire-client
//!
//! Client-side block-framing decoder for the Blockwire object-stream
//! protocol.
//!
//! Blockwire responses interleave raw byte runs ("block data") with
//! marshalled object-graph data in a single stream. This crate implements the
//! framing sublayer an RPC client uses to decode server responses:
//!
//! - **Block framing** ([`protocol`]): [`BlockDecoder`] tracks exactly how
//!   many raw bytes remain before the next structural marker and signals
//!   boundary conditions explicitly ([`ObjectRead`]).
//! - **Source seam** ([`source`]): the [`ObjectSource`] trait is the boundary
//!   to the raw object-graph decoder that owns the transport byte source;
//!   the framing layer delegates object decoding to it.
//! - **Object carriage** ([`codec`]): reference MessagePack carriage proving
//!   any self-delimiting object format fits between blocks.
//! - **Response envelope** ([`response`]): two-phase decoding of invocation
//!   responses (identifier now, result and attachments on request).
//!
//! ## Example
//!
//! ```
//! use blockwire_client::codec::MsgPackSource;
//! use blockwire_client::protocol::{build_block, tags, BlockDecoder, WireReader};
//!
//! let mut stream = build_block(&[0x01, 0x02]);
//! stream.push(tags::END_BLOCK_DATA);
//!
//! let mut decoder = BlockDecoder::new(MsgPackSource::new(stream));
//! assert_eq!(decoder.read().unwrap(), Some(0x01));
//! assert_eq!(decoder.read().unwrap(), Some(0x02));
//! assert_eq!(decoder.read().unwrap(), None);
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod response;
pub mod source;

pub use error::{BlockwireError, Result};
pub use protocol::{BlockDecoder, BlockHeader, ObjectRead, SavedFraming, WireReader};
pub use source::{CountingSource, ObjectSource, ObjectValue};
