//! Protocol module - block framing and the reader interface.
//!
//! This module implements the block-framing sublayer of the object stream:
//! - Lead-byte tags and block header encoding
//! - [`BlockDecoder`], the framing state machine
//! - [`WireReader`], the capability set exposed to deserialization logic

mod block;
mod reader;
pub mod wire_format;

pub use block::{BlockDecoder, SavedFraming};
pub use reader::{ObjectRead, WireReader};
pub use wire_format::{build_block, tags, BlockHeader, DEFAULT_MAX_BLOCK_LEN};
