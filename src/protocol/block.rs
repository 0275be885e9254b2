//! Block-aware stream decoder.
//!
//! [`BlockDecoder`] wraps an [`ObjectSource`] and tracks exactly how many raw
//! block bytes remain before the next structural marker. The framing state is
//! a single signed count with three disjoint meanings:
//!
//! - `remaining > 0`: inside a block; this many raw bytes are available
//!   before the next header must be read
//! - `remaining == 0`: at a boundary; the next byte is a header, terminator
//!   or an object's lead byte
//! - `remaining == -1`: exhausted; no more block data follows until the
//!   state is explicitly reopened
//!
//! One decoder is created per nested custom-data segment of an enclosing
//! object's serialized form, owned exclusively by the Raw Stream Owner that
//! created it, and discarded after the segment. Construct it over `&mut S` to
//! keep the source afterwards:
//!
//! ```
//! use blockwire_client::codec::MsgPackSource;
//! use blockwire_client::protocol::{build_block, tags, BlockDecoder, WireReader};
//!
//! let mut stream = build_block(&[0x2A]);
//! stream.push(tags::END_BLOCK_DATA);
//! let mut source = MsgPackSource::new(stream);
//!
//! let mut decoder = BlockDecoder::new(&mut source);
//! assert_eq!(decoder.read().unwrap(), Some(0x2A));
//! assert_eq!(decoder.read().unwrap(), None);
//! ```

use crate::error::{BlockwireError, Result};
use crate::protocol::reader::{ObjectRead, WireReader};
use crate::protocol::wire_format::{tags, DEFAULT_MAX_BLOCK_LEN};
use crate::source::ObjectSource;

/// Exhausted sentinel for the framing state.
const EXHAUSTED: i64 = -1;

/// Framing state saved by [`BlockDecoder::suspend`].
///
/// Opaque so a suspension can only be resumed with a value this layer
/// produced; the integer inside is the suspended raw-byte count.
#[derive(Debug, Clone, Copy)]
pub struct SavedFraming(i64);

/// Block-aware decoder over an [`ObjectSource`].
///
/// Not safe for concurrent use: every call mutates the framing count, and the
/// instance must be owned exclusively by the single decode call that created
/// it for its entire lifetime.
pub struct BlockDecoder<S> {
    source: S,
    /// > 0 inside a block, 0 at a boundary, -1 exhausted.
    remaining: i64,
    max_block_len: u32,
}

impl<S: ObjectSource> BlockDecoder<S> {
    /// Create a decoder positioned at a block boundary.
    pub fn new(source: S) -> Self {
        Self::with_max_block_len(source, DEFAULT_MAX_BLOCK_LEN)
    }

    /// Create a decoder that rejects large-block headers above `max_block_len`.
    ///
    /// The default cap is the full nonnegative 32-bit domain.
    pub fn with_max_block_len(source: S, max_block_len: u32) -> Self {
        Self {
            source,
            remaining: 0,
            max_block_len,
        }
    }

    /// Access the wrapped source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Unwrap the decoder, returning the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Whether a block is currently open.
    #[inline]
    pub fn in_block(&self) -> bool {
        self.remaining > 0
    }

    /// Raw bytes remaining in the current block (0 at a boundary or when
    /// exhausted).
    #[inline]
    pub fn block_remaining(&self) -> u64 {
        if self.remaining > 0 {
            self.remaining as u64
        } else {
            0
        }
    }

    /// Decode a block header from an already-consumed lead byte and update
    /// the framing state.
    ///
    /// # Errors
    ///
    /// [`BlockwireError::Corrupted`] if the lead byte matches no known tag,
    /// or a large-block length is negative or above the configured cap.
    pub fn read_block_header(&mut self, lead: u8) -> Result<()> {
        match lead {
            tags::BLOCK_SMALL => {
                self.remaining = i64::from(self.source.read_u8()?);
                Ok(())
            }
            tags::BLOCK_MEDIUM => {
                self.remaining = i64::from(self.source.read_u16()?);
                Ok(())
            }
            tags::BLOCK_LARGE => {
                let len = self.source.read_u32()?;
                if (len as i32) < 0 {
                    return Err(BlockwireError::Corrupted(format!(
                        "negative block length {}",
                        len as i32
                    )));
                }
                if len > self.max_block_len {
                    return Err(BlockwireError::Corrupted(format!(
                        "block length {} exceeds maximum {}",
                        len, self.max_block_len
                    )));
                }
                self.remaining = i64::from(len);
                Ok(())
            }
            tags::END_BLOCK_DATA => {
                self.remaining = EXHAUSTED;
                Ok(())
            }
            other => Err(BlockwireError::Corrupted(format!(
                "unexpected lead byte 0x{other:02X}"
            ))),
        }
    }

    /// Open the next block if positioned at a boundary.
    ///
    /// Returns `false` when the underlying stream ends where a header would
    /// start; the framing state is left at the boundary.
    fn open_block(&mut self) -> Result<bool> {
        while self.remaining == 0 {
            match self.source.read()? {
                Some(lead) => self.read_block_header(lead)?,
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Single required byte, reopening blocks as needed.
    ///
    /// This is the fallback path multi-byte primitives compose from when they
    /// straddle a block boundary.
    fn read_req_u8(&mut self) -> Result<u8> {
        while self.remaining == 0 {
            let lead = self.source.read_u8()?;
            self.read_block_header(lead)?;
        }
        if self.remaining == EXHAUSTED {
            return Err(BlockwireError::UnexpectedEof);
        }
        self.remaining -= 1;
        self.source.read_u8()
    }

    fn read_object_with(&mut self, unshared: bool) -> Result<ObjectRead<S::Value>> {
        loop {
            if self.remaining > 0 {
                return Ok(ObjectRead::OptionalData {
                    remaining: self.remaining as u64,
                });
            }
            if self.remaining == EXHAUSTED {
                return Ok(ObjectRead::End);
            }
            match self.source.read()? {
                None | Some(tags::END_BLOCK_DATA) => {
                    self.remaining = EXHAUSTED;
                    return Ok(ObjectRead::End);
                }
                // A zero-length block leaves the state at the boundary; a
                // nonempty one surfaces as optional data on the next pass.
                Some(lead @ (tags::BLOCK_SMALL | tags::BLOCK_MEDIUM | tags::BLOCK_LARGE)) => {
                    self.read_block_header(lead)?;
                }
                Some(lead) => {
                    return self
                        .source
                        .read_object(lead, unshared, false)
                        .map(ObjectRead::Value);
                }
            }
        }
    }

    /// Consume everything up to the end of the block-data region.
    ///
    /// Skips all currently-remaining raw bytes, opens and drains any further
    /// blocks, and decodes and discards any inline objects encountered in
    /// block territory, until a terminator or end of stream leaves the state
    /// exhausted. Used to fully consume a segment whose custom reader did not
    /// consume everything itself.
    pub fn read_to_end_of_block_data(&mut self) -> Result<()> {
        loop {
            while self.remaining > 0 {
                let unread = self.remaining as u64;
                match self.skip(unread)? {
                    Some(0) | None => return Err(BlockwireError::UnexpectedEof),
                    Some(_) => {}
                }
            }
            if self.remaining == EXHAUSTED {
                return Ok(());
            }
            match self.source.read()? {
                None | Some(tags::END_BLOCK_DATA) => {
                    self.remaining = EXHAUSTED;
                    return Ok(());
                }
                Some(lead @ (tags::BLOCK_SMALL | tags::BLOCK_MEDIUM | tags::BLOCK_LARGE)) => {
                    self.read_block_header(lead)?;
                }
                Some(lead) => {
                    // Inline object in block territory: decode and discard.
                    self.source.read_object(lead, false, true)?;
                }
            }
        }
    }

    /// Save the framing state and mark it exhausted.
    ///
    /// Used when an enclosing decode must temporarily behave as if no block
    /// context exists; pair with [`resume`](BlockDecoder::resume).
    pub fn suspend(&mut self) -> SavedFraming {
        let saved = SavedFraming(self.remaining);
        self.remaining = EXHAUSTED;
        saved
    }

    /// Restore a previously suspended framing state verbatim.
    pub fn resume(&mut self, saved: SavedFraming) {
        self.remaining = saved.0;
    }

    /// If exhausted, reset to the boundary state so further block headers may
    /// be read.
    pub fn force_reopen(&mut self) {
        if self.remaining == EXHAUSTED {
            self.remaining = 0;
        }
    }

    /// Close the current segment.
    ///
    /// # Errors
    ///
    /// [`BlockwireError::IllegalState`] unless the state is exactly at a
    /// boundary with no block open.
    pub fn close_segment(&mut self) -> Result<()> {
        if self.remaining == 0 {
            self.remaining = EXHAUSTED;
            Ok(())
        } else {
            Err(BlockwireError::IllegalState("not at end of block data"))
        }
    }
}

impl<S: ObjectSource> WireReader for BlockDecoder<S> {
    type Value = S::Value;

    fn read(&mut self) -> Result<Option<u8>> {
        if !self.open_block()? {
            return Ok(None);
        }
        if self.remaining == EXHAUSTED {
            return Ok(None);
        }
        self.remaining -= 1;
        self.source.read()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        if !self.open_block()? {
            return Ok(None);
        }
        if self.remaining == EXHAUSTED {
            return Ok(None);
        }
        let want = buf.len().min(self.remaining as usize);
        match self.source.read_into(&mut buf[..want])? {
            Some(count) => {
                self.remaining -= count as i64;
                Ok(Some(count))
            }
            None => Ok(None),
        }
    }

    fn skip(&mut self, n: u64) -> Result<Option<u64>> {
        if !self.open_block()? {
            return Ok(None);
        }
        if self.remaining == EXHAUSTED {
            return Ok(None);
        }
        let want = n.min(self.remaining as u64);
        let skipped = self.source.skip(want)?;
        self.remaining -= skipped as i64;
        Ok(Some(skipped))
    }

    fn available(&mut self) -> Result<usize> {
        if !self.open_block()? {
            return Ok(0);
        }
        if self.remaining == EXHAUSTED {
            return Ok(0);
        }
        Ok((self.remaining as usize).min(self.source.available()))
    }

    fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_into(&mut buf[filled..])? {
                Some(0) | None => return Err(BlockwireError::UnexpectedEof),
                Some(count) => filled += count,
            }
        }
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_req_u8()? != 0)
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.read_req_u8()
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_req_u8()? as i8)
    }

    fn read_u16(&mut self) -> Result<u16> {
        if self.remaining >= 2 {
            self.remaining -= 2;
            self.source.read_u16()
        } else {
            Ok(u16::from(self.read_req_u8()?) << 8 | u16::from(self.read_req_u8()?))
        }
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    fn read_char(&mut self) -> Result<char> {
        let unit = self.read_u16()?;
        char::from_u32(u32::from(unit)).ok_or_else(|| {
            BlockwireError::Corrupted(format!("unpaired surrogate code unit 0x{unit:04X}"))
        })
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.remaining >= 4 {
            self.remaining -= 4;
            self.source.read_u32()
        } else {
            Ok(u32::from(self.read_req_u8()?) << 24
                | u32::from(self.read_req_u8()?) << 16
                | u32::from(self.read_req_u8()?) << 8
                | u32::from(self.read_req_u8()?))
        }
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    fn read_u64(&mut self) -> Result<u64> {
        if self.remaining >= 8 {
            self.remaining -= 8;
            self.source.read_u64()
        } else {
            Ok(u64::from(self.read_u32()?) << 32 | u64::from(self.read_u32()?))
        }
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(BlockwireError::Corrupted(format!(
                "invalid string length {len}"
            )));
        }
        let mut buf = vec![0u8; len as usize];
        self.read_fully(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| BlockwireError::Corrupted(format!("invalid UTF-8 in string: {e}")))
    }

    fn read_object(&mut self) -> Result<ObjectRead<Self::Value>> {
        self.read_object_with(false)
    }

    fn read_object_unshared(&mut self) -> Result<ObjectRead<Self::Value>> {
        self.read_object_with(true)
    }

    fn clear_instance_cache(&mut self) -> Result<()> {
        Err(BlockwireError::IllegalState(
            "clear_instance_cache may not be called on a nested block view",
        ))
    }

    fn clear_class_cache(&mut self) -> Result<()> {
        Err(BlockwireError::IllegalState(
            "clear_class_cache may not be called on a nested block view",
        ))
    }

    fn restart(&mut self) -> Result<()> {
        Err(BlockwireError::IllegalState(
            "restart may not be called on a nested block view",
        ))
    }

    fn finish(&mut self) -> Result<()> {
        Err(BlockwireError::IllegalState(
            "finish may not be called on a nested block view",
        ))
    }

    fn close(&mut self) -> Result<()> {
        Err(BlockwireError::IllegalState(
            "close may not be called on a nested block view",
        ))
    }
}
