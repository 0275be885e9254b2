//! The seam between the block-framing layer and the Raw Stream Owner.
//!
//! [`ObjectSource`] is the interface the framing core consumes: the true byte
//! source and full object-graph decoding (class resolution, reference caching,
//! nested block handling) live behind it. The [`BlockDecoder`] delegates to it
//! but never implements it.
//!
//! [`CountingSource`] is an optional byte-counting decorator. It is installed
//! explicitly by the caller that wants the diagnostics; the decoder itself
//! never wraps its source.
//!
//! [`BlockDecoder`]: crate::protocol::BlockDecoder

use crate::error::{BlockwireError, Result};

/// A decoded object value that can name its own runtime type.
///
/// The name feeds the diagnostics of typed object reads
/// ([`BlockwireError::WrongType`]).
pub trait ObjectValue {
    /// Human-readable name of this value's runtime type.
    fn type_name(&self) -> &'static str;
}

impl ObjectValue for serde_json::Value {
    fn type_name(&self) -> &'static str {
        match self {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "map",
        }
    }
}

/// Interface the block-framing decoder consumes from the Raw Stream Owner.
///
/// Byte-oriented reads use a `None` sentinel at end of stream; the direct
/// fixed-width reads error with [`BlockwireError::UnexpectedEof`] instead.
/// All multi-byte integers are big endian.
///
/// The provided fixed-width reads compose from [`read`](ObjectSource::read);
/// concrete sources may override them with faster paths.
pub trait ObjectSource {
    /// Fully decoded object values produced by [`read_object`](ObjectSource::read_object).
    type Value: ObjectValue;

    /// Read one byte; `None` at end of the underlying stream.
    fn read(&mut self) -> Result<Option<u8>>;

    /// Read up to `buf.len()` bytes into `buf`; `None` at end of stream.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Skip up to `n` bytes, returning the count actually skipped.
    fn skip(&mut self, n: u64) -> Result<u64>;

    /// Number of bytes readable without blocking.
    fn available(&self) -> usize;

    /// Read one byte, erroring at end of stream.
    fn read_u8(&mut self) -> Result<u8> {
        self.read()?.ok_or(BlockwireError::UnexpectedEof)
    }

    /// Read a big-endian `u16` directly (not block-constrained).
    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from(self.read_u8()?) << 8 | u16::from(self.read_u8()?))
    }

    /// Read a big-endian `u32` directly (not block-constrained).
    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from(self.read_u16()?) << 16 | u32::from(self.read_u16()?))
    }

    /// Read a big-endian `u64` directly (not block-constrained).
    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from(self.read_u32()?) << 32 | u64::from(self.read_u32()?))
    }

    /// Decode one complete object whose lead byte has already been consumed.
    ///
    /// `unshared` requests a read that bypasses identity-cache registration.
    /// `discard_missing` asks the owner to swallow values whose class cannot
    /// be resolved instead of failing; flood-skip traversal sets it.
    fn read_object(&mut self, lead: u8, unshared: bool, discard_missing: bool)
        -> Result<Self::Value>;
}

impl<S: ObjectSource + ?Sized> ObjectSource for &mut S {
    type Value = S::Value;

    fn read(&mut self) -> Result<Option<u8>> {
        (**self).read()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).read_into(buf)
    }

    fn skip(&mut self, n: u64) -> Result<u64> {
        (**self).skip(n)
    }

    fn available(&self) -> usize {
        (**self).available()
    }

    fn read_u8(&mut self) -> Result<u8> {
        (**self).read_u8()
    }

    fn read_u16(&mut self) -> Result<u16> {
        (**self).read_u16()
    }

    fn read_u32(&mut self) -> Result<u32> {
        (**self).read_u32()
    }

    fn read_u64(&mut self) -> Result<u64> {
        (**self).read_u64()
    }

    fn read_object(&mut self, lead: u8, unshared: bool, discard_missing: bool)
        -> Result<Self::Value> {
        (**self).read_object(lead, unshared, discard_missing)
    }
}

/// Byte-counting decorator over an [`ObjectSource`].
///
/// Counts every byte served through the raw-read seam (single, bulk, skip and
/// direct fixed-width reads). Bytes the owner consumes internally while
/// decoding an object are not visible at this seam and are not counted.
pub struct CountingSource<S> {
    inner: S,
    bytes_read: u64,
}

impl<S> CountingSource<S> {
    /// Wrap a source, starting the count at zero.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }

    /// Total bytes served through the raw-read seam so far.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Unwrap the decorated source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ObjectSource> ObjectSource for CountingSource<S> {
    type Value = S::Value;

    fn read(&mut self) -> Result<Option<u8>> {
        let byte = self.inner.read()?;
        if byte.is_some() {
            self.bytes_read += 1;
        }
        Ok(byte)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let count = self.inner.read_into(buf)?;
        if let Some(n) = count {
            self.bytes_read += n as u64;
        }
        Ok(count)
    }

    fn skip(&mut self, n: u64) -> Result<u64> {
        let skipped = self.inner.skip(n)?;
        self.bytes_read += skipped;
        Ok(skipped)
    }

    fn available(&self) -> usize {
        self.inner.available()
    }

    fn read_u8(&mut self) -> Result<u8> {
        let v = self.inner.read_u8()?;
        self.bytes_read += 1;
        Ok(v)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let v = self.inner.read_u16()?;
        self.bytes_read += 2;
        Ok(v)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let v = self.inner.read_u32()?;
        self.bytes_read += 4;
        Ok(v)
    }

    fn read_u64(&mut self) -> Result<u64> {
        let v = self.inner.read_u64()?;
        self.bytes_read += 8;
        Ok(v)
    }

    fn read_object(&mut self, lead: u8, unshared: bool, discard_missing: bool)
        -> Result<Self::Value> {
        self.inner.read_object(lead, unshared, discard_missing)
    }
}
