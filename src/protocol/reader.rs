//! The stream-reader interface exposed to custom deserialization logic.
//!
//! [`WireReader`] is the full capability set a block-aware decoder offers:
//! byte-stream style primitive reads, object reads, and the stream-lifecycle
//! operations that are rejected in a nested context. There is exactly one
//! implementation ([`BlockDecoder`](crate::protocol::BlockDecoder)); the trait
//! exists so deserialization logic depends on the capability set rather than
//! the framing machinery.
//!
//! Boundary conditions on object reads are data, not exceptions: callers
//! branch on [`ObjectRead`] tags.

use crate::error::{BlockwireError, Result};
use crate::source::ObjectValue;

/// Outcome of an object read against the framing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRead<V> {
    /// A fully decoded value.
    Value(V),
    /// Raw block bytes remain in the current block; exactly `remaining` bytes
    /// must be drained or skipped before an object can be read.
    OptionalData {
        /// Unread raw bytes in the current block.
        remaining: u64,
    },
    /// The block-data region is exhausted; nothing further follows here.
    End,
}

impl<V> ObjectRead<V> {
    /// The decoded value, or `None` for either soft boundary signal.
    pub fn into_value(self) -> Option<V> {
        match self {
            ObjectRead::Value(v) => Some(v),
            ObjectRead::OptionalData { .. } | ObjectRead::End => None,
        }
    }
}

/// Byte-stream and object-read capabilities of a block-aware decoder.
///
/// Byte-oriented reads use a `None` sentinel once the block-data region is
/// exhausted; fixed-width reads error with
/// [`BlockwireError::UnexpectedEof`] instead, since they cannot return a
/// partial value. All multi-byte integers are big endian, and a fixed-width
/// value may legally straddle a block boundary.
pub trait WireReader {
    /// Fully decoded object values produced by object reads.
    type Value: ObjectValue;

    /// Read one raw byte from the current block, opening the next block first
    /// if positioned at a boundary.
    fn read(&mut self) -> Result<Option<u8>>;

    /// Read up to `buf.len()` raw bytes from the current block.
    ///
    /// Serves at most the current block's remainder; a short count means the
    /// next call continues into the next block.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Skip up to `n` raw bytes within the current block.
    fn skip(&mut self, n: u64) -> Result<Option<u64>>;

    /// Raw bytes readable without blocking, bounded by the current block.
    fn available(&mut self) -> Result<usize>;

    /// Fill `buf` completely, spanning blocks as needed.
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Read a boolean (any nonzero byte is `true`).
    fn read_bool(&mut self) -> Result<bool>;

    /// Read one unsigned byte.
    fn read_u8(&mut self) -> Result<u8>;

    /// Read one signed byte.
    fn read_i8(&mut self) -> Result<i8>;

    /// Read a big-endian `u16`.
    fn read_u16(&mut self) -> Result<u16>;

    /// Read a big-endian `i16`.
    fn read_i16(&mut self) -> Result<i16>;

    /// Read a 16-bit big-endian code unit as a `char`.
    fn read_char(&mut self) -> Result<char>;

    /// Read a big-endian `u32`.
    fn read_u32(&mut self) -> Result<u32>;

    /// Read a big-endian `i32`.
    fn read_i32(&mut self) -> Result<i32>;

    /// Read a big-endian `u64`.
    fn read_u64(&mut self) -> Result<u64>;

    /// Read a big-endian `i64`.
    fn read_i64(&mut self) -> Result<i64>;

    /// Read an `f32` as the bit pattern of a `u32`.
    fn read_f32(&mut self) -> Result<f32>;

    /// Read an `f64` as the bit pattern of a `u64`.
    fn read_f64(&mut self) -> Result<f64>;

    /// Read a length-prefixed UTF-8 string (4-byte signed length).
    fn read_string(&mut self) -> Result<String>;

    /// Read one object; valid only at a block boundary.
    fn read_object(&mut self) -> Result<ObjectRead<Self::Value>>;

    /// Read one object without identity-cache registration.
    fn read_object_unshared(&mut self) -> Result<ObjectRead<Self::Value>>;

    /// Read one object and narrow it to `T`.
    ///
    /// # Errors
    ///
    /// [`BlockwireError::WrongType`] if the stream carried a value `T` cannot
    /// be built from; the narrowing failure is preserved as the source.
    fn read_object_as<T>(&mut self) -> Result<ObjectRead<T>>
    where
        T: TryFrom<Self::Value>,
        T::Error: std::error::Error + Send + Sync + 'static,
    {
        narrow(self.read_object()?)
    }

    /// Unshared variant of [`read_object_as`](WireReader::read_object_as).
    fn read_object_unshared_as<T>(&mut self) -> Result<ObjectRead<T>>
    where
        T: TryFrom<Self::Value>,
        T::Error: std::error::Error + Send + Sync + 'static,
    {
        narrow(self.read_object_unshared()?)
    }

    /// Clear the instance-identity cache. Always fails on a nested view.
    fn clear_instance_cache(&mut self) -> Result<()>;

    /// Clear the class-descriptor cache. Always fails on a nested view.
    fn clear_class_cache(&mut self) -> Result<()>;

    /// Restart decoding over a fresh stream. Always fails on a nested view.
    fn restart(&mut self) -> Result<()>;

    /// Finish the stream. Always fails on a nested view.
    fn finish(&mut self) -> Result<()>;

    /// Close the stream. Always fails on a nested view.
    fn close(&mut self) -> Result<()>;
}

fn narrow<V, T>(read: ObjectRead<V>) -> Result<ObjectRead<T>>
where
    V: ObjectValue,
    T: TryFrom<V>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    match read {
        ObjectRead::Value(value) => {
            let actual = value.type_name();
            match T::try_from(value) {
                Ok(narrowed) => Ok(ObjectRead::Value(narrowed)),
                Err(cause) => Err(BlockwireError::WrongType {
                    expected: std::any::type_name::<T>(),
                    actual,
                    source: Box::new(cause),
                }),
            }
        }
        ObjectRead::OptionalData { remaining } => Ok(ObjectRead::OptionalData { remaining }),
        ObjectRead::End => Ok(ObjectRead::End),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_value() {
        assert_eq!(ObjectRead::Value(5).into_value(), Some(5));
        assert_eq!(
            ObjectRead::<i32>::OptionalData { remaining: 2 }.into_value(),
            None
        );
        assert_eq!(ObjectRead::<i32>::End.into_value(), None);
    }
}
