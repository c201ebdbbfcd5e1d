//! Core I/O traits

use std::sync::Arc;
use crate::error::Result;
use crate::types::Whence;

/// Contract of a fixed-length, seekable resource with a shared cursor
///
/// Every method takes `&self`: a handle may be shared between threads, and
/// implementations are responsible for keeping their own cursor consistent.
/// Each call is expected to be atomic on its own; a `seek` followed by a
/// `read` is not.
pub trait Resource: Send + Sync {
    /// Returns the total length in bytes, fixed at open time
    fn size(&self) -> u64;

    /// Moves the cursor and returns the new offset
    ///
    /// Fails when the resulting offset would be negative. Seeking past the
    /// end is allowed.
    fn seek(&self, offset: i64, whence: Whence) -> Result<i64>;

    /// Reads up to `buf.len()` bytes at the cursor and advances it
    fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Reads up to `buf.len()` bytes at `offset`
    ///
    /// Leaves the cursor at `offset` plus the number of bytes read, exactly
    /// as a seek followed by a read would.
    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize>;

    /// Returns the current cursor
    fn current_offset(&self) -> Result<i64>;
}

impl<T: Resource + ?Sized> Resource for &T {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn seek(&self, offset: i64, whence: Whence) -> Result<i64> {
        (**self).seek(offset, whence)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    fn current_offset(&self) -> Result<i64> {
        (**self).current_offset()
    }
}

impl<T: Resource + ?Sized> Resource for Arc<T> {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn seek(&self, offset: i64, whence: Whence) -> Result<i64> {
        (**self).seek(offset, whence)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    fn current_offset(&self) -> Result<i64> {
        (**self).current_offset()
    }
}

impl<T: Resource + ?Sized> Resource for Box<T> {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn seek(&self, offset: i64, whence: Whence) -> Result<i64> {
        (**self).seek(offset, whence)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    fn current_offset(&self) -> Result<i64> {
        (**self).current_offset()
    }
}
