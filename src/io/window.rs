//! Byte-window resources
//!
//! A [`WindowResource`] serves a contiguous range of an in-memory or
//! memory-mapped buffer through the [`Resource`] contract.

use std::sync::Arc;
use memmap2::Mmap;
use parking_lot::Mutex;
use crate::error::{Cause, Error, Result};
use crate::io::Resource;
use crate::types::Whence;

/// Resource over an owned buffer
pub type MemoryResource = WindowResource<Vec<u8>>;

/// Resource over a window of a shared memory mapping
pub type MappedResource = WindowResource<SharedMmap>;

/// Reference-counted memory mapping usable as a byte buffer
#[derive(Clone)]
pub struct SharedMmap(Arc<Mmap>);

impl SharedMmap {
    pub fn new(mmap: Mmap) -> Self {
        Self(Arc::new(mmap))
    }

    /// Returns the mapped length
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SharedMmap {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

/// Window `[start, start + len)` of a byte buffer with a locked cursor
pub struct WindowResource<B> {
    data: B,
    start: usize,
    len: usize,
    cursor: Mutex<i64>,
}

impl<B: AsRef<[u8]>> WindowResource<B> {
    /// Creates a resource spanning the whole buffer
    pub fn new(data: B) -> Self {
        let len = data.as_ref().len();
        Self {
            data,
            start: 0,
            len,
            cursor: Mutex::new(0),
        }
    }

    /// Creates a resource spanning `len` bytes starting at `start`
    pub fn with_window(data: B, start: usize, len: usize) -> Result<Self> {
        let available = data.as_ref().len();
        let end = start
            .checked_add(len)
            .filter(|&end| end <= available)
            .ok_or_else(|| {
                Error::new(Cause::InvalidFormat(format!(
                    "window {}+{} exceeds buffer size {}",
                    start, len, available
                )))
            })?;

        if end as u64 > i64::MAX as u64 {
            return Err(Error::new(Cause::Unsupported("window end exceeds maximum offset".to_string())));
        }

        Ok(Self {
            data,
            start,
            len,
            cursor: Mutex::new(0),
        })
    }

    /// Returns the bytes covered by the window
    pub fn bytes(&self) -> &[u8] {
        &self.data.as_ref()[self.start..self.start + self.len]
    }

    /// Copies from `position` into `buf`, returning the number of bytes copied
    fn copy_at(&self, position: i64, buf: &mut [u8]) -> usize {
        let position = position as u64;
        if position >= self.len as u64 {
            return 0;
        }

        let position = position as usize;
        let count = buf.len().min(self.len - position);
        buf[..count].copy_from_slice(&self.bytes()[position..position + count]);
        count
    }
}

impl<B: AsRef<[u8]> + Send + Sync> Resource for WindowResource<B> {
    fn size(&self) -> u64 {
        self.len as u64
    }

    fn seek(&self, offset: i64, whence: Whence) -> Result<i64> {
        let mut cursor = self.cursor.lock();

        let base = match whence {
            Whence::Start => 0,
            Whence::Current => *cursor,
            Whence::End => self.len as i64,
        };
        let target = base.checked_add(offset).ok_or_else(|| {
            Error::new(Cause::IoSeek(format!("offset {} from {} overflows", offset, whence)))
        })?;

        if target < 0 {
            return Err(Error::new(Cause::IoSeek(format!(
                "offset {} from {} resolves to {}, before start",
                offset, whence, target
            ))));
        }

        *cursor = target;
        Ok(target)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut cursor = self.cursor.lock();
        let count = self.copy_at(*cursor, buf);
        *cursor += count as i64;
        Ok(count)
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        if offset < 0 {
            return Err(Error::new(Cause::Argument(format!("negative read offset {}", offset))));
        }

        let mut cursor = self.cursor.lock();
        let count = self.copy_at(offset, buf);
        *cursor = offset + count as i64;
        Ok(count)
    }

    fn current_offset(&self) -> Result<i64> {
        Ok(*self.cursor.lock())
    }
}
