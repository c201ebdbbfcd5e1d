//! Fault-injecting resource for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use crate::error::{Cause, Error, Result};
use crate::io::{MemoryResource, Resource};
use crate::types::Whence;

/// Wraps a [`MemoryResource`] and misbehaves on request
pub struct FaultyResource {
    inner: MemoryResource,
    /// Read calls (cursor or offset) succeed this many times, then fail
    pub fail_reads_after: Option<usize>,
    /// Read calls succeed this many times, then return one byte less
    pub short_reads_after: Option<usize>,
    /// Every seek fails
    pub fail_seeks: bool,
    /// Cursor queries fail
    pub fail_offset_query: bool,
    /// Offset reads leave the cursor untouched
    pub read_at_keeps_cursor: bool,
    reads: AtomicUsize,
    seeks: AtomicUsize,
}

impl FaultyResource {
    pub fn new(len: usize) -> Self {
        Self {
            inner: MemoryResource::new(vec![0xA5; len]),
            fail_reads_after: None,
            short_reads_after: None,
            fail_seeks: false,
            fail_offset_query: false,
            read_at_keeps_cursor: false,
            reads: AtomicUsize::new(0),
            seeks: AtomicUsize::new(0),
        }
    }

    /// Number of read calls made so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of seek calls made so far
    pub fn seeks(&self) -> usize {
        self.seeks.load(Ordering::SeqCst)
    }

    /// Applies read faults; returns the buffer length to use
    fn before_read(&self, requested: usize) -> Result<usize> {
        let call = self.reads.fetch_add(1, Ordering::SeqCst);

        if self.fail_reads_after.is_some_and(|after| call >= after) {
            return Err(Error::new(Cause::IoRead(format!("injected failure on read {}", call))));
        }
        if self.short_reads_after.is_some_and(|after| call >= after) {
            return Ok(requested.saturating_sub(1));
        }
        Ok(requested)
    }
}

impl Resource for FaultyResource {
    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn seek(&self, offset: i64, whence: Whence) -> Result<i64> {
        self.seeks.fetch_add(1, Ordering::SeqCst);
        if self.fail_seeks {
            return Err(Error::new(Cause::IoSeek("injected seek failure".to_string())));
        }
        self.inner.seek(offset, whence)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.before_read(buf.len())?;
        self.inner.read(&mut buf[..len])
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        let len = self.before_read(buf.len())?;
        if self.read_at_keeps_cursor {
            let saved = self.inner.current_offset()?;
            let count = self.inner.read_at(&mut buf[..len], offset)?;
            self.inner.seek(saved, Whence::Start)?;
            return Ok(count);
        }
        self.inner.read_at(&mut buf[..len], offset)
    }

    fn current_offset(&self) -> Result<i64> {
        if self.fail_offset_query {
            return Err(Error::new(Cause::Get("injected offset query failure".to_string())));
        }
        self.inner.current_offset()
    }
}
