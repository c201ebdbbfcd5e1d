//! Chunked reading loops
//!
//! Both loops read a requested total in bounded chunks and stop early on a
//! short or failed read. They never fail on a short count: callers compare
//! the returned totals against their own expectations.

use tracing::trace;
use crate::error::{Cause, Error, Result, ResultExt};
use crate::io::Resource;
use crate::types::DEFAULT_CHUNK_SIZE;

/// Bytes accumulated by a cursor-relative read loop
#[derive(Debug)]
pub struct ReadCount {
    /// Total bytes delivered
    pub bytes: u64,
    /// Read failure that stopped the loop, if any
    pub error: Option<Error>,
}

/// Bytes accumulated by an offset-addressed read loop
#[derive(Debug)]
pub struct OffsetRead {
    /// Total bytes delivered
    pub bytes: u64,
    /// Offset tracked by the loop itself
    pub local_offset: i64,
    /// Cursor reported by the resource after the loop
    pub cursor: i64,
    /// Read failure that stopped the loop, if any
    pub error: Option<Error>,
}

impl OffsetRead {
    /// Whether the resource cursor followed the offset reads
    pub fn cursor_consistent(&self) -> bool {
        self.cursor == self.local_offset
    }
}

/// Reads fixed-size chunks from a [`Resource`] into a scratch buffer
pub struct ChunkedReader {
    buffer: Vec<u8>,
}

impl ChunkedReader {
    /// Creates a reader with the default chunk size (4KB)
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates a reader with the specified chunk size
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            buffer: vec![0; chunk_size.max(1)],
        }
    }

    /// Returns the chunk size
    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    /// Size of the next chunk request when `remaining` bytes are still wanted
    fn next_request(&self, remaining: u64) -> usize {
        if remaining < self.buffer.len() as u64 {
            remaining as usize
        } else {
            self.buffer.len()
        }
    }

    /// Reads `size` bytes at the cursor, chunk by chunk
    pub fn read_buffer<R: Resource + ?Sized>(&mut self, resource: &R, size: u64) -> ReadCount {
        let mut remaining = size;
        let mut bytes = 0u64;
        let mut error = None;

        while remaining > 0 {
            let request = self.next_request(remaining);

            let count = match resource.read(&mut self.buffer[..request]) {
                Ok(count) => count,
                Err(e) => {
                    error = Some(e.context(Cause::IoRead(format!(
                        "chunk of {} bytes after {} bytes",
                        request, bytes
                    ))));
                    break;
                }
            };
            trace!(request, count, "read chunk");

            remaining -= count as u64;
            bytes += count as u64;

            if count != request {
                break;
            }
        }

        ReadCount { bytes, error }
    }

    /// Reads `size` bytes starting at `offset` with offset-addressed reads
    ///
    /// The loop tracks its own offset and only consults the resource cursor
    /// once all reads are done. Failing to query the cursor is an error.
    pub fn read_buffer_at_offset<R: Resource + ?Sized>(
        &mut self,
        resource: &R,
        offset: i64,
        size: u64,
    ) -> Result<OffsetRead> {
        let mut local_offset = offset;
        let mut remaining = size;
        let mut bytes = 0u64;
        let mut error = None;

        while remaining > 0 {
            let request = self.next_request(remaining);

            let count = match resource.read_at(&mut self.buffer[..request], local_offset) {
                Ok(count) => count,
                Err(e) => {
                    error = Some(e.context(Cause::IoRead(format!(
                        "chunk of {} bytes at offset {}",
                        request, local_offset
                    ))));
                    break;
                }
            };
            trace!(request, count, offset = local_offset, "read chunk at offset");

            local_offset = local_offset.saturating_add(count as i64);
            remaining -= count as u64;
            bytes += count as u64;

            if count != request {
                break;
            }
        }

        let cursor = resource
            .current_offset()
            .context(|| Cause::Get("current offset after offset reads".to_string()))?;

        Ok(OffsetRead {
            bytes,
            local_offset,
            cursor,
            error,
        })
    }
}

impl Default for ChunkedReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fault::FaultyResource;
    use crate::io::MemoryResource;
    use crate::types::Whence;

    fn sample(len: usize) -> MemoryResource {
        MemoryResource::new((0..len).map(|i| (i % 251) as u8).collect())
    }

    #[test]
    fn test_default_chunk_size() {
        assert_eq!(ChunkedReader::new().chunk_size(), 4096);
        assert_eq!(ChunkedReader::with_chunk_size(0).chunk_size(), 1);
    }

    #[test]
    fn test_zero_size_makes_no_read() {
        let resource = FaultyResource::new(100);
        let mut reader = ChunkedReader::new();

        let count = reader.read_buffer(&resource, 0);
        assert_eq!(count.bytes, 0);
        assert!(count.error.is_none());
        assert_eq!(resource.reads(), 0);
    }

    #[test]
    fn test_read_whole_resource() {
        let resource = sample(10_000);
        let mut reader = ChunkedReader::new();

        let count = reader.read_buffer(&resource, 10_000);
        assert_eq!(count.bytes, 10_000);
        assert_eq!(resource.current_offset().unwrap(), 10_000);
    }

    #[test]
    fn test_read_clipped_at_end() {
        let resource = sample(5000);
        resource.seek(3976, Whence::Start).unwrap();
        let mut reader = ChunkedReader::new();

        let count = reader.read_buffer(&resource, 4096);
        assert_eq!(count.bytes, 1024);
        assert!(count.error.is_none());
        assert_eq!(resource.current_offset().unwrap(), 5000);
    }

    #[test]
    fn test_short_read_stops_loop() {
        let mut resource = FaultyResource::new(20_000);
        resource.short_reads_after = Some(1);
        let mut reader = ChunkedReader::new();

        let count = reader.read_buffer(&resource, 12_288);
        assert_eq!(count.bytes, 4096 + 4095);
        assert_eq!(resource.reads(), 2);
    }

    #[test]
    fn test_failed_read_keeps_partial_count() {
        let mut resource = FaultyResource::new(20_000);
        resource.fail_reads_after = Some(2);
        let mut reader = ChunkedReader::new();

        let count = reader.read_buffer(&resource, 16_384);
        assert_eq!(count.bytes, 8192);

        let error = count.error.unwrap();
        assert!(matches!(error.root(), Cause::IoRead(_)));
        assert_eq!(error.causes().len(), 2);
    }

    #[test]
    fn test_read_at_offset_tracks_cursor() {
        let resource = sample(5000);
        let mut reader = ChunkedReader::new();

        let read = reader.read_buffer_at_offset(&resource, 714, 2500).unwrap();
        assert_eq!(read.bytes, 2500);
        assert_eq!(read.local_offset, 3214);
        assert_eq!(read.cursor, 3214);
        assert!(read.cursor_consistent());
    }

    #[test]
    fn test_read_at_offset_spanning_chunks() {
        let resource = sample(20_000);
        let mut reader = ChunkedReader::with_chunk_size(1000);

        let read = reader.read_buffer_at_offset(&resource, 10, 19_990).unwrap();
        assert_eq!(read.bytes, 19_990);
        assert_eq!(read.cursor, 20_000);
    }

    #[test]
    fn test_read_at_offset_detects_stale_cursor() {
        let mut resource = FaultyResource::new(5000);
        resource.read_at_keeps_cursor = true;
        let mut reader = ChunkedReader::new();

        let read = reader.read_buffer_at_offset(&resource, 714, 2500).unwrap();
        assert_eq!(read.bytes, 2500);
        assert_eq!(read.cursor, 0);
        assert!(!read.cursor_consistent());
    }

    #[test]
    fn test_read_at_offset_cursor_query_failure() {
        let mut resource = FaultyResource::new(5000);
        resource.fail_offset_query = true;
        let mut reader = ChunkedReader::new();

        let err = reader.read_buffer_at_offset(&resource, 0, 100).unwrap_err();
        assert!(matches!(err.kind(), Cause::Get(_)));
    }

    #[test]
    fn test_read_at_offset_failure_is_recorded() {
        let mut resource = FaultyResource::new(5000);
        resource.fail_reads_after = Some(0);
        let mut reader = ChunkedReader::new();

        let read = reader.read_buffer_at_offset(&resource, 0, 100).unwrap();
        assert_eq!(read.bytes, 0);
        assert!(read.error.is_some());
    }
}
