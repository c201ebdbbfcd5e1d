//! ZIP container access
//!
//! The archive is memory-mapped once. Stored entries are served in place as
//! a window over the mapping; deflated entries are inflated into memory when
//! opened.

use std::fs::File;
use std::path::{Path, PathBuf};
use memmap2::Mmap;
use tracing::debug;
use zip::ZipArchive;
use crate::compression::Compression;
use crate::error::{Cause, Error, Result, ResultExt};
use crate::io::{MappedResource, MemoryResource, Resource, SharedMmap};
use crate::types::Whence;

/// Entry resolved when none is named explicitly
pub const DEFAULT_ENTRY_NAME: &str = "mimetype";

/// Directory information about an opened entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub compression: Compression,
}

/// Open ZIP archive
pub struct ZipContainer {
    path: PathBuf,
    archive: ZipArchive<File>,
    mmap: SharedMmap,
}

impl ZipContainer {
    /// Opens and maps the archive at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let describe = || Cause::IoOpen(format!("container {}", path.display()));

        let file = File::open(path).context(describe)?;
        let mmap = unsafe { Mmap::map(&file) }.context(describe)?;

        #[cfg(unix)]
        unsafe {
            if !mmap.is_empty() {
                libc::madvise(
                    mmap.as_ptr() as *mut libc::c_void,
                    mmap.len(),
                    libc::MADV_RANDOM,
                );
            }
        }

        let archive = ZipArchive::new(file).context(describe)?;
        debug!(path = %path.display(), entries = archive.len(), "opened container");

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            mmap: SharedMmap::new(mmap),
        })
    }

    /// Returns the path the container was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the names of all entries in directory order
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Resolves a named entry and opens it as a resource
    pub fn open_entry(&mut self, name: &str) -> Result<(EntryInfo, EntryResource)> {
        let (info, data_start) = {
            let entry = self
                .archive
                .by_name(name)
                .context(|| Cause::IoOpen(format!("entry {}", name)))?;

            if entry.is_dir() {
                return Err(Error::new(Cause::Argument(format!("entry {} is a directory", name))));
            }

            let info = EntryInfo {
                name: entry.name().to_string(),
                size: entry.size(),
                compressed_size: entry.compressed_size(),
                compression: Compression::from_method(entry.compression())
                    .context(|| Cause::IoOpen(format!("entry {}", name)))?,
            };
            (info, entry.data_start())
        };

        let raw = self.raw_range(data_start, info.compressed_size)?;
        debug!(
            entry = %info.name,
            size = info.size,
            compression = info.compression.name(),
            "resolved entry"
        );

        let resource = if info.compression.is_stored() {
            if info.compressed_size != info.size {
                return Err(Error::new(Cause::InvalidFormat(format!(
                    "stored entry {} records {} bytes compressed, {} uncompressed",
                    name, info.compressed_size, info.size
                ))));
            }
            EntryResource::Mapped(MappedResource::with_window(
                self.mmap.clone(),
                raw.start,
                raw.len(),
            )?)
        } else {
            let data = info
                .compression
                .decompress(&self.mmap.as_ref()[raw], info.size)
                .context(|| Cause::IoOpen(format!("entry {}", name)))?;
            EntryResource::Inflated(MemoryResource::new(data))
        };

        Ok((info, resource))
    }

    /// Bounds-checks an entry's data range against the mapping
    fn raw_range(&self, start: u64, len: u64) -> Result<std::ops::Range<usize>> {
        let end = start.checked_add(len).filter(|&end| end <= self.mmap.len() as u64);

        match end {
            Some(end) => Ok(start as usize..end as usize),
            None => Err(Error::new(Cause::InvalidFormat(format!(
                "entry data {}+{} exceeds container size {}",
                start,
                len,
                self.mmap.len()
            )))),
        }
    }

    /// Releases the archive and this container's reference to the mapping
    ///
    /// Releasing cannot fail. Entry resources opened earlier stay usable;
    /// they hold their own reference to the mapping.
    pub fn close(self) {
        debug!(path = %self.path.display(), "closing container");
        drop(self.archive);
        drop(self.mmap);
    }
}

/// Entry of a container served through the [`Resource`] contract
pub enum EntryResource {
    /// Stored entry read in place from the mapping
    Mapped(MappedResource),
    /// Compressed entry inflated into memory
    Inflated(MemoryResource),
}

impl EntryResource {
    fn inner(&self) -> &dyn Resource {
        match self {
            EntryResource::Mapped(resource) => resource,
            EntryResource::Inflated(resource) => resource,
        }
    }
}

impl Resource for EntryResource {
    fn size(&self) -> u64 {
        self.inner().size()
    }

    fn seek(&self, offset: i64, whence: Whence) -> Result<i64> {
        self.inner().seek(offset, whence)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.inner().read(buf)
    }

    fn read_at(&self, buf: &mut [u8], offset: i64) -> Result<usize> {
        self.inner().read_at(buf, offset)
    }

    fn current_offset(&self) -> Result<i64> {
        self.inner().current_offset()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::fixture::{pattern, write_zip};
    use tempfile::tempdir;
    use zip::CompressionMethod;

    #[test]
    fn test_open_stored_entry() {
        let dir = tempdir().unwrap();
        let path = write_zip(
            dir.path(),
            "stored.zip",
            &[("mimetype", b"application/epub+zip".to_vec(), CompressionMethod::Stored)],
        );

        let mut container = ZipContainer::open(&path).unwrap();
        assert_eq!(container.path(), path.as_path());

        let (info, resource) = container.open_entry(DEFAULT_ENTRY_NAME).unwrap();
        assert_eq!(info.size, 20);
        assert_eq!(info.compression, Compression::None);
        assert!(matches!(resource, EntryResource::Mapped(_)));

        let mut buf = [0u8; 64];
        assert_eq!(resource.read(&mut buf).unwrap(), 20);
        assert_eq!(&buf[..20], b"application/epub+zip");

        container.close();
        assert_eq!(resource.read_at(&mut buf, 12).unwrap(), 8);
    }

    #[test]
    fn test_open_deflated_entry() {
        let dir = tempdir().unwrap();
        let data = pattern(50_000);
        let path = write_zip(
            dir.path(),
            "deflated.zip",
            &[("payload.bin", data.clone(), CompressionMethod::Deflated)],
        );

        let mut container = ZipContainer::open(&path).unwrap();
        let (info, resource) = container.open_entry("payload.bin").unwrap();
        assert_eq!(info.compression, Compression::Deflate);
        assert_eq!(resource.size(), 50_000);
        assert!(matches!(resource, EntryResource::Inflated(_)));

        let mut buf = vec![0u8; 100];
        resource.seek(1000, Whence::Start).unwrap();
        resource.read(&mut buf).unwrap();
        assert_eq!(buf, &data[1000..1100]);
    }

    #[test]
    fn test_stored_entry_after_others() {
        let dir = tempdir().unwrap();
        let data = pattern(9000);
        let path = write_zip(
            dir.path(),
            "mixed.zip",
            &[
                ("first.txt", b"hello".to_vec(), CompressionMethod::Deflated),
                ("second.bin", data.clone(), CompressionMethod::Stored),
            ],
        );

        let mut container = ZipContainer::open(&path).unwrap();
        let names = container.entry_names();
        assert!(names.contains(&"first.txt".to_string()));
        assert!(names.contains(&"second.bin".to_string()));

        let (_, resource) = container.open_entry("second.bin").unwrap();
        let mut buf = vec![0u8; 9000];
        assert_eq!(resource.read(&mut buf).unwrap(), 9000);
        assert_eq!(buf, data);
    }

    #[test]
    fn test_missing_entry() {
        let dir = tempdir().unwrap();
        let path = write_zip(
            dir.path(),
            "missing.zip",
            &[("other", b"x".to_vec(), CompressionMethod::Stored)],
        );

        let mut container = ZipContainer::open(&path).unwrap();
        let err = container.open_entry("mimetype").err().unwrap();
        assert!(matches!(err.kind(), Cause::IoOpen(_)));
    }

    #[test]
    fn test_directory_entry_rejected() {
        let dir = tempdir().unwrap();
        let path = write_zip(dir.path(), "dirs.zip", &[]);

        let mut container = ZipContainer::open(&path).unwrap();
        let err = container.open_entry("nested/").err().unwrap();
        assert!(matches!(err.kind(), Cause::Argument(_)));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, b"definitely not an archive").unwrap();

        let err = ZipContainer::open(&path).err().unwrap();
        assert!(matches!(err.kind(), Cause::IoOpen(_)));
        assert!(matches!(err.root(), Cause::InvalidFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = ZipContainer::open(dir.path().join("absent.zip")).err().unwrap();
        assert!(matches!(err.kind(), Cause::IoOpen(_)));
    }
}
