//! Container formats that expose named, seekable entries

pub mod archive;

pub use archive::{EntryInfo, EntryResource, ZipContainer, DEFAULT_ENTRY_NAME};
