//! I/O utilities for seekcheck
//!
//! Provides the resource contract, byte-window resources and the chunked
//! read loops the scenarios are built on.

pub mod traits;
pub mod window;
pub mod buffer;

#[cfg(test)]
pub(crate) mod fault;

pub use traits::Resource;
pub use window::{MappedResource, MemoryResource, SharedMmap, WindowResource};
pub use buffer::{ChunkedReader, OffsetRead, ReadCount};
