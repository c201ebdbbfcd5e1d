//! Entry compression methods

pub mod deflate;

use zip::CompressionMethod;
use crate::error::{Cause, Error, Result};

/// Compression methods an entry can be served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Stored as-is, readable in place
    None,
    /// Raw deflate stream
    Deflate,
}

impl Compression {
    /// Maps an archive compression method
    pub fn from_method(method: CompressionMethod) -> Result<Self> {
        match method {
            CompressionMethod::Stored => Ok(Compression::None),
            CompressionMethod::Deflated => Ok(Compression::Deflate),
            other => Err(Error::new(Cause::Unsupported(format!("compression method {:?}", other)))),
        }
    }

    /// Returns the name of this compression method
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Deflate => "Deflate",
        }
    }

    /// Whether the entry bytes can be used without decompression
    pub fn is_stored(&self) -> bool {
        matches!(self, Compression::None)
    }

    /// Decompresses entry data to `size` bytes
    pub fn decompress(&self, data: &[u8], size: u64) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Deflate => deflate::decompress(data, size),
        }
    }
}
