//! Raw deflate decompression

use crate::error::{Cause, Error, Result};
use flate2::read::DeflateDecoder;
use std::io::Read;

/// Upper bound of the deflate expansion ratio
const MAX_EXPANSION: u64 = 1032;

/// Inflates a raw deflate stream whose decompressed size is known
///
/// The recorded size is not trusted for allocation: the buffer is sized by
/// what `data` can expand to, and inflation stops one byte past the
/// recorded size.
pub fn decompress(data: &[u8], expected_size: u64) -> Result<Vec<u8>> {
    let bound = (data.len() as u64).saturating_mul(MAX_EXPANSION);
    let capacity = usize::try_from(expected_size.min(bound))
        .map_err(|_| Error::new(Cause::Unsupported(format!("entry of {} bytes", expected_size))))?;

    let mut decoder = DeflateDecoder::new(data).take(expected_size.saturating_add(1));
    let mut decompressed = Vec::with_capacity(capacity);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::new(Cause::InvalidFormat(format!("deflate stream: {}", e))))?;

    if decompressed.len() as u64 != expected_size {
        return Err(Error::new(Cause::InvalidFormat(format!(
            "inflated {} bytes, directory records {}",
            decompressed.len(),
            expected_size
        ))));
    }

    Ok(decompressed)
}
