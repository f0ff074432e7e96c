//! Gzip detection and decompression for sitemap bodies

use crate::FetchError;
use flate2::read::GzDecoder;
use std::io::Read;

/// Gzip magic bytes followed by the deflate compression method
const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

/// Returns true if the buffer starts with the gzip magic sequence
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= GZIP_MAGIC.len() && bytes[..GZIP_MAGIC.len()] == GZIP_MAGIC
}

/// Decompresses a gzip buffer
pub fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decompression(e.to_string()))?;
    Ok(out)
}
