//! Path signatures (BLAKE3) and content checksums (CRC-32)

use blake3::Hasher;
use crc32fast::Hasher as Crc32;

/// Compute the signature of a tracked path.
///
/// signature = hex(hash("path" || path_len || path))
///
/// Pure function of the path string: every record for the same path carries
/// the same signature, so it can namespace stored content without putting the
/// raw path into a filename.
pub fn path_signature(path: &str) -> String {
    let path_bytes = path.as_bytes();

    let mut hasher = Hasher::new();
    hasher.update(b"path");
    hasher.update(&(path_bytes.len() as u64).to_be_bytes());
    hasher.update(path_bytes);

    hex::encode(hasher.finalize().as_bytes())
}

/// CRC-32 (IEEE) of the raw version bytes.
pub fn content_checksum(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}
