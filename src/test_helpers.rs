//! Shared test fixtures: minimal valid image headers and helpers for
//! laying out files under a temp directory.
//!
//! The builders emit just enough of each container for the header sniffer —
//! signatures, the chunks carrying dimensions, and nothing after them. No
//! encoder is involved, so fixture dimensions are exact and arbitrary.

use std::path::Path;

/// PNG signature plus an IHDR chunk carrying the given dimensions.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(33);
    bytes.extend_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    bytes.extend_from_slice(&13u32.to_be_bytes()); // IHDR payload length
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    // bit depth, color type, compression, filter, interlace
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

/// SOI, an APP0/JFIF segment, then an SOF0 frame header.
///
/// The APP0 segment before the SOF exercises the marker walk.
pub(crate) fn jpeg_bytes(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(40);
    bytes.extend_from_slice(&[0xFF, 0xD8]); // SOI
    bytes.extend_from_slice(&[0xFF, 0xE0]); // APP0
    bytes.extend_from_slice(&16u16.to_be_bytes());
    bytes.extend_from_slice(b"JFIF\0");
    bytes.extend_from_slice(&[0; 9]);
    bytes.extend_from_slice(&[0xFF, 0xC0]); // SOF0
    bytes.extend_from_slice(&17u16.to_be_bytes());
    bytes.push(8); // sample precision
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.push(3); // component count
    bytes.extend_from_slice(&[0; 9]);
    bytes
}

/// RIFF container with a lossy `VP8 ` frame header.
pub(crate) fn webp_lossy_bytes(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(30);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&22u32.to_le_bytes());
    bytes.extend_from_slice(b"WEBP");
    bytes.extend_from_slice(b"VP8 ");
    bytes.extend_from_slice(&10u32.to_le_bytes()); // chunk size
    bytes.extend_from_slice(&[0, 0, 0]); // frame tag
    bytes.extend_from_slice(&[0x9D, 0x01, 0x2A]); // sync code
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes
}

/// RIFF container with a lossless `VP8L` header; dimensions are packed
/// minus-one into 14-bit fields of one little-endian word.
pub(crate) fn webp_lossless_bytes(width: u32, height: u32) -> Vec<u8> {
    let packed = (width - 1) & 0x3FFF | ((height - 1) & 0x3FFF) << 14;
    let mut bytes = Vec::with_capacity(25);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&17u32.to_le_bytes());
    bytes.extend_from_slice(b"WEBP");
    bytes.extend_from_slice(b"VP8L");
    bytes.extend_from_slice(&5u32.to_le_bytes()); // chunk size
    bytes.push(0x2F); // VP8L signature byte
    bytes.extend_from_slice(&packed.to_le_bytes());
    bytes
}

/// Write a fixture image into `dir` under `name`.
pub(crate) fn write_image(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::write(dir.join(name), bytes).unwrap();
}
