//! Minimal image-header sniffer for PNG, JPEG, and WebP files.
//!
//! Reads pixel dimensions straight out of the binary container headers:
//! - PNG: big-endian width/height at fixed offsets inside the IHDR chunk.
//! - JPEG: marker scan until a start-of-frame (SOF0–SOF3) segment.
//! - WebP: RIFF container, branching on the VP8 / VP8L / VP8X chunk tag.
//!
//! Zero external dependencies — pure byte-offset arithmetic. Anything that is
//! not one of these three formats, or is truncated, yields `None`. This module
//! never panics on arbitrary input.

use std::path::{Path, PathBuf};

/// Pixel dimensions extracted from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Classify a byte buffer by magic bytes and extract its dimensions.
///
/// Returns `None` for unrecognized signatures, truncated buffers, and
/// zero-sized dimensions.
pub fn sniff(bytes: &[u8]) -> Option<ImageDimensions> {
    sniff_png(bytes)
        .or_else(|| sniff_jpeg(bytes))
        .or_else(|| sniff_webp(bytes))
}

/// Read a file and sniff its dimensions. I/O failures are treated the same
/// as an unrecognized format.
pub fn read_dimensions(path: &Path) -> Option<ImageDimensions> {
    let bytes = std::fs::read(path).ok()?;
    sniff(&bytes)
}

/// Resolve an `src` reference against the HTML file's directory, falling back
/// to the project root.
///
/// Candidates, first existing wins:
/// 1. the reference as given (absolute, or joined to `html_dir`)
/// 2. for root-relative references (`/img/a.png`), the path under
///    `project_root` with the leading slash stripped
/// 3. the bare reference joined to `project_root`
pub fn resolve_reference(src: &str, html_dir: &Path, project_root: &Path) -> Option<PathBuf> {
    let given = if Path::new(src).is_absolute() {
        PathBuf::from(src)
    } else {
        html_dir.join(src)
    };
    if given.exists() {
        return Some(given);
    }
    if let Some(stripped) = src.strip_prefix('/') {
        let rooted = project_root.join(stripped);
        if rooted.exists() {
            return Some(rooted);
        }
    }
    let bare = project_root.join(src);
    if bare.exists() { Some(bare) } else { None }
}

// ---------------------------------------------------------------------------
// PNG
// ---------------------------------------------------------------------------

const PNG_SIGNATURE: &[u8; 8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// PNG layout: 8-byte signature, then the IHDR chunk (length + "IHDR" +
/// payload). Width and height are big-endian u32 at offsets 16 and 20 — the
/// IHDR chunk is required to come first, so no chunk search is needed.
fn sniff_png(bytes: &[u8]) -> Option<ImageDimensions> {
    if bytes.len() < 24 || &bytes[..8] != PNG_SIGNATURE {
        return None;
    }
    let width = read_u32_be(bytes, 16)?;
    let height = read_u32_be(bytes, 20)?;
    nonzero(width, height)
}

// ---------------------------------------------------------------------------
// JPEG
// ---------------------------------------------------------------------------

/// Walk JPEG segments until a start-of-frame marker.
///
/// After the SOI marker, each segment is a 2-byte big-endian marker followed
/// by a 2-byte big-endian length (which includes the length field itself).
/// SOF0–SOF3 carry the frame header: height 3 bytes past the marker, width 5.
/// The marker range stays `0xFFC0..=0xFFC3` rather than the full SOF
/// namespace; JPEGs with later SOF variants degrade to "no dimensions".
fn sniff_jpeg(bytes: &[u8]) -> Option<ImageDimensions> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut offset = 2usize;
    while offset + 2 <= bytes.len() {
        let marker = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
        offset += 2;

        if (0xFFC0..=0xFFC3).contains(&marker) {
            let height = u32::from(read_u16_be(bytes, offset + 3)?);
            let width = u32::from(read_u16_be(bytes, offset + 5)?);
            return nonzero(width, height);
        }

        let length = read_u16_be(bytes, offset)? as usize;
        if length < 2 {
            // A segment can never be shorter than its own length field;
            // bail instead of looping in place on a corrupt stream.
            return None;
        }
        offset += length;
    }
    None
}

// ---------------------------------------------------------------------------
// WebP
// ---------------------------------------------------------------------------

/// WebP is a RIFF container: "RIFF" + file size + "WEBP", then a chunk whose
/// FourCC at offset 12 picks the sub-format header layout.
fn sniff_webp(bytes: &[u8]) -> Option<ImageDimensions> {
    if bytes.len() < 16 || &bytes[..4] != b"RIFF" || bytes[8] != b'W' {
        return None;
    }

    match &bytes[12..16] {
        // Lossless: one little-endian u32 packs both dimensions, each stored
        // minus one in 14 bits.
        b"VP8L" => {
            let value = read_u32_le(bytes, 21)?;
            let width = (value & 0x3FFF) + 1;
            let height = ((value >> 14) & 0x3FFF) + 1;
            nonzero(width, height)
        }
        // Lossy: plain little-endian u16 pair in the frame header.
        b"VP8 " => {
            let width = u32::from(read_u16_le(bytes, 26)?);
            let height = u32::from(read_u16_le(bytes, 28)?);
            nonzero(width, height)
        }
        // Extended: 24-bit little-endian values, stored minus one.
        b"VP8X" => {
            let width = read_u24_le(bytes, 24)? + 1;
            let height = read_u24_le(bytes, 27)? + 1;
            nonzero(width, height)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Bounds-checked reads
// ---------------------------------------------------------------------------

fn read_u16_be(bytes: &[u8], offset: usize) -> Option<u16> {
    let b = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([b[0], b[1]]))
}

fn read_u32_be(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let b = bytes.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u24_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset + 3)?;
    Some(u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16)
}

fn nonzero(width: u32, height: u32) -> Option<ImageDimensions> {
    if width == 0 || height == 0 {
        None
    } else {
        Some(ImageDimensions { width, height })
    }
}
