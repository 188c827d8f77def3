//! Minimal EXIF orientation reader for JPEG files.
//!
//! Walks the JPEG markers to the first `Exif\0\0` APP1 segment and hands its
//! TIFF payload to `kamadak-exif` for the Orientation tag of the primary
//! image. Everything else in the segment is ignored.
//!
//! The scan never looks past the first [`SCAN_LIMIT`] bytes and never fails:
//! a missing, truncated, or malformed segment, or a value outside 1–8, all
//! read as orientation 1 (upright).

/// Bytes of the file prefix searched for the APP1 segment.
pub const SCAN_LIMIT: usize = 64 * 1024;

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Read the EXIF orientation code (1-8) from JPEG bytes.
pub fn read_orientation(data: &[u8]) -> u8 {
    let data = &data[..data.len().min(SCAN_LIMIT)];
    match find_orientation(data) {
        Some(value @ 1..=8) => value as u8,
        _ => 1,
    }
}

// ---------------------------------------------------------------------------
// JPEG: walk markers to the APP1 segment
// ---------------------------------------------------------------------------

fn find_orientation(data: &[u8]) -> Option<u32> {
    // SOI
    if data.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        match marker {
            // Fill byte before a marker
            0xFF => {
                pos += 1;
                continue;
            }
            // SOS or EOI: metadata segments are over
            0xDA | 0xD9 => return None,
            // Markers without length field
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            _ => {}
        }

        let len = u16::from_be_bytes([*data.get(pos + 2)?, *data.get(pos + 3)?]) as usize;
        if len < 2 {
            return None;
        }
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + len).min(data.len());

        if marker == 0xE1 {
            let segment = data.get(seg_start..seg_end)?;
            if let Some(tiff) = segment.strip_prefix(EXIF_HEADER) {
                return orientation_from_tiff(tiff);
            }
            // XMP and other APP1 payloads: keep scanning
        }

        pos += 2 + len;
    }
    None
}

/// Parse the TIFF payload of the APP1 segment and read Orientation from
/// the primary image.
fn orientation_from_tiff(tiff: &[u8]) -> Option<u32> {
    let exif = ::exif::Reader::new().read_raw(tiff.to_vec()).ok()?;
    exif.get_field(::exif::Tag::Orientation, ::exif::In::PRIMARY)?
        .value
        .get_uint(0)
}
