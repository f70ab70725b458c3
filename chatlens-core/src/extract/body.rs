//! Message body decoding
//!
//! Newer store rows leave the plain `text` column NULL and carry the body in
//! `attributedBody`, an archived-object ("typedstream") blob. A full archive
//! parser is not needed to get the text back out: the payload sits right
//! after the `NSString` class name, tagged with a `+` byte and a short
//! length prefix. This module extracts exactly that payload and nothing
//! else. Any blob that doesn't match the shape decodes to `None`, which
//! callers substitute with empty text.

const NSSTRING: &[u8] = b"NSString";

/// Class metadata separates the `NSString` name from the `+` tag; it is a
/// handful of bytes in every archive version seen in the wild.
const SCAN_WINDOW: usize = 20;

/// Extract the message text from an `attributedBody` blob.
///
/// Returns `None` when the blob does not contain a recognizable string
/// payload. A present-but-empty payload decodes to `Some("")`.
pub fn decode_body(blob: &[u8]) -> Option<String> {
    let scan_from = find_subsequence(blob, NSSTRING)? + NSSTRING.len();
    let scan_to = (scan_from + SCAN_WINDOW).min(blob.len());

    for i in scan_from..scan_to {
        if blob[i] != b'+' {
            continue;
        }
        let Some((start, len)) = payload_bounds(blob, i + 1) else {
            continue;
        };
        let Some(payload) = blob.get(start..start + len) else {
            continue;
        };
        if let Ok(text) = std::str::from_utf8(payload) {
            return Some(text.to_string());
        }
    }

    None
}

/// Length encoding after the `+` tag: a single byte below 0x80, or an
/// 0x81/0x82 marker followed by a 2- or 3-byte little-endian length.
fn payload_bounds(blob: &[u8], at: usize) -> Option<(usize, usize)> {
    match *blob.get(at)? {
        n if n < 0x80 => Some((at + 1, n as usize)),
        0x81 => {
            let len = blob.get(at + 1..at + 3)?;
            Some((at + 3, usize::from(u16::from_le_bytes([len[0], len[1]]))))
        }
        0x82 => {
            let len = blob.get(at + 1..at + 4)?;
            Some((
                at + 4,
                usize::from(len[0]) | usize::from(len[1]) << 8 | usize::from(len[2]) << 16,
            ))
        }
        _ => None,
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
