//! Fixed-length string conversion.

/// Split a byte buffer into strings of `length` bytes each.
///
/// Each string ends at its first NUL and has trailing whitespace and control
/// characters removed. A trailing partial chunk is ignored.
pub fn byte_to_string(bytes: &[u8], length: usize) -> Vec<String> {
    if length == 0 {
        return Vec::new();
    }
    bytes
        .chunks_exact(length)
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
            let text = String::from_utf8_lossy(&chunk[..end]);
            text.trim_end_matches(|c: char| c <= ' ').to_string()
        })
        .collect()
}

/// Pack strings into fixed-length byte records.
///
/// Longer strings are truncated to `length` bytes, shorter ones padded with
/// spaces; an absent string becomes a blank record.
pub fn string_to_byte(strings: &[Option<String>], length: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(strings.len() * length);
    for s in strings {
        let raw = s.as_deref().unwrap_or("").as_bytes();
        let take = raw.len().min(length);
        bytes.extend_from_slice(&raw[..take]);
        bytes.resize(bytes.len() + (length - take), b' ');
    }
    bytes
}
