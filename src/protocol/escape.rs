//! Octal escaping used by tmux for `%output` payloads.
//!
//! tmux escapes every byte below ASCII space, plus the backslash itself, as
//! `\NNN` (three octal digits). Everything else is passed through verbatim.

/// Decode a `%output` payload into raw bytes.
///
/// A backslash followed by exactly three octal digits whose value fits in a
/// byte decodes to that byte. Any other backslash is copied literally and
/// scanning resumes at the next character, so an incomplete escape such as
/// `\12x` survives unchanged.
pub fn unescape_octal(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\'
            && let Some(value) = octal_triplet(&bytes[i + 1..])
        {
            result.push(value);
            i += 4;
            continue;
        }
        result.push(bytes[i]);
        i += 1;
    }

    result
}

/// Value of the three octal digits at the start of `digits`, if present and <= 255.
fn octal_triplet(digits: &[u8]) -> Option<u8> {
    let triplet = digits.get(..3)?;
    let mut value: u16 = 0;
    for &d in triplet {
        if !(b'0'..=b'7').contains(&d) {
            return None;
        }
        value = value * 8 + u16::from(d - b'0');
    }
    u8::try_from(value).ok()
}
