//! Decoding of `\uXXXX` escapes.
//!
//! A `\u` escape carries one UTF-16 code unit as four ASCII hex digits
//! (`0-9`, `A-F`, `a-f`). Code points outside the Basic Multilingual Plane
//! arrive as two consecutive escapes, a high surrogate followed by a low
//! surrogate, which [`join_surrogates`] combines into one [`char`]. A
//! surrogate that is not part of such a pair has no `char` representation
//! and is rejected by the reader.

/// Converts a single ASCII hex digit into its 0..=15 value.
#[inline]
fn hex_val(b: u8) -> Option<u16> {
    match b {
        b'0'..=b'9' => Some(u16::from(b - b'0')),
        b'a'..=b'f' => Some(u16::from(b - b'a') + 10),
        b'A'..=b'F' => Some(u16::from(b - b'A') + 10),
        _ => None,
    }
}

/// Decodes exactly four hex digits into a UTF-16 code unit.
///
/// On failure returns the index of the first byte that is not a hex digit.
pub(crate) fn decode_code_unit(digits: [u8; 4]) -> Result<u16, usize> {
    let mut acc = 0u16;
    for (i, b) in digits.into_iter().enumerate() {
        let d = hex_val(b).ok_or(i)?;
        acc = (acc << 4) | d;
    }
    Ok(acc)
}

#[inline]
pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

/// Combines a high and a low surrogate into the code point they encode.
///
/// Returns `None` if `high` or `low` is not a surrogate of the right half.
pub(crate) fn join_surrogates(high: u16, low: u16) -> Option<char> {
    if !is_high_surrogate(high) || !(0xDC00..=0xDFFF).contains(&low) {
        return None;
    }
    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(code)
}
