//! Seven-segment glyphs and the FCU's folded digit layout

/// Segment pattern for one character, `a..g` in bits 7..1.
///
/// Bit 0 is left clear; after [`swap_layout`] it becomes a flag position.
/// Unknown characters render blank.
pub fn segment_pattern(c: char) -> u8 {
    match c {
        '0' | 'O' | 'o' => 0xFC,
        '1' => 0x60,
        '2' => 0xDA,
        '3' => 0xF2,
        '4' => 0x66,
        '5' | 'S' => 0xB6,
        '6' => 0xBE,
        '7' => 0xE0,
        '8' => 0xFE,
        '9' => 0xF6,
        '-' => 0x02,
        't' => 0x1E,
        'd' => 0x7A,
        _ => 0x00,
    }
}

pub fn encode_digits(text: &str) -> Vec<u8> {
    text.chars().map(segment_pattern).collect()
}

/// Rearrange left-to-right segment bytes into the device's order.
///
/// Each byte is nibble-swapped, the order is reversed so the rightmost digit
/// comes first, and every digit straddles two output bytes: its low
/// nibble lands in byte `i` and its high nibble in byte `i + 1`.
pub fn swap_layout(digits: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; digits.len() + 1];
    for (i, &segments) in digits.iter().rev().enumerate() {
        let swapped = segments.rotate_left(4);
        out[i] |= swapped & 0x0F;
        out[i + 1] |= swapped & 0xF0;
    }
    out
}
