//! WinAnsiEncoding for the simple fonts used on the page
//!
//! 0x20..=0x7E and 0xA0..=0xFF coincide with Unicode. The 0x80..=0x9F block
//! is the only irregular range and is kept as a lookup table.

const HIGH_BLOCK: [Option<char>; 32] = [
    Some('\u{20AC}'), // 0x80 euro
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None, // 0x90
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Encode a single character, `None` when WinAnsi has no code for it.
pub fn encode_char(ch: char) -> Option<u8> {
    let cp = ch as u32;
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => Some(cp as u8),
        // Tabs and newlines are never drawn as glyphs.
        0x09 | 0x0A | 0x0D => Some(b' '),
        _ => HIGH_BLOCK
            .iter()
            .position(|c| *c == Some(ch))
            .map(|i| 0x80 + i as u8),
    }
}

/// Encode a string; characters outside WinAnsi become `?`.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars().map(|ch| encode_char(ch).unwrap_or(b'?')).collect()
}

/// Unicode character for a WinAnsi code, used to build width tables.
pub fn decode_byte(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as char),
        0x80..=0x9F => HIGH_BLOCK[(code - 0x80) as usize],
        _ => None,
    }
}
