//! The printable alphabet used to turn digit groups into text

use super::stream::decode_digits;

/// Index 0 is a space, so a run of zero groups reads as blanks.
pub const PRINTABLE: &str = concat!(
    " abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "1234567890",
    "!@#$%^&*()+-<>.,",
);

/// Look up a single character. Indices past the end have no character.
pub fn printable(index: u64) -> Option<char> {
    usize::try_from(index)
        .ok()
        .and_then(|i| PRINTABLE.as_bytes().get(i))
        .map(|&b| b as char)
}

/// Split `digits` into `window`-wide groups (the last may be short).
pub fn split_groups(digits: &str, window: usize) -> Vec<&str> {
    let window = window.max(1);
    digits
        .as_bytes()
        .chunks(window)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect()
}

/// Map every `window`-wide group of `digits` to its character and join them.
pub fn to_text(digits: &str, window: usize) -> String {
    split_groups(digits, window)
        .into_iter()
        .filter_map(|group| printable(decode_digits(group.as_bytes())))
        .collect()
}
