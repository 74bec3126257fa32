//! Borrowed views over a program's digits
//!
//! Every stream the interpreter touches (a loop body, the continuation after
//! a terminator, the remainder handed to a new context) is a sub-range of
//! the one program buffer. Keeping the absolute start offset lets fatal
//! errors point back at the exact digits that caused them.

use std::fmt;

/// A contiguous range of program digits.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DigitStream<'a> {
    digits: &'a [u8],
    offset: usize,
}

impl<'a> DigitStream<'a> {
    /// View an entire program.
    pub fn new(digits: &'a str) -> Self {
        DigitStream {
            digits: digits.as_bytes(),
            offset: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Absolute position of the first digit within the program.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.digits
    }

    /// Split off the first `n` digits (clamped to the stream length).
    pub fn split(self, n: usize) -> (DigitStream<'a>, DigitStream<'a>) {
        let n = n.min(self.digits.len());
        let (head, tail) = self.digits.split_at(n);
        (
            DigitStream {
                digits: head,
                offset: self.offset,
            },
            DigitStream {
                digits: tail,
                offset: self.offset + n,
            },
        )
    }

    /// Take one full `window`-wide group, or `None` if too few digits remain.
    pub fn take_group(self, window: usize) -> Option<(DigitStream<'a>, DigitStream<'a>)> {
        if self.digits.len() < window {
            None
        } else {
            Some(self.split(window))
        }
    }

    /// Position of the first occurrence of `needle`, relative to this stream.
    pub fn find(&self, needle: &str) -> Option<usize> {
        let needle = needle.as_bytes();
        if needle.is_empty() || needle.len() > self.digits.len() {
            return None;
        }
        self.digits.windows(needle.len()).position(|w| w == needle)
    }

    /// Decode this stream as a non-negative integer. Anything that is not a
    /// plain run of ASCII digits decodes as 0.
    pub fn value(&self) -> u64 {
        decode_digits(self.digits)
    }

    pub fn as_str(&self) -> &'a str {
        // Only ever constructed from `&str` and split at ASCII digit
        // boundaries; a non-ASCII byte inside a group falls back to "".
        std::str::from_utf8(self.digits).unwrap_or("")
    }
}

impl fmt::Debug for DigitStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", String::from_utf8_lossy(self.digits), self.offset)
    }
}

impl fmt::Display for DigitStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.digits))
    }
}

/// Decode a run of ASCII digits, saturating on overflow. Non-digits give 0.
pub fn decode_digits(digits: &[u8]) -> u64 {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return 0;
    }
    digits.iter().fold(0u64, |acc, d| {
        acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_group_tracks_offset() {
        let s = DigitStream::new("981");
        let (group, rest) = s.take_group(2).unwrap();
        assert_eq!(group.value(), 98);
        assert_eq!(rest.offset(), 2);
        assert_eq!(rest.as_str(), "1");
        assert!(rest.take_group(2).is_none());
    }

    #[test]
    fn test_find_is_relative() {
        let (_, rest) = DigitStream::new("0071119992000").split(3);
        assert_eq!(rest.find("1999"), Some(3));
        assert_eq!(rest.find("2000"), Some(6));
        assert_eq!(rest.find("3333"), None);
    }

    #[test]
    fn test_value_non_digit_is_zero() {
        assert_eq!(decode_digits(b"4a"), 0);
        assert_eq!(decode_digits(b""), 0);
        assert_eq!(decode_digits(b"007"), 7);
    }

    #[test]
    fn test_split_clamps() {
        let (head, tail) = DigitStream::new("12").split(5);
        assert_eq!(head.as_str(), "12");
        assert!(tail.is_empty());
        assert_eq!(tail.offset(), 2);
    }
}
