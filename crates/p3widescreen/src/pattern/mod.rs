//! Byte patterns with fill-in dword slots.
//!
//! A pattern is written as whitespace-separated tokens: a two-digit hex byte
//! that must match exactly, or `?` for a 4-byte little-endian value that is
//! skipped when verifying and written when patching.

mod patch;

pub use patch::DWordPatch;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Width of a fill-in slot in bytes.
pub const DWORD_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Literal(u8),
    DWord,
}

impl Slot {
    pub fn width(&self) -> usize {
        match self {
            Slot::Literal(_) => 1,
            Slot::DWord => DWORD_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePattern {
    slots: Vec<Slot>,
    patch_length: usize,
    wildcard_count: usize,
}

impl BytePattern {
    pub fn new(slots: Vec<Slot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }
        let patch_length = slots.iter().map(Slot::width).sum();
        let wildcard_count = slots.iter().filter(|s| **s == Slot::DWord).count();
        Ok(Self {
            slots,
            patch_length,
            wildcard_count,
        })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of bytes covered by the pattern.
    pub fn patch_length(&self) -> usize {
        self.patch_length
    }

    /// Number of dword values needed to apply the pattern.
    pub fn wildcard_count(&self) -> usize {
        self.wildcard_count
    }
}

impl FromStr for BytePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(parse_pattern(s)?)
    }
}

impl fmt::Display for BytePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pattern(&self.slots))
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Slot>> {
    let mut slots = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "?" {
            slots.push(Slot::DWord);
            continue;
        }

        if token.len() != 2 {
            return Err(Error::InvalidPattern(format!(
                "token '{}' is not a two-digit hex byte or '?'",
                token
            )));
        }
        let value = u8::from_str_radix(token, 16)
            .map_err(|e| Error::InvalidPattern(format!("invalid token '{}': {}", token, e)))?;
        slots.push(Slot::Literal(value));
    }
    Ok(slots)
}

pub fn format_pattern(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(|s| match s {
            Slot::Literal(value) => format!("{:02x}", value),
            Slot::DWord => "?".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let pattern: BytePattern = "c7 44 24 4c ? c7 44 24 50 ?".parse().unwrap();
        assert_eq!(pattern.slots().len(), 10);
        assert_eq!(pattern.slots()[0], Slot::Literal(0xc7));
        assert_eq!(pattern.slots()[4], Slot::DWord);
        assert_eq!(pattern.patch_length(), 16);
        assert_eq!(pattern.wildcard_count(), 2);
    }

    #[test]
    fn test_parse_pattern_tolerates_extra_whitespace() {
        let pattern: BytePattern = "  3d 00\t04 00 00  74 1e 3d ?\n".parse().unwrap();
        assert_eq!(pattern.patch_length(), 12);
        assert_eq!(pattern.wildcard_count(), 1);
    }

    #[test]
    fn test_parse_pattern_rejects_bad_tokens() {
        assert!(matches!(
            "c7 zz".parse::<BytePattern>(),
            Err(Error::InvalidPattern(_))
        ));
        assert!(matches!(
            "c7 ??".parse::<BytePattern>(),
            Err(Error::InvalidPattern(_))
        ));
        assert!(matches!(
            "c744".parse::<BytePattern>(),
            Err(Error::InvalidPattern(_))
        ));
        assert!(matches!(
            "   ".parse::<BytePattern>(),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_format_pattern_roundtrip() {
        let text = "3d 00 04 00 00 0f 84 af 00 00 00 3d ?";
        let pattern: BytePattern = text.parse().unwrap();
        assert_eq!(pattern.to_string(), text);
    }
}
