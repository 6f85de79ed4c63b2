//! Fixed-width vectors of 4-state logic values for parameters and attributes.

use crate::logic::Logic;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A fixed-width vector of 4-state [`Logic`] values.
///
/// Each value occupies 2 bits, with 32 values packed per `u64` word. Bit 0 is
/// the least significant bit. Parameter and attribute values are stored as
/// `Const`; text values use 8 bits per character with the first character in
/// the most significant byte.
///
/// Serialized as a binary string, most significant bit first (`"10xz"`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Const {
    width: u32,
    data: Vec<u64>,
}

/// Number of logic values packed per u64 word.
const VALUES_PER_WORD: u32 = 32;

impl Const {
    /// Creates a `Const` of the given width with every bit set to `value`.
    pub fn repeat(value: Logic, width: u32) -> Self {
        let mut c = Self {
            width,
            data: vec![0; word_count(width)],
        };
        if value != Logic::Zero {
            for i in 0..width {
                c.set(i, value);
            }
        }
        c
    }

    /// Creates an all-zero `Const` of the given width.
    pub fn zero(width: u32) -> Self {
        Self::repeat(Logic::Zero, width)
    }

    /// Creates a `Const` from logic values, least significant first.
    pub fn from_bits(bits: &[Logic]) -> Self {
        let mut c = Self::zero(bits.len() as u32);
        for (i, &b) in bits.iter().enumerate() {
            c.set(i as u32, b);
        }
        c
    }

    /// Creates a `Const` from a `u64` value with the given width.
    ///
    /// Bits beyond 64 are zero.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut c = Self::zero(width);
        for i in 0..width.min(64) {
            if (value >> i) & 1 != 0 {
                c.set(i, Logic::One);
            }
        }
        c
    }

    /// Encodes a text string, 8 bits per character.
    pub fn from_string(s: &str) -> Self {
        let bytes = s.as_bytes();
        let mut c = Self::zero(bytes.len() as u32 * 8);
        for (i, byte) in bytes.iter().rev().enumerate() {
            for bit in 0..8 {
                if byte & (1 << bit) != 0 {
                    c.set(i as u32 * 8 + bit, Logic::One);
                }
            }
        }
        c
    }

    /// Returns the number of logic values in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns `true` for a zero-width constant.
    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        Logic::from_bits(self.data[word_idx] >> bit_offset)
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        let mask = !(0b11u64 << bit_offset);
        self.data[word_idx] = (self.data[word_idx] & mask) | ((value as u64) << bit_offset);
    }

    /// Appends the bits of `other` above the current most significant bit.
    pub fn append(&mut self, other: &Const) {
        let base = self.width;
        self.width = base.saturating_add(other.width);
        self.data.resize(word_count(self.width), 0);
        for i in 0..self.width - base {
            self.set(base + i, other.get(i));
        }
    }

    /// Iterates over the bits, least significant first.
    pub fn iter(&self) -> impl Iterator<Item = Logic> + '_ {
        (0..self.width).map(|i| self.get(i))
    }

    /// Returns `width` bits starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the constant's width.
    pub fn extract(&self, offset: u32, width: u32) -> Const {
        assert!(offset + width <= self.width, "extract out of range");
        let mut out = Const::zero(width);
        for i in 0..width {
            out.set(i, self.get(offset + i));
        }
        out
    }

    /// Returns `true` if every bit is `Zero` or `One`.
    pub fn is_fully_def(&self) -> bool {
        self.iter().all(Logic::is_def)
    }

    /// Returns `true` if every bit is `Zero`.
    pub fn is_fully_zero(&self) -> bool {
        self.iter().all(|b| b == Logic::Zero)
    }

    /// Interprets the constant as an unsigned integer.
    ///
    /// Returns `None` if any bit is X or Z, or if a set bit lies beyond bit 63.
    pub fn as_u64(&self) -> Option<u64> {
        let mut result = 0u64;
        for (i, b) in self.iter().enumerate() {
            match b {
                Logic::Zero => {}
                Logic::One if i < 64 => result |= 1 << i,
                _ => return None,
            }
        }
        Some(result)
    }

    /// Interprets the constant as a boolean flag (any bit set).
    pub fn as_bool(&self) -> bool {
        self.iter().any(|b| b == Logic::One)
    }

    /// Decodes the constant as text, 8 bits per character.
    ///
    /// Leading NUL bytes are skipped. Returns `None` if the width is not a
    /// multiple of 8 or the bytes are not UTF-8.
    pub fn as_string(&self) -> Option<String> {
        if self.width % 8 != 0 {
            return None;
        }
        let mut bytes = Vec::with_capacity((self.width / 8) as usize);
        for chunk in (0..self.width / 8).rev() {
            let mut byte = 0u8;
            for bit in 0..8 {
                if self.get(chunk * 8 + bit) == Logic::One {
                    byte |= 1 << bit;
                }
            }
            if byte != 0 || !bytes.is_empty() {
                bytes.push(byte);
            }
        }
        String::from_utf8(bytes).ok()
    }

    /// Parses a binary string like `"10XZ"` (most significant bit first).
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let mut bits = Vec::with_capacity(s.len());
        for c in s.chars().rev() {
            bits.push(Logic::from_char(c)?);
        }
        Some(Self::from_bits(&bits))
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{self}", self.width)
    }
}

/// Error type for parsing binary constant strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid constant: '{input}'")]
pub struct ParseConstError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for Const {
    type Err = ParseConstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Const::from_binary_str(s).ok_or_else(|| ParseConstError {
            input: s.to_string(),
        })
    }
}

impl Serialize for Const {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Const {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ConstVisitor;

        impl Visitor<'_> for ConstVisitor {
            type Value = Const;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a binary string of 0/1/x/z digits")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Const, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(ConstVisitor)
    }
}

/// Returns the number of u64 words needed to store `width` logic values.
fn word_count(width: u32) -> usize {
    width.div_ceil(VALUES_PER_WORD) as usize
}
