//! Bit-level signal references.
//!
//! A [`SigSpec`] is an ordered list of [`SigChunk`]s, least significant
//! first. Each chunk is either a contiguous bit range of a named wire or a
//! literal constant. Wires are referenced by name only; the owning
//! [`Module`](crate::Module) resolves them.

use crate::wire::Wire;
use serde::{Deserialize, Serialize};
use sinter_common::{Const, IdString, Logic};
use std::fmt;

/// A single bit of a signal: one bit of a wire or a constant state.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigBit {
    /// Bit `offset` of the named wire.
    Wire {
        /// The wire name.
        wire: IdString,
        /// The bit index within the wire.
        offset: u32,
    },
    /// A constant bit.
    Const(Logic),
}

impl SigBit {
    /// Returns `true` for constant bits.
    pub fn is_const(&self) -> bool {
        matches!(self, SigBit::Const(_))
    }
}

/// A contiguous piece of a [`SigSpec`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigChunk {
    /// Bits `offset .. offset + width` of the named wire.
    Wire {
        /// The wire name.
        wire: IdString,
        /// The first bit taken from the wire.
        offset: u32,
        /// The number of bits taken.
        width: u32,
    },
    /// A literal constant.
    Const(Const),
}

impl SigChunk {
    /// Returns the width of the chunk in bits.
    pub fn width(&self) -> u32 {
        match self {
            SigChunk::Wire { width, .. } => *width,
            SigChunk::Const(value) => value.width(),
        }
    }

    /// Returns bit `index` of this chunk.
    fn bit(&self, index: u32) -> SigBit {
        match self {
            SigChunk::Wire { wire, offset, .. } => SigBit::Wire {
                wire: wire.clone(),
                offset: offset.saturating_add(index),
            },
            SigChunk::Const(value) => SigBit::Const(value.get(index)),
        }
    }

    fn slice(&self, start: u32, width: u32) -> SigChunk {
        match self {
            SigChunk::Wire { wire, offset, .. } => SigChunk::Wire {
                wire: wire.clone(),
                offset: offset.saturating_add(start),
                width,
            },
            SigChunk::Const(value) => SigChunk::Const(value.extract(start, width)),
        }
    }
}

/// An ordered sequence of wire ranges and constants.
///
/// Equality is bitwise: two specs that list the same bits in a different
/// chunking compare equal.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigSpec {
    chunks: Vec<SigChunk>,
}

impl SigSpec {
    /// Creates an empty (zero-width) signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// References every bit of `wire`.
    pub fn from_wire(wire: &Wire) -> Self {
        Self::wire_range(&wire.name, 0, wire.width)
    }

    /// References bits `offset .. offset + width` of the named wire.
    pub fn wire_range(wire: &IdString, offset: u32, width: u32) -> Self {
        let mut sig = Self::new();
        sig.push_chunk(SigChunk::Wire {
            wire: wire.clone(),
            offset,
            width,
        });
        sig
    }

    /// A constant signal.
    pub fn from_const(value: Const) -> Self {
        let mut sig = Self::new();
        sig.push_chunk(SigChunk::Const(value));
        sig
    }

    /// A constant signal with every bit set to `value`.
    pub fn repeat(value: Logic, width: u32) -> Self {
        Self::from_const(Const::repeat(value, width))
    }

    /// Builds a signal from individual bits, least significant first.
    pub fn from_bits<I: IntoIterator<Item = SigBit>>(bits: I) -> Self {
        let mut sig = Self::new();
        for bit in bits {
            sig.push_bit(bit);
        }
        sig
    }

    /// Returns the total width in bits.
    pub fn width(&self) -> u32 {
        self.chunks
            .iter()
            .fold(0u32, |total, chunk| total.saturating_add(chunk.width()))
    }

    /// Returns `true` for a zero-width signal.
    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }

    /// Returns the chunks, least significant first.
    pub fn chunks(&self) -> &[SigChunk] {
        &self.chunks
    }

    /// Iterates over the individual bits, least significant first.
    pub fn bits(&self) -> impl Iterator<Item = SigBit> + '_ {
        self.chunks
            .iter()
            .flat_map(|chunk| (0..chunk.width()).map(move |i| chunk.bit(i)))
    }

    /// Appends a chunk, merging it with the previous one when contiguous.
    pub fn push_chunk(&mut self, chunk: SigChunk) {
        if chunk.width() == 0 {
            return;
        }
        if let Some(last) = self.chunks.last_mut() {
            match (last, &chunk) {
                (
                    SigChunk::Wire {
                        wire: lw,
                        offset: lo,
                        width: lwidth,
                    },
                    SigChunk::Wire { wire, offset, width },
                ) if lw == wire && lo.checked_add(*lwidth) == Some(*offset) => {
                    *lwidth += width;
                    return;
                }
                (SigChunk::Const(lc), SigChunk::Const(c)) => {
                    lc.append(c);
                    return;
                }
                _ => {}
            }
        }
        self.chunks.push(chunk);
    }

    fn push_bit(&mut self, bit: SigBit) {
        match bit {
            SigBit::Wire { wire, offset } => self.push_chunk(SigChunk::Wire {
                wire,
                offset,
                width: 1,
            }),
            SigBit::Const(state) => self.push_chunk(SigChunk::Const(Const::repeat(state, 1))),
        }
    }

    /// Concatenates `other` above the current most significant bit.
    pub fn append(&mut self, other: &SigSpec) {
        for chunk in &other.chunks {
            self.push_chunk(chunk.clone());
        }
    }

    /// Returns bits `offset .. offset + width`.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the signal's width.
    pub fn extract(&self, offset: u32, width: u32) -> SigSpec {
        assert!(
            offset.checked_add(width).is_some_and(|end| end <= self.width()),
            "extract [{offset} +: {width}] out of range for width {}",
            self.width()
        );
        let mut out = SigSpec::new();
        let mut pos = 0;
        for chunk in &self.chunks {
            let chunk_width = chunk.width();
            let lo = offset.max(pos);
            let hi = (offset + width).min(pos + chunk_width);
            if lo < hi {
                out.push_chunk(chunk.slice(lo - pos, hi - lo));
            }
            pos += chunk_width;
        }
        out
    }

    /// Drops every bit at index `width` and above.
    pub fn truncate(&mut self, width: u32) {
        if width < self.width() {
            *self = self.extract(0, width);
        }
    }

    /// Pads the signal with zero bits up to `width`.
    pub fn zero_extend(&mut self, width: u32) {
        let current = self.width();
        if width > current {
            self.append(&SigSpec::repeat(Logic::Zero, width - current));
        }
    }

    /// Returns `true` if every bit is a constant.
    pub fn is_fully_const(&self) -> bool {
        self.chunks
            .iter()
            .all(|chunk| matches!(chunk, SigChunk::Const(_)))
    }

    /// Returns the constant value if the signal is fully constant.
    pub fn as_const(&self) -> Option<Const> {
        if !self.is_fully_const() {
            return None;
        }
        let bits: Vec<Logic> = self
            .bits()
            .map(|bit| match bit {
                SigBit::Const(state) => state,
                SigBit::Wire { .. } => Logic::X,
            })
            .collect();
        Some(Const::from_bits(&bits))
    }

    /// Iterates over the names of wires referenced by this signal.
    pub fn wires(&self) -> impl Iterator<Item = &IdString> + '_ {
        self.chunks.iter().filter_map(|chunk| match chunk {
            SigChunk::Wire { wire, .. } => Some(wire),
            SigChunk::Const(_) => None,
        })
    }

    /// Returns a copy with every wire reference renamed through `rename`.
    pub fn rename_wires<F: FnMut(&IdString) -> IdString>(&self, mut rename: F) -> SigSpec {
        let mut out = SigSpec::new();
        for chunk in &self.chunks {
            out.push_chunk(match chunk {
                SigChunk::Wire {
                    wire,
                    offset,
                    width,
                } => SigChunk::Wire {
                    wire: rename(wire),
                    offset: *offset,
                    width: *width,
                },
                SigChunk::Const(value) => SigChunk::Const(value.clone()),
            });
        }
        out
    }
}

impl PartialEq for SigSpec {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width() && self.bits().eq(other.bits())
    }
}

impl Eq for SigSpec {}

impl From<Const> for SigSpec {
    fn from(value: Const) -> Self {
        SigSpec::from_const(value)
    }
}

impl fmt::Display for SigChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigChunk::Wire {
                wire,
                offset,
                width,
            } => {
                if *width == 1 {
                    write!(f, "{wire} [{offset}]")
                } else {
                    let msb = (u64::from(*offset) + u64::from(*width)).saturating_sub(1);
                    write!(f, "{wire} [{msb}:{offset}]")
                }
            }
            SigChunk::Const(value) => write!(f, "{}'{value}", value.width()),
        }
    }
}

impl fmt::Display for SigSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chunks.as_slice() {
            [] => write!(f, "{{}}"),
            [single] => write!(f, "{single}"),
            many => {
                write!(f, "{{")?;
                for chunk in many.iter().rev() {
                    write!(f, " {chunk}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl fmt::Debug for SigSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigSpec({self})")
    }
}
