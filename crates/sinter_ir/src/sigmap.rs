//! Canonical resolution of connected signal bits.
//!
//! A module's direct connections make bits aliases of each other. [`SigMap`]
//! groups aliased bits into equivalence classes and maps every bit to one
//! representative, so that structural analysis can compare signals by their
//! resolved form instead of chasing connection chains.
//!
//! Representatives are chosen deterministically: a constant bit represents
//! any class it belongs to, otherwise the bit seen first while scanning the
//! connections wins. Two different constants are never merged.

use crate::module::Module;
use crate::sigspec::{SigBit, SigSpec};
use std::collections::HashMap;

/// Bit-level alias resolution for one module.
#[derive(Debug, Default)]
pub struct SigMap {
    parent: HashMap<SigBit, SigBit>,
    first_seen: HashMap<SigBit, usize>,
}

impl SigMap {
    /// Creates an empty map where every bit resolves to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from all direct connections of `module`.
    pub fn from_module(module: &Module) -> Self {
        let mut map = Self::new();
        for conn in module.connections() {
            map.add(&conn.dst, &conn.src);
        }
        map.flatten();
        map
    }

    /// Records that `a` and `b` carry the same value, bit by bit.
    ///
    /// Extra bits of the wider side are ignored.
    pub fn add(&mut self, a: &SigSpec, b: &SigSpec) {
        for (x, y) in a.bits().zip(b.bits()) {
            self.note(&x);
            self.note(&y);
            self.union(x, y);
        }
    }

    fn note(&mut self, bit: &SigBit) {
        if !bit.is_const() && !self.first_seen.contains_key(bit) {
            let order = self.first_seen.len();
            self.first_seen.insert(bit.clone(), order);
        }
    }

    fn find(&self, bit: &SigBit) -> SigBit {
        let mut current = bit.clone();
        while let Some(next) = self.parent.get(&current) {
            if *next == current {
                break;
            }
            current = next.clone();
        }
        current
    }

    fn union(&mut self, a: SigBit, b: SigBit) {
        let ra = self.find(&a);
        let rb = self.find(&b);
        if ra == rb {
            return;
        }
        match (ra.is_const(), rb.is_const()) {
            (true, true) => {}
            (true, false) => {
                self.parent.insert(rb, ra);
            }
            (false, true) => {
                self.parent.insert(ra, rb);
            }
            (false, false) => {
                let order_a = self.first_seen.get(&ra).copied().unwrap_or(usize::MAX);
                let order_b = self.first_seen.get(&rb).copied().unwrap_or(usize::MAX);
                if order_a <= order_b {
                    self.parent.insert(rb, ra);
                } else {
                    self.parent.insert(ra, rb);
                }
            }
        }
    }

    /// Points every recorded bit directly at its representative.
    fn flatten(&mut self) {
        let keys: Vec<SigBit> = self.parent.keys().cloned().collect();
        for key in keys {
            let root = self.find(&key);
            self.parent.insert(key, root);
        }
    }

    /// Returns the representative of a single bit.
    pub fn resolve_bit(&self, bit: &SigBit) -> SigBit {
        if bit.is_const() {
            return bit.clone();
        }
        self.find(bit)
    }

    /// Replaces every bit of `sig` with its representative.
    ///
    /// The result has the same width as `sig`, and resolving it again yields
    /// the same signal.
    pub fn resolve(&self, sig: &SigSpec) -> SigSpec {
        SigSpec::from_bits(sig.bits().map(|bit| self.resolve_bit(&bit)))
    }
}
