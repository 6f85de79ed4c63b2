//! Driver and user lookup over resolved signal bits.
//!
//! [`SignalIndex`] answers "which cell ports drive this bit", "which cell
//! ports read it", and "is it visible outside the module". All keys are
//! canonical bits from the module's [`SigMap`]; callers must resolve a signal
//! before querying. The index is a snapshot: rebuild it after the module
//! changes.

use crate::celltypes;
use crate::module::Module;
use crate::sigmap::SigMap;
use crate::sigspec::{SigBit, SigSpec};
use sinter_common::IdString;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A (cell, port) pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortRef {
    /// The cell name.
    pub cell: IdString,
    /// The port name on that cell.
    pub port: IdString,
}

/// Driver, user, and port-exposure lookup for one module.
#[derive(Debug)]
pub struct SignalIndex {
    sigmap: SigMap,
    drivers: HashMap<SigBit, BTreeSet<PortRef>>,
    users: HashMap<SigBit, BTreeSet<PortRef>>,
    port_bits: HashSet<SigBit>,
}

impl SignalIndex {
    /// Builds the index for `module`.
    ///
    /// Ports of builtin cells are classified through the capability table;
    /// every port of an unknown cell type counts as a user. Constant bits
    /// are never indexed.
    pub fn build(module: &Module) -> Self {
        let sigmap = SigMap::from_module(module);
        let mut drivers: HashMap<SigBit, BTreeSet<PortRef>> = HashMap::new();
        let mut users: HashMap<SigBit, BTreeSet<PortRef>> = HashMap::new();

        for cell in module.cells() {
            let info = celltypes::lookup(cell.cell_type.as_str());
            for (port, sig) in &cell.connections {
                let is_output = info.is_some_and(|info| info.is_output(port.as_str()));
                let target = if is_output { &mut drivers } else { &mut users };
                let entry = PortRef {
                    cell: cell.name.clone(),
                    port: port.clone(),
                };
                for bit in sigmap.resolve(sig).bits().filter(|b| !b.is_const()) {
                    target.entry(bit).or_default().insert(entry.clone());
                }
            }
        }

        let mut port_bits = HashSet::new();
        for wire in module.wires().filter(|w| w.is_port()) {
            let resolved = sigmap.resolve(&SigSpec::from_wire(wire));
            port_bits.extend(resolved.bits().filter(|b| !b.is_const()));
        }

        Self {
            sigmap,
            drivers,
            users,
            port_bits,
        }
    }

    /// Returns the alias resolution the index was built with.
    pub fn sigmap(&self) -> &SigMap {
        &self.sigmap
    }

    /// Shorthand for `self.sigmap().resolve(sig)`.
    pub fn resolve(&self, sig: &SigSpec) -> SigSpec {
        self.sigmap.resolve(sig)
    }

    /// Collects the ports driving any bit of the resolved signal.
    pub fn drivers(&self, sig: &SigSpec) -> BTreeSet<PortRef> {
        collect(&self.drivers, sig)
    }

    /// Collects the ports reading any bit of the resolved signal.
    pub fn users(&self, sig: &SigSpec) -> BTreeSet<PortRef> {
        collect(&self.users, sig)
    }

    /// Returns `true` if any bit of the resolved signal is a module port.
    pub fn is_port_exposed(&self, sig: &SigSpec) -> bool {
        sig.bits().any(|bit| self.port_bits.contains(&bit))
    }
}

fn collect(map: &HashMap<SigBit, BTreeSet<PortRef>>, sig: &SigSpec) -> BTreeSet<PortRef> {
    let mut out = BTreeSet::new();
    for bit in sig.bits() {
        if let Some(refs) = map.get(&bit) {
            out.extend(refs.iter().cloned());
        }
    }
    out
}
