//! Modules, the primary organizational unit of the netlist.
//!
//! A [`Module`] owns its wires, cells, memories, and processes by name, plus
//! an ordered list of direct connections. All cross references (cell ports to
//! wires, connections to wires) are by name, so the owning maps are the only
//! place an entity lives. Mutation goes through methods that keep names
//! unique and connection widths equal.

use crate::cell::Cell;
use crate::memory::{Memory, Process};
use crate::sigspec::{SigChunk, SigSpec};
use crate::wire::Wire;
use serde::{Deserialize, Serialize};
use sinter_common::{Const, IdString, InternalError, SinterResult};
use std::collections::BTreeMap;

/// A direct point-to-point connection: `dst` is driven by `src`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// The driven side.
    pub dst: SigSpec,
    /// The driving side.
    pub src: SigSpec,
}

/// A single module of the design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    /// The module name.
    pub name: IdString,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<IdString, Const>,
    /// Declared parameters and their default values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<IdString, Const>,
    #[serde(default)]
    wires: BTreeMap<IdString, Wire>,
    #[serde(default)]
    cells: BTreeMap<IdString, Cell>,
    #[serde(default)]
    connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    memories: BTreeMap<IdString, Memory>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    processes: BTreeMap<IdString, Process>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<IdString>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if any wire, cell, memory, or process uses `name`.
    pub fn has_name(&self, name: &IdString) -> bool {
        self.wires.contains_key(name)
            || self.cells.contains_key(name)
            || self.memories.contains_key(name)
            || self.processes.contains_key(name)
    }

    /// Returns `base` if unused, otherwise the first free `base_<n>`.
    pub fn uniquify_name(&self, base: &IdString) -> IdString {
        if !self.has_name(base) {
            return base.clone();
        }
        (1u32..)
            .map(|n| IdString::new(format!("{base}_{n}")))
            .find(|candidate| !self.has_name(candidate))
            .unwrap_or_else(|| base.clone())
    }

    fn ensure_unused(&self, name: &IdString, kind: &str) -> SinterResult<()> {
        if self.has_name(name) {
            return Err(InternalError::new(format!(
                "cannot add {kind} {name} to module {}: name already in use",
                self.name
            )));
        }
        Ok(())
    }

    /// Adds a wire. Fails if the name is taken.
    pub fn add_wire(&mut self, wire: Wire) -> SinterResult<&mut Wire> {
        self.ensure_unused(&wire.name, "wire")?;
        let name = wire.name.clone();
        Ok(self.wires.entry(name).or_insert(wire))
    }

    /// Adds a cell. Fails if the name is taken or a port references a
    /// missing wire or out-of-range bits.
    pub fn add_cell(&mut self, cell: Cell) -> SinterResult<&mut Cell> {
        self.ensure_unused(&cell.name, "cell")?;
        for (port, sig) in &cell.connections {
            self.check_sig(sig)
                .map_err(|e| InternalError::new(format!("cell {} port {port}: {}", cell.name, e.message)))?;
        }
        let name = cell.name.clone();
        Ok(self.cells.entry(name).or_insert(cell))
    }

    /// Adds a memory. Fails if the name is taken.
    pub fn add_memory(&mut self, memory: Memory) -> SinterResult<()> {
        self.ensure_unused(&memory.name, "memory")?;
        self.memories.insert(memory.name.clone(), memory);
        Ok(())
    }

    /// Adds a process. Fails if the name is taken.
    pub fn add_process(&mut self, process: Process) -> SinterResult<()> {
        self.ensure_unused(&process.name, "process")?;
        self.processes.insert(process.name.clone(), process);
        Ok(())
    }

    /// Connects `dst` to be driven by `src`. Both sides must have equal width.
    pub fn connect(&mut self, dst: SigSpec, src: SigSpec) -> SinterResult<()> {
        if dst.width() != src.width() {
            return Err(InternalError::new(format!(
                "width mismatch in module {}: {dst} is {} bits, {src} is {} bits",
                self.name,
                dst.width(),
                src.width()
            )));
        }
        self.check_sig(&dst)?;
        self.check_sig(&src)?;
        self.connections.push(Connection { dst, src });
        Ok(())
    }

    /// Removes a cell and returns it.
    pub fn remove_cell(&mut self, name: &IdString) -> Option<Cell> {
        self.cells.remove(name)
    }

    /// Looks up a wire by name.
    pub fn wire(&self, name: &str) -> Option<&Wire> {
        self.wires.get(name)
    }

    /// Looks up a wire by name for mutation.
    pub fn wire_mut(&mut self, name: &str) -> Option<&mut Wire> {
        self.wires.get_mut(name)
    }

    /// Looks up a cell by name.
    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    /// Looks up a cell by name for mutation.
    pub fn cell_mut(&mut self, name: &str) -> Option<&mut Cell> {
        self.cells.get_mut(name)
    }

    /// Returns the full-width signal of the named wire.
    pub fn sig(&self, name: &str) -> Option<SigSpec> {
        self.wire(name).map(SigSpec::from_wire)
    }

    /// Iterates over all wires in name order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> + '_ {
        self.wires.values()
    }

    /// Iterates over all cells in name order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.values()
    }

    /// Returns the names of all cells.
    pub fn cell_names(&self) -> Vec<IdString> {
        self.cells.keys().cloned().collect()
    }

    /// Returns the direct connections in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Iterates over the memories.
    pub fn memories(&self) -> impl Iterator<Item = &Memory> + '_ {
        self.memories.values()
    }

    /// Iterates over the processes.
    pub fn processes(&self) -> impl Iterator<Item = &Process> + '_ {
        self.processes.values()
    }

    /// Returns the port wires ordered by port position.
    pub fn ports(&self) -> Vec<&Wire> {
        let mut ports: Vec<&Wire> = self.wires.values().filter(|w| w.is_port()).collect();
        ports.sort_by_key(|w| w.port_id);
        ports
    }

    /// Returns the number of wires.
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn check_sig(&self, sig: &SigSpec) -> SinterResult<()> {
        for chunk in sig.chunks() {
            if let SigChunk::Wire {
                wire,
                offset,
                width,
            } = chunk
            {
                let Some(w) = self.wires.get(wire) else {
                    return Err(InternalError::new(format!(
                        "reference to unknown wire {wire} in module {}",
                        self.name
                    )));
                };
                if offset.checked_add(*width).map_or(true, |end| end > w.width) {
                    return Err(InternalError::new(format!(
                        "{width} bits at offset {offset} out of range for wire {wire} of width {}",
                        w.width
                    )));
                }
            }
        }
        Ok(())
    }

    /// Verifies the module's structural invariants.
    ///
    /// Names must match their map keys and be unique across wires, cells,
    /// memories, and processes; every signal must reference existing wire
    /// bits; connections must have equal-width sides.
    pub fn check(&self) -> SinterResult<()> {
        let mut seen = std::collections::BTreeSet::new();
        let names = self
            .wires
            .iter()
            .map(|(k, w)| (k, &w.name))
            .chain(self.cells.iter().map(|(k, c)| (k, &c.name)))
            .chain(self.memories.iter().map(|(k, m)| (k, &m.name)))
            .chain(self.processes.iter().map(|(k, p)| (k, &p.name)));
        for (key, name) in names {
            if key != name {
                return Err(InternalError::new(format!(
                    "entry {key} in module {} is named {name}",
                    self.name
                )));
            }
            if !seen.insert(key) {
                return Err(InternalError::new(format!(
                    "name {key} used twice in module {}",
                    self.name
                )));
            }
        }
        for cell in self.cells.values() {
            for (port, sig) in &cell.connections {
                self.check_sig(sig).map_err(|e| {
                    InternalError::new(format!("cell {} port {port}: {}", cell.name, e.message))
                })?;
            }
        }
        for conn in &self.connections {
            if conn.dst.width() != conn.src.width() {
                return Err(InternalError::new(format!(
                    "width mismatch in module {}: {} vs {}",
                    self.name, conn.dst, conn.src
                )));
            }
            self.check_sig(&conn.dst)?;
            self.check_sig(&conn.src)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_with_wires() -> Module {
        let mut m = Module::new("\\top");
        m.add_wire(Wire::input("\\a", 4, 1)).unwrap();
        m.add_wire(Wire::output("\\y", 4, 2)).unwrap();
        m.add_wire(Wire::new("\\t", 4)).unwrap();
        m
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut m = module_with_wires();
        assert!(m.add_wire(Wire::new("\\a", 1)).is_err());
        assert!(m.add_cell(Cell::new("\\t", "$not")).is_err());
    }

    #[test]
    fn uniquify_skips_taken_names() {
        let mut m = module_with_wires();
        assert_eq!(m.uniquify_name(&IdString::public("b")).as_str(), "\\b");
        assert_eq!(m.uniquify_name(&IdString::public("a")).as_str(), "\\a_1");
        m.add_wire(Wire::new("\\a_1", 1)).unwrap();
        assert_eq!(m.uniquify_name(&IdString::public("a")).as_str(), "\\a_2");
    }

    #[test]
    fn connect_requires_equal_widths() {
        let mut m = module_with_wires();
        let y = m.sig("\\y").unwrap();
        let t = m.sig("\\t").unwrap();
        m.connect(y.clone(), t).unwrap();
        let narrow = SigSpec::wire_range(&IdString::public("a"), 0, 2);
        assert!(m.connect(y, narrow).is_err());
        assert_eq!(m.connections().len(), 1);
    }

    #[test]
    fn cells_must_reference_existing_bits() {
        let mut m = module_with_wires();
        let bad = Cell::new("\\u0", "$not")
            .with_port("\\A", SigSpec::wire_range(&IdString::public("a"), 2, 4));
        assert!(m.add_cell(bad).is_err());
        let missing = Cell::new("\\u1", "$not")
            .with_port("\\A", SigSpec::wire_range(&IdString::public("nope"), 0, 1));
        assert!(m.add_cell(missing).is_err());
        let wrapped = Cell::new("\\u2", "$not")
            .with_port("\\A", SigSpec::wire_range(&IdString::public("a"), u32::MAX, 2));
        assert!(m.add_cell(wrapped).is_err());
    }

    #[test]
    fn remove_cell_frees_name() {
        let mut m = module_with_wires();
        m.add_cell(Cell::new("\\u0", "$not")).unwrap();
        assert!(m.remove_cell(&IdString::public("u0")).is_some());
        assert!(m.cell("\\u0").is_none());
        assert!(!m.has_name(&IdString::public("u0")));
    }

    #[test]
    fn ports_sorted_by_position() {
        let m = module_with_wires();
        let names: Vec<&str> = m.ports().iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["\\a", "\\y"]);
    }

    #[test]
    fn check_passes_on_valid_module() {
        let mut m = module_with_wires();
        let cell = Cell::new("\\u0", "$not")
            .with_port("\\A", m.sig("\\a").unwrap())
            .with_port("\\Y", m.sig("\\t").unwrap());
        m.add_cell(cell).unwrap();
        m.check().unwrap();
    }

    #[test]
    fn check_detects_key_mismatch() {
        let json = r#"{
            "name": "\\m",
            "wires": { "\\a": { "name": "\\b", "width": 1 } }
        }"#;
        let m: Module = serde_json::from_str(json).unwrap();
        assert!(m.check().is_err());
    }
}
