//! Port roles and classification of builtin cell types.
//!
//! Every type-dependent decision in the analysis passes goes through this
//! table: which ports a primitive reads, which it drives, and what kind of
//! operation it performs. Types not listed here (including user modules) are
//! unknown; callers treat all their ports as consumers.

use std::collections::HashMap;
use std::sync::OnceLock;

/// The broad behavior of a builtin cell type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellClass {
    /// Arithmetic, bitwise, reduction, and logic operators.
    Combinational,
    /// Equality comparisons usable as state decoders.
    Comparison,
    /// Multiplexers.
    Selection,
    /// Clocked storage elements.
    Storage,
    /// Memory read and write ports.
    Memory,
}

/// Port roles of a builtin cell type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellInfo {
    /// The type name.
    pub name: &'static str,
    /// Ports read by the cell.
    pub inputs: &'static [&'static str],
    /// Ports driven by the cell.
    pub outputs: &'static [&'static str],
    /// The classification.
    pub class: CellClass,
}

impl CellInfo {
    /// Returns `true` if `port` is driven by the cell.
    pub fn is_output(&self, port: &str) -> bool {
        self.outputs.contains(&port)
    }

    /// Returns `true` if `port` is read by the cell.
    pub fn is_input(&self, port: &str) -> bool {
        self.inputs.contains(&port)
    }
}

const UNARY: &[&str] = &["\\A"];
const BINARY: &[&str] = &["\\A", "\\B"];
const SELECT: &[&str] = &["\\A", "\\B", "\\S"];
const Y: &[&str] = &["\\Y"];

const fn info(
    name: &'static str,
    inputs: &'static [&'static str],
    outputs: &'static [&'static str],
    class: CellClass,
) -> CellInfo {
    CellInfo {
        name,
        inputs,
        outputs,
        class,
    }
}

use CellClass::*;

static CELL_TYPES: &[CellInfo] = &[
    info("$not", UNARY, Y, Combinational),
    info("$pos", UNARY, Y, Combinational),
    info("$neg", UNARY, Y, Combinational),
    info("$reduce_and", UNARY, Y, Combinational),
    info("$reduce_or", UNARY, Y, Combinational),
    info("$reduce_xor", UNARY, Y, Combinational),
    info("$reduce_xnor", UNARY, Y, Combinational),
    info("$reduce_bool", UNARY, Y, Combinational),
    info("$logic_not", UNARY, Y, Combinational),
    info("$and", BINARY, Y, Combinational),
    info("$or", BINARY, Y, Combinational),
    info("$xor", BINARY, Y, Combinational),
    info("$xnor", BINARY, Y, Combinational),
    info("$logic_and", BINARY, Y, Combinational),
    info("$logic_or", BINARY, Y, Combinational),
    info("$shl", BINARY, Y, Combinational),
    info("$shr", BINARY, Y, Combinational),
    info("$lt", BINARY, Y, Combinational),
    info("$le", BINARY, Y, Combinational),
    info("$ge", BINARY, Y, Combinational),
    info("$gt", BINARY, Y, Combinational),
    info("$add", BINARY, Y, Combinational),
    info("$sub", BINARY, Y, Combinational),
    info("$mul", BINARY, Y, Combinational),
    info("$eq", BINARY, Y, Comparison),
    info("$ne", BINARY, Y, Comparison),
    info("$eqx", BINARY, Y, Comparison),
    info("$nex", BINARY, Y, Comparison),
    info("$mux", SELECT, Y, Selection),
    info("$pmux", SELECT, Y, Selection),
    info("$safe_pmux", SELECT, Y, Selection),
    info("$dff", &["\\CLK", "\\D"], &["\\Q"], Storage),
    info("$adff", &["\\CLK", "\\ARST", "\\D"], &["\\Q"], Storage),
    info("$memrd", &["\\CLK", "\\EN", "\\ADDR"], &["\\DATA"], Memory),
    info("$memwr", &["\\CLK", "\\EN", "\\ADDR", "\\DATA"], &[], Memory),
    info("$_NOT_", &["\\A"], Y, Combinational),
    info("$_AND_", &["\\A", "\\B"], Y, Combinational),
    info("$_OR_", &["\\A", "\\B"], Y, Combinational),
    info("$_XOR_", &["\\A", "\\B"], Y, Combinational),
    info("$_MUX_", &["\\A", "\\B", "\\S"], Y, Selection),
    info("$_DFF_P_", &["\\C", "\\D"], &["\\Q"], Storage),
    info("$_DFF_N_", &["\\C", "\\D"], &["\\Q"], Storage),
];

fn table() -> &'static HashMap<&'static str, &'static CellInfo> {
    static TABLE: OnceLock<HashMap<&'static str, &'static CellInfo>> = OnceLock::new();
    TABLE.get_or_init(|| CELL_TYPES.iter().map(|info| (info.name, info)).collect())
}

/// Looks up the port roles of a builtin cell type.
pub fn lookup(cell_type: &str) -> Option<&'static CellInfo> {
    table().get(cell_type).copied()
}

/// Returns the class of a builtin type, or `None` for unknown types.
pub fn class_of(cell_type: &str) -> Option<CellClass> {
    lookup(cell_type).map(|info| info.class)
}

/// Returns `true` if the type is a builtin primitive known to the table.
pub fn is_known(cell_type: &str) -> bool {
    lookup(cell_type).is_some()
}

/// Iterates over every known type.
pub fn all() -> impl Iterator<Item = &'static CellInfo> {
    CELL_TYPES.iter()
}
