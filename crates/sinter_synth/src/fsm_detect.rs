//! Finite-state-machine state register detection.
//!
//! A multi-bit internal wire is a state register when a flip-flop drives it
//! from a next-state signal built only from multiplexers whose leaves are
//! the register itself or constants, and when everything else reading it
//! compares it against constants. Detected wires get the `\fsm_encoding`
//! attribute; later FSM passes key off that tag. The pass changes nothing
//! else.

use crate::codes;
use crate::error::SynthResult;
use crate::pass::{ModuleFilter, Pass, PassContext};
use sinter_common::{Const, IdString};
use sinter_diagnostics::{Diagnostic, Location};
use sinter_ir::{celltypes, CellClass, Design, Module, SigSpec, SignalIndex};
use std::collections::BTreeSet;

/// Attribute marking a detected state register.
pub const FSM_ENCODING: &str = "\\fsm_encoding";

/// The outcome of validating a next-state selection tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every path ends at the register or a constant; holds the
    /// multiplexers that were visited.
    Accepted(BTreeSet<IdString>),
    /// The tree disqualifies the candidate.
    Rejected(String),
}

/// Why a candidate was dropped.
#[derive(Debug)]
struct Rejection(String);

fn reject<T>(reason: impl Into<String>) -> Result<T, Rejection> {
    Err(Rejection(reason.into()))
}

/// Structural queries over one module, built once per module.
pub struct StateRegisterScan<'a> {
    module: &'a Module,
    index: SignalIndex,
}

impl<'a> StateRegisterScan<'a> {
    /// Indexes `module`.
    pub fn new(module: &'a Module) -> Self {
        Self {
            module,
            index: SignalIndex::build(module),
        }
    }

    fn port_sig(&self, cell: &IdString, port: &str) -> SigSpec {
        self.module
            .cell(cell.as_str())
            .and_then(|c| c.port(port))
            .map(|sig| self.index.resolve(sig))
            .unwrap_or_default()
    }

    /// Returns the names of all wires that qualify as state registers, in
    /// name order. Wires already carrying the tag are skipped.
    pub fn state_registers(&self) -> Vec<IdString> {
        self.module
            .wires()
            .filter(|wire| self.is_state_register(&wire.name))
            .map(|wire| wire.name.clone())
            .collect()
    }

    /// Checks a single wire.
    pub fn is_state_register(&self, wire_name: &IdString) -> bool {
        let Some(wire) = self.module.wire(wire_name.as_str()) else {
            return false;
        };
        if wire.attributes.contains_key(FSM_ENCODING) || wire.width <= 1 {
            return false;
        }
        let raw = SigSpec::from_wire(wire);
        let state = self.index.resolve(&raw);
        if self.index.is_port_exposed(&state) {
            return false;
        }

        for driver in self.index.drivers(&state) {
            let Some(cell) = self.module.cell(driver.cell.as_str()) else {
                continue;
            };
            if celltypes::class_of(cell.cell_type.as_str()) != Some(CellClass::Storage)
                || driver.port.as_str() != "\\Q"
            {
                continue;
            }
            if self.port_sig(&cell.name, "\\Q") != raw {
                continue;
            }
            let next = self.port_sig(&cell.name, "\\D");
            let Verdict::Accepted(tree) = self.selection_tree(&state, &next) else {
                continue;
            };
            match self.check_users(&state, &tree) {
                Ok(()) => return true,
                Err(Rejection(reason)) => {
                    tracing::debug!(wire = %wire.name, %reason, "not a state register");
                }
            }
        }
        false
    }

    /// Validates that `next` reaches `state` only through multiplexers whose
    /// leaves are `state` or constants.
    pub fn selection_tree(&self, state: &SigSpec, next: &SigSpec) -> Verdict {
        let mut cells = BTreeSet::new();
        match self.walk(state, next, &[], &mut cells) {
            Ok(()) => Verdict::Accepted(cells),
            Err(Rejection(reason)) => Verdict::Rejected(reason),
        }
    }

    fn walk(
        &self,
        state: &SigSpec,
        sig: &SigSpec,
        ancestors: &[SigSpec],
        cells: &mut BTreeSet<IdString>,
    ) -> Result<(), Rejection> {
        if self.index.is_port_exposed(sig) {
            return reject(format!("{sig} is visible at a module port"));
        }
        if sig.is_fully_const() || sig == state {
            return Ok(());
        }
        if ancestors.contains(sig) {
            return reject(format!("{sig} feeds back into its own selection tree"));
        }
        let drivers = self.index.drivers(sig);
        if drivers.is_empty() {
            return reject(format!("{sig} is undriven"));
        }

        let mut path = ancestors.to_vec();
        path.push(sig.clone());
        for driver in drivers {
            let Some(cell) = self.module.cell(driver.cell.as_str()) else {
                return reject(format!("driver {} is missing", driver.cell));
            };
            if celltypes::class_of(cell.cell_type.as_str()) != Some(CellClass::Selection)
                || driver.port.as_str() != "\\Y"
            {
                return reject(format!("{sig} is driven by {} ({})", cell.name, cell.cell_type));
            }
            let a = self.port_sig(&cell.name, "\\A");
            let b = self.port_sig(&cell.name, "\\B");
            self.walk(state, &a, &path, cells)?;
            let step = a.width().max(1);
            let mut offset = 0;
            while offset < b.width() {
                let width = step.min(b.width() - offset);
                self.walk(state, &b.extract(offset, width), &path, cells)?;
                offset += step;
            }
            cells.insert(cell.name.clone());
        }
        Ok(())
    }

    /// Every reader of `state` outside the selection tree must compare it
    /// against a constant.
    fn check_users(&self, state: &SigSpec, tree: &BTreeSet<IdString>) -> Result<(), Rejection> {
        for user in self.index.users(state) {
            if tree.contains(&user.cell) {
                continue;
            }
            let Some(cell) = self.module.cell(user.cell.as_str()) else {
                return reject(format!("user {} is missing", user.cell));
            };
            if celltypes::class_of(cell.cell_type.as_str()) != Some(CellClass::Comparison) {
                return reject(format!("read by {} ({})", cell.name, cell.cell_type));
            }
            let ports: Vec<&str> = cell.connections.keys().map(IdString::as_str).collect();
            if ports != ["\\A", "\\B", "\\Y"] {
                return reject(format!("comparison {} has unexpected ports", cell.name));
            }
            let a = self.port_sig(&cell.name, "\\A");
            let b = self.port_sig(&cell.name, "\\B");
            let decodes = (a == *state && b.is_fully_const()) || (b == *state && a.is_fully_const());
            if !decodes {
                return reject(format!("{} does not compare against a constant", cell.name));
            }
        }
        Ok(())
    }
}

/// Tags every state register of `module` with `encoding`, returning the
/// tagged wire names.
pub fn tag_state_registers(module: &mut Module, encoding: &str) -> Vec<IdString> {
    let found = StateRegisterScan::new(module).state_registers();
    let value = Const::from_string(encoding);
    for name in &found {
        if let Some(wire) = module.wire_mut(name.as_str()) {
            wire.attributes
                .insert(IdString::new(FSM_ENCODING), value.clone());
        }
    }
    found
}

/// The `fsm_detect` pass.
pub struct FsmDetectPass;

impl Pass for FsmDetectPass {
    fn name(&self) -> &'static str {
        "fsm_detect"
    }

    fn help(&self) -> &'static str {
        "fsm_detect [module...]: tag FSM state registers with \\fsm_encoding"
    }

    fn execute(
        &self,
        args: &[String],
        design: &mut Design,
        ctx: &PassContext<'_>,
    ) -> SynthResult<()> {
        ctx.header("FSM_DETECT pass (finding FSMs in design).");
        let filter = ModuleFilter::from_args(self.name(), args)?;
        let encoding = ctx.config.fsm_detect.encoding.as_str();
        for module in design.modules_mut() {
            if !filter.selects(&module.name) {
                continue;
            }
            for wire in tag_state_registers(module, encoding) {
                ctx.sink.emit(
                    Diagnostic::note(
                        codes::FSM_FOUND,
                        format!("Found FSM state register {wire} in module {}.", module.name),
                    )
                    .at(Location::object(&module.name, &wire)),
                );
            }
        }
        Ok(())
    }
}
