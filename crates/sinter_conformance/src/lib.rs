//! Conformance test helpers for sinter.
//!
//! Provides a small netlist builder, canned designs exercised by the
//! integration tests, and a pipeline function that runs a pass script and
//! returns structured results for assertion.

#![warn(missing_docs)]

use sinter_common::{Const, IdString};
use sinter_config::SinterConfig;
use sinter_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use sinter_ir::{Cell, Design, Module, SigSpec, Wire};
use sinter_synth::{PassContext, PassRegistry, SynthError};

/// Result of running a pass script over a design.
pub struct PipelineResult {
    /// The design after the script ran (partially transformed on failure).
    pub design: Design,
    /// All diagnostics emitted during the run.
    pub diagnostics: Vec<Diagnostic>,
    /// The fatal error that stopped the script, if any.
    pub error: Option<SynthError>,
    /// Number of error-severity diagnostics.
    pub error_count: usize,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

impl PipelineResult {
    /// Messages of all diagnostics carrying `number` as their code number.
    pub fn messages_with_code(&self, number: u16) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.code.number == number)
            .map(|d| d.message.as_str())
            .collect()
    }
}

/// Parses a `sinter.toml` snippet.
pub fn make_config(toml: &str) -> SinterConfig {
    sinter_config::load_config_from_str(toml).unwrap()
}

/// Runs `script` over `design` with the default configuration.
pub fn run_script(design: Design, script: &str) -> PipelineResult {
    run_script_with_config(design, script, &SinterConfig::default())
}

/// Runs `script` over `design` with an explicit configuration.
pub fn run_script_with_config(
    mut design: Design,
    script: &str,
    config: &SinterConfig,
) -> PipelineResult {
    let sink = DiagnosticSink::new();
    let ctx = PassContext::new(&sink, config);
    let error = PassRegistry::with_builtin_passes()
        .run_script(script, &mut design, &ctx)
        .err();
    let diagnostics = sink.take_all();
    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    PipelineResult {
        error_count: count(Severity::Error),
        warning_count: count(Severity::Warning),
        design,
        diagnostics,
        error,
    }
}

/// Builds a module one wire or cell at a time, numbering ports in the
/// order they are declared.
pub struct ModuleBuilder {
    module: Module,
    next_port: u32,
}

impl ModuleBuilder {
    /// Starts a module named `name` (a bare name gets the `\` prefix).
    pub fn new(name: &str) -> Self {
        Self {
            module: Module::new(public(name)),
            next_port: 1,
        }
    }

    /// Declares an input port and returns its signal.
    pub fn input(&mut self, name: &str, width: u32) -> SigSpec {
        let wire = Wire::input(public(name), width, self.next_port);
        self.next_port += 1;
        self.add(wire)
    }

    /// Declares an output port and returns its signal.
    pub fn output(&mut self, name: &str, width: u32) -> SigSpec {
        let wire = Wire::output(public(name), width, self.next_port);
        self.next_port += 1;
        self.add(wire)
    }

    /// Declares an internal wire and returns its signal.
    pub fn wire(&mut self, name: &str, width: u32) -> SigSpec {
        self.add(Wire::new(public(name), width))
    }

    fn add(&mut self, wire: Wire) -> SigSpec {
        let sig = SigSpec::from_wire(&wire);
        self.module.add_wire(wire).unwrap();
        sig
    }

    /// Adds a cell with the given port bindings.
    pub fn cell(&mut self, name: &str, cell_type: &str, ports: &[(&str, &SigSpec)]) -> &mut Self {
        let mut cell = Cell::new(public(name), cell_type);
        for (port, sig) in ports {
            cell = cell.with_port(public(port), (*sig).clone());
        }
        self.module.add_cell(cell).unwrap();
        self
    }

    /// Sets a parameter on an existing cell.
    pub fn cell_param(&mut self, cell: &str, name: &str, value: Const) -> &mut Self {
        self.module
            .cell_mut(public(cell).as_str())
            .unwrap()
            .parameters
            .insert(public(name), value);
        self
    }

    /// Declares a module parameter with its default value.
    pub fn param(&mut self, name: &str, default: Const) -> &mut Self {
        self.module.parameters.insert(public(name), default);
        self
    }

    /// Adds a `dst = src` connection.
    pub fn connect(&mut self, dst: &SigSpec, src: &SigSpec) -> &mut Self {
        self.module.connect(dst.clone(), src.clone()).unwrap();
        self
    }

    /// Finishes the module.
    pub fn build(self) -> Module {
        self.module
    }
}

/// `\name` for a bare `name`; names already carrying a sigil pass through.
pub fn public(name: &str) -> IdString {
    if name.starts_with('\\') || name.starts_with('$') {
        IdString::new(name)
    } else {
        IdString::public(name)
    }
}

/// A constant signal.
pub fn konst(value: u64, width: u32) -> SigSpec {
    SigSpec::from_const(Const::from_u64(value, width))
}

/// A 32-bit integer parameter value.
pub fn int_param(value: u32) -> Const {
    Const::from_u64(u64::from(value), 32)
}

/// Wraps modules into a design.
pub fn design_of(modules: impl IntoIterator<Item = Module>) -> Design {
    let mut design = Design::new();
    for module in modules {
        design.add_module(module).unwrap();
    }
    design
}

/// A 4-bit state machine in module `\ctrl`.
///
/// `\state` is written by a `$dff` whose `D` is a `$mux` between `\state`
/// and `\jump`. `\jump` selects one of two constants by the primary input
/// `\go`. Two `$eq` cells decode `\state` against constants. With
/// `state_is_port` the register is also an output of the module.
pub fn fsm_design(state_is_port: bool) -> Design {
    let mut b = ModuleBuilder::new("ctrl");
    let clk = b.input("clk", 1);
    let go = b.input("go", 1);
    let step = b.input("step", 1);
    let idle = b.output("idle", 1);
    let done = b.output("done", 1);
    let state = if state_is_port {
        b.output("state", 4)
    } else {
        b.wire("state", 4)
    };
    let next = b.wire("next", 4);
    let jump = b.wire("jump", 4);
    b.cell("ff", "$dff", &[("CLK", &clk), ("D", &next), ("Q", &state)])
        .cell(
            "sel_next",
            "$mux",
            &[("A", &state), ("B", &jump), ("S", &step), ("Y", &next)],
        )
        .cell(
            "sel_jump",
            "$mux",
            &[("A", &konst(3, 4)), ("B", &konst(9, 4)), ("S", &go), ("Y", &jump)],
        )
        .cell(
            "is_idle",
            "$eq",
            &[("A", &state), ("B", &konst(0, 4)), ("Y", &idle)],
        )
        .cell(
            "is_done",
            "$eq",
            &[("A", &konst(9, 4)), ("B", &state), ("Y", &done)],
        );
    b.cell_param("ff", "WIDTH", int_param(4))
        .cell_param("ff", "CLK_POLARITY", int_param(1))
        .cell_param("sel_next", "WIDTH", int_param(4))
        .cell_param("sel_jump", "WIDTH", int_param(4));
    for cmp in ["is_idle", "is_done"] {
        b.cell_param(cmp, "A_WIDTH", int_param(4))
            .cell_param(cmp, "B_WIDTH", int_param(4))
            .cell_param(cmp, "Y_WIDTH", int_param(1));
    }
    design_of([b.build()])
}

/// Library module `\A`: a `WIDTH`-parameterized two-input AND built from one
/// `$and` cell.
pub fn and_template(width: u32) -> Module {
    let mut b = ModuleBuilder::new("A");
    let a = b.input("A", width);
    let bb = b.input("B", width);
    let y = b.output("Y", width);
    let t = b.wire("t", width);
    b.param("WIDTH", int_param(width))
        .cell("g", "$and", &[("A", &a), ("B", &bb), ("Y", &t)])
        .connect(&y, &t);
    b.build()
}

/// Module `\top` with `count` instances `\u0`, `\u1`, ... of `\A`, all with
/// `WIDTH = width`, each driving its own output.
pub fn instances_design(count: usize, width: u32) -> Design {
    let mut b = ModuleBuilder::new("top");
    let a = b.input("a", width);
    let bb = b.input("b", width);
    for i in 0..count {
        let y = b.output(&format!("y{i}"), width);
        let name = format!("u{i}");
        b.cell(&name, "\\A", &[("A", &a), ("B", &bb), ("Y", &y)])
            .cell_param(&name, "WIDTH", int_param(width));
    }
    design_of([b.build()])
}
