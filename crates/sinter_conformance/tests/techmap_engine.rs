//! Technology mapping against user and built-in libraries.
//!
//! Covers template derivation sharing, name uniqueness across many
//! instances, port width reconciliation, and fixpoint termination.

use std::collections::BTreeSet;

use sinter_common::{Const, IdString, Logic};
use sinter_conformance::{
    and_template, design_of, instances_design, int_param, konst, ModuleBuilder,
};
use sinter_diagnostics::{DiagnosticSink, Severity};
use sinter_ir::{Design, SigBit};
use sinter_synth::techmap::{FAILED_REASON, TECHMAP_FAILED};
use sinter_synth::{Library, ModuleFilter, SynthError, TechmapEngine};

fn and_library() -> Library {
    Library::from_design(design_of([and_template(4)]))
}

fn cell_types(design: &Design) -> Vec<String> {
    design
        .modules()
        .flat_map(|m| m.cells())
        .map(|c| c.cell_type.to_string())
        .collect()
}

#[test]
fn identical_instances_share_one_derivation() {
    let mut design = instances_design(2, 4);
    let mut engine = TechmapEngine::new(and_library());
    let sink = DiagnosticSink::new();
    let stats = engine.run(&mut design, &ModuleFilter::all(), &sink).unwrap();
    assert_eq!(stats.expanded, 2);
    assert_eq!(stats.derivations, 1);
    assert_eq!(stats.sweeps, 2, "one expanding sweep plus one quiet sweep");
    assert_eq!(cell_types(&design), ["$and", "$and"]);
    design.check().unwrap();
}

#[test]
fn derivation_count_is_independent_of_instance_count() {
    for count in [1, 3, 8] {
        let mut design = instances_design(count, 4);
        let mut engine = TechmapEngine::new(and_library());
        let stats = engine
            .run(&mut design, &ModuleFilter::all(), &DiagnosticSink::new())
            .unwrap();
        assert_eq!(stats.expanded, count);
        assert_eq!(stats.derivations, 1, "{count} instances");
    }
}

#[test]
fn engine_reuses_templates_across_runs() {
    let mut engine = TechmapEngine::new(and_library());
    let sink = DiagnosticSink::new();
    let mut first = instances_design(2, 4);
    engine.run(&mut first, &ModuleFilter::all(), &sink).unwrap();
    let mut second = instances_design(3, 4);
    let stats = engine.run(&mut second, &ModuleFilter::all(), &sink).unwrap();
    assert_eq!(stats.expanded, 3);
    assert_eq!(stats.derivations, 0);
}

#[test]
fn library_change_invalidates_templates() {
    let mut engine = TechmapEngine::new(and_library());
    let sink = DiagnosticSink::new();
    engine
        .run(&mut instances_design(1, 4), &ModuleFilter::all(), &sink)
        .unwrap();
    let mut other = and_template(4);
    other.name = IdString::public("B");
    engine.library_mut().add_module(other);
    let stats = engine
        .run(&mut instances_design(1, 4), &ModuleFilter::all(), &sink)
        .unwrap();
    assert_eq!(stats.derivations, 1);
}

#[test]
fn many_instances_never_collide() {
    let mut design = instances_design(6, 4);
    let top = design.module_mut("\\top").unwrap();
    // Occupy the name the first expansion would pick.
    top.add_wire(sinter_ir::Wire::new("\\u0.t", 1)).unwrap();
    let mut engine = TechmapEngine::new(and_library());
    engine
        .run(&mut design, &ModuleFilter::all(), &DiagnosticSink::new())
        .unwrap();
    design.check().unwrap();

    let top = design.module("\\top").unwrap();
    assert_eq!(top.wire("\\u0.t").unwrap().width, 1);
    assert_eq!(top.wire("\\u0.t_1").unwrap().width, 4);
    let gates: BTreeSet<String> = top.cells().map(|c| c.name.to_string()).collect();
    let expected: BTreeSet<String> = (0..6).map(|i| format!("\\u{i}.g")).collect();
    assert_eq!(gates, expected);
}

#[test]
fn mismatched_port_widths_are_reconciled() {
    // 8-bit input into a 4-bit port, 4-bit output into a 6-bit wire.
    let mut b = ModuleBuilder::new("top");
    let a = b.input("a", 8);
    let bb = b.input("b", 4);
    let y = b.output("y", 6);
    b.cell("u0", "\\A", &[("A", &a), ("B", &bb), ("Y", &y)]);
    let mut design = design_of([b.build()]);

    let sink = DiagnosticSink::new();
    TechmapEngine::new(and_library())
        .run(&mut design, &ModuleFilter::all(), &sink)
        .unwrap();
    let warnings: Vec<_> = sink
        .take_all()
        .into_iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|d| d.code.number == 101));

    let top = design.module("\\top").unwrap();
    for conn in top.connections() {
        assert_eq!(conn.dst.width(), conn.src.width());
    }
    let into_a = top
        .connections()
        .iter()
        .find(|c| c.dst == top.sig("\\u0.A").unwrap())
        .unwrap();
    assert_eq!(into_a.src, a.extract(0, 4));
    let into_y = top
        .connections()
        .iter()
        .find(|c| c.dst == y)
        .unwrap();
    let high: Vec<SigBit> = into_y.src.bits().skip(4).collect();
    assert_eq!(high, [SigBit::Const(Logic::Zero), SigBit::Const(Logic::Zero)]);
}

#[test]
fn builtin_mapping_reaches_fixpoint() {
    let mut b = ModuleBuilder::new("top");
    let a = b.input("a", 3);
    let s = b.input("s", 1);
    let y = b.output("y", 3);
    let eq = b.output("eq", 1);
    let t = b.wire("t", 3);
    b.cell("inv", "$not", &[("A", &a), ("Y", &t)])
        .cell_param("inv", "A_WIDTH", int_param(3))
        .cell_param("inv", "Y_WIDTH", int_param(3))
        .cell("sel", "$mux", &[("A", &a), ("B", &t), ("S", &s), ("Y", &y)])
        .cell_param("sel", "WIDTH", int_param(3))
        .cell("cmp", "$eq", &[("A", &t), ("B", &konst(5, 3)), ("Y", &eq)])
        .cell_param("cmp", "A_WIDTH", int_param(3))
        .cell_param("cmp", "B_WIDTH", int_param(3))
        .cell_param("cmp", "Y_WIDTH", int_param(1));
    let mut design = design_of([b.build()]);

    let mut engine = TechmapEngine::new(Library::builtin());
    engine
        .run(&mut design, &ModuleFilter::all(), &DiagnosticSink::new())
        .unwrap();
    design.check().unwrap();
    for ty in cell_types(&design) {
        assert!(!engine.library().contains(&ty), "{ty} left unmapped");
        assert!(ty.starts_with("$_"), "{ty} is not a gate");
    }
}

#[test]
fn unsupported_template_leaves_instance() {
    let mut b = ModuleBuilder::new("bad");
    b.input("A", 4);
    b.input("B", 4);
    b.output("Y", 4);
    b.cell("marker", TECHMAP_FAILED, &[]);
    let mut bad = b.build();
    bad.cell_mut("\\marker")
        .unwrap()
        .attributes
        .insert(IdString::new(FAILED_REASON), Const::from_string("no gate for this"));
    let mut library = Library::from_design(design_of([bad]));

    let mut b = ModuleBuilder::new("top");
    let a = b.input("a", 4);
    let bb = b.input("b", 4);
    let y = b.output("y", 4);
    b.cell("u0", "\\bad", &[("A", &a), ("B", &bb), ("Y", &y)]);
    let mut design = design_of([b.build()]);

    library.add_module(and_template(4));
    let sink = DiagnosticSink::new();
    let stats = TechmapEngine::new(library)
        .run(&mut design, &ModuleFilter::all(), &sink)
        .unwrap();
    assert_eq!(stats.unsupported, 1);
    assert_eq!(stats.expanded, 0);
    assert_eq!(cell_types(&design), ["\\bad"]);
    let note = sink
        .take_all()
        .into_iter()
        .find(|d| d.code.number == 203)
        .unwrap();
    assert_eq!(note.notes, ["no gate for this"]);
}

#[test]
fn oversized_pmux_is_left_unmapped() {
    let mut b = ModuleBuilder::new("top");
    let a = b.input("a", 2);
    let bb = b.input("b", 4);
    let s = b.input("s", 2);
    let y = b.output("y", 2);
    b.cell("sel", "$pmux", &[("A", &a), ("B", &bb), ("S", &s), ("Y", &y)])
        .cell_param("sel", "WIDTH", int_param(70000))
        .cell_param("sel", "S_WIDTH", int_param(70000));
    let mut design = design_of([b.build()]);

    let sink = DiagnosticSink::new();
    let stats = TechmapEngine::new(Library::builtin())
        .run(&mut design, &ModuleFilter::all(), &sink)
        .unwrap();
    assert_eq!(stats.unsupported, 1);
    assert_eq!(cell_types(&design), ["$pmux"]);
}

#[test]
fn self_instantiating_template_hits_sweep_limit() {
    let mut b = ModuleBuilder::new("L");
    let a = b.input("A", 1);
    let y = b.output("Y", 1);
    b.cell("again", "\\L", &[("A", &a), ("Y", &y)]);
    let library = Library::from_design(design_of([b.build()]));

    let mut b = ModuleBuilder::new("top");
    let a = b.input("a", 1);
    let y = b.output("y", 1);
    b.cell("u0", "\\L", &[("A", &a), ("Y", &y)]);
    let mut design = design_of([b.build()]);

    let err = TechmapEngine::new(library)
        .with_max_sweeps(Some(4))
        .run(&mut design, &ModuleFilter::all(), &DiagnosticSink::new())
        .unwrap_err();
    assert!(matches!(err, SynthError::NoConvergence { sweeps: 4 }));
}

#[test]
fn undeclared_parameter_is_fatal() {
    let mut design = instances_design(1, 4);
    design
        .module_mut("\\top")
        .unwrap()
        .cell_mut("\\u0")
        .unwrap()
        .parameters
        .insert(IdString::public("DEPTH"), int_param(2));
    let err = TechmapEngine::new(and_library())
        .run(&mut design, &ModuleFilter::all(), &DiagnosticSink::new())
        .unwrap_err();
    assert!(matches!(err, SynthError::UnknownParameter { .. }));
}
