//! State register detection through the pass script interface.
//!
//! Each test builds a small controller, runs `fsm_detect`, and checks which
//! wires carry the `\fsm_encoding` tag.

use sinter_common::IdString;
use sinter_conformance::{
    design_of, fsm_design, konst, make_config, run_script, run_script_with_config, ModuleBuilder,
};
use sinter_ir::{Design, SigMap};
use sinter_synth::fsm_detect::FSM_ENCODING;

fn encoding_of(design: &Design, wire: &str) -> Option<String> {
    design
        .module("\\ctrl")?
        .wire(wire)?
        .attributes
        .get(FSM_ENCODING)?
        .as_string()
}

#[test]
fn internal_state_register_is_tagged() {
    let result = run_script(fsm_design(false), "fsm_detect");
    assert!(result.error.is_none());
    assert_eq!(encoding_of(&result.design, "\\state").as_deref(), Some("auto"));
    assert_eq!(
        result.messages_with_code(205),
        ["Found FSM state register \\state in module \\ctrl."]
    );
}

#[test]
fn only_the_register_is_tagged() {
    let result = run_script(fsm_design(false), "fsm_detect");
    let module = result.design.module("\\ctrl").unwrap();
    let tagged: Vec<&IdString> = module
        .wires()
        .filter(|w| w.attributes.contains_key(FSM_ENCODING))
        .map(|w| &w.name)
        .collect();
    assert_eq!(tagged, [&IdString::public("state")]);
}

#[test]
fn output_port_register_is_not_tagged() {
    let result = run_script(fsm_design(true), "fsm_detect");
    assert!(result.error.is_none());
    assert_eq!(encoding_of(&result.design, "\\state"), None);
    assert!(result.messages_with_code(205).is_empty());
}

#[test]
fn detection_is_idempotent() {
    let once = run_script(fsm_design(false), "fsm_detect");
    let twice = run_script(fsm_design(false), "fsm_detect; fsm_detect");
    assert_eq!(
        sinter_ir::io::design_to_string(&once.design),
        sinter_ir::io::design_to_string(&twice.design)
    );
    assert_eq!(twice.messages_with_code(205).len(), 1);
}

#[test]
fn configured_encoding_is_written() {
    let config = make_config("[fsm_detect]\nencoding = \"one-hot\"\n");
    let result = run_script_with_config(fsm_design(false), "fsm_detect", &config);
    assert_eq!(encoding_of(&result.design, "\\state").as_deref(), Some("one-hot"));
}

/// Variant of the controller where `D` selects between `Q` and a primary
/// input directly.
fn input_leaf_design() -> Design {
    let mut b = ModuleBuilder::new("ctrl");
    let clk = b.input("clk", 1);
    let step = b.input("step", 1);
    let load = b.input("load", 4);
    let idle = b.output("idle", 1);
    let state = b.wire("state", 4);
    let next = b.wire("next", 4);
    b.cell("ff", "$dff", &[("CLK", &clk), ("D", &next), ("Q", &state)])
        .cell(
            "sel_next",
            "$mux",
            &[("A", &state), ("B", &load), ("S", &step), ("Y", &next)],
        )
        .cell(
            "is_idle",
            "$eq",
            &[("A", &state), ("B", &konst(0, 4)), ("Y", &idle)],
        );
    design_of([b.build()])
}

#[test]
fn primary_input_leaf_is_not_tagged() {
    let result = run_script(input_leaf_design(), "fsm_detect");
    assert_eq!(encoding_of(&result.design, "\\state"), None);
}

#[test]
fn arithmetic_consumer_disqualifies() {
    let mut design = fsm_design(false);
    let module = design.module_mut("\\ctrl").unwrap();
    module
        .add_wire(sinter_ir::Wire::output("\\plus", 4, 10))
        .unwrap();
    let add = sinter_ir::Cell::new("\\inc", "$add")
        .with_port("\\A", module.sig("\\state").unwrap())
        .with_port("\\B", konst(1, 4))
        .with_port("\\Y", module.sig("\\plus").unwrap());
    module.add_cell(add).unwrap();
    let result = run_script(design, "fsm_detect");
    assert_eq!(encoding_of(&result.design, "\\state"), None);
}

#[test]
fn register_behind_an_alias_is_found() {
    // Q drives an alias wire. Only the representative of the pair is tagged.
    let mut design = fsm_design(false);
    let module = design.module_mut("\\ctrl").unwrap();
    module.add_wire(sinter_ir::Wire::new("\\q_alias", 4)).unwrap();
    let alias = module.sig("\\q_alias").unwrap();
    let state = module.sig("\\state").unwrap();
    module
        .cell_mut("\\ff")
        .unwrap()
        .connections
        .insert(IdString::public("Q"), alias.clone());
    module.connect(state, alias).unwrap();
    let result = run_script(design, "fsm_detect");
    let module = result.design.module("\\ctrl").unwrap();
    let tagged: Vec<&IdString> = module
        .wires()
        .filter(|w| w.attributes.contains_key(FSM_ENCODING))
        .map(|w| &w.name)
        .collect();
    assert_eq!(tagged, [&IdString::public("state")]);
    assert_eq!(result.messages_with_code(205).len(), 1);
}

#[test]
fn module_filter_restricts_detection() {
    let result = run_script(fsm_design(false), "fsm_detect other");
    assert_eq!(encoding_of(&result.design, "\\state"), None);
    let result = run_script(fsm_design(false), "fsm_detect ctrl");
    assert!(encoding_of(&result.design, "\\state").is_some());
}

#[test]
fn resolution_is_idempotent() {
    let design = fsm_design(false);
    let module = design.module("\\ctrl").unwrap();
    let map = SigMap::from_module(module);
    for wire in module.wires() {
        let sig = module.sig(wire.name.as_str()).unwrap();
        let once = map.resolve(&sig);
        assert_eq!(map.resolve(&once), once, "{}", wire.name);
    }
}
