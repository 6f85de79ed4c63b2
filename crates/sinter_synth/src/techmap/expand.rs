//! Inlining a template in place of a cell instance.

use crate::codes;
use crate::error::{SynthError, SynthResult};
use sinter_common::IdString;
use sinter_diagnostics::{Diagnostic, DiagnosticSink, Location};
use sinter_ir::{Module, SigSpec};
use std::collections::HashMap;

/// Replaces cell `cell_name` of `module` with the contents of `template`.
///
/// Template wires and cells are copied under `<cell>.<name>` (made unique
/// against existing names), port wires become internal, and every bound
/// port of the instance is connected to its copied port wire. The instance
/// is removed on success.
///
/// Nothing is modified when the template is rejected (memories, processes,
/// or a port the template does not declare).
pub(crate) fn expand_cell(
    module: &mut Module,
    cell_name: &IdString,
    template: &Module,
    sink: &DiagnosticSink,
) -> SynthResult<()> {
    let Some(cell) = module.cell(cell_name.as_str()).cloned() else {
        return Err(sinter_common::InternalError::new(format!(
            "cell {cell_name} vanished from module {}",
            module.name
        ))
        .into());
    };

    if template.memories().next().is_some() {
        return Err(SynthError::TemplateHasMemories {
            template: template.name.clone(),
        });
    }
    if template.processes().next().is_some() {
        return Err(SynthError::TemplateHasProcesses {
            template: template.name.clone(),
        });
    }
    for port in cell.connections.keys() {
        if !template.wire(port.as_str()).is_some_and(|w| w.is_port()) {
            return Err(SynthError::MissingTemplatePort {
                template: template.name.clone(),
                cell: cell.name.clone(),
                port: port.clone(),
            });
        }
    }

    sink.emit(
        Diagnostic::note(
            codes::CELL_MAPPED,
            format!("Mapping `{}.{}' using `{}'.", module.name, cell.name, template.name),
        )
        .at(Location::object(&module.name, &cell.name)),
    );

    let mut renames: HashMap<IdString, IdString> = HashMap::new();
    for wire in template.wires() {
        let mut copy = wire.clone();
        copy.name = module.uniquify_name(&wire.name.with_prefix(&cell.name));
        copy.demote_to_internal();
        renames.insert(wire.name.clone(), copy.name.clone());
        module.add_wire(copy)?;
    }
    let rename = |id: &IdString| renames.get(id).cloned().unwrap_or_else(|| id.clone());

    for tpl_cell in template.cells() {
        let mut copy = tpl_cell.clone();
        copy.name = module.uniquify_name(&tpl_cell.name.with_prefix(&cell.name));
        copy.cell_type = tpl_cell.cell_type.unescape_reserved();
        for sig in copy.connections.values_mut() {
            *sig = sig.rename_wires(rename);
        }
        module.add_cell(copy)?;
    }

    for conn in template.connections() {
        module.connect(conn.dst.rename_wires(rename), conn.src.rename_wires(rename))?;
    }

    for (port, external) in &cell.connections {
        let Some(port_wire) = template.wire(port.as_str()) else {
            continue;
        };
        let inner = SigSpec::wire_range(&rename(&port_wire.name), 0, port_wire.width);
        let (dst, mut src) = if port_wire.port_output {
            (external.clone(), inner)
        } else {
            (inner, external.clone())
        };
        if src.width() != dst.width() {
            let action = if src.width() > dst.width() {
                "truncating"
            } else {
                "zero-extending"
            };
            sink.emit(
                Diagnostic::warning(
                    codes::WIDTH_MISMATCH,
                    format!(
                        "port {port} of cell {} connects {} bits to {} bits, {action} the driver",
                        cell.name,
                        src.width(),
                        dst.width()
                    ),
                )
                .at(Location::object(&module.name, &cell.name)),
            );
            src.truncate(dst.width());
            src.zero_extend(dst.width());
        }
        module.connect(dst, src)?;
    }

    module.remove_cell(&cell.name);
    tracing::debug!(module = %module.name, cell = %cell.name, template = %template.name, "expanded cell");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinter_common::Logic;
    use sinter_diagnostics::Severity;
    use sinter_ir::{Cell, Memory, SigBit, SigMap, Wire};

    /// `\inv`: Y = ~A through one gate, plus an internal wire.
    fn inverter_template(width: u32) -> Module {
        let mut m = Module::new("\\inv");
        m.add_wire(Wire::input("\\A", width, 1)).unwrap();
        m.add_wire(Wire::output("\\Y", width, 2)).unwrap();
        m.add_wire(Wire::new("\\t", width)).unwrap();
        let gate = Cell::new("\\g", "\\$not")
            .with_port("\\A", m.sig("\\A").unwrap())
            .with_port("\\Y", m.sig("\\t").unwrap());
        m.add_cell(gate).unwrap();
        m.connect(m.sig("\\Y").unwrap(), m.sig("\\t").unwrap())
            .unwrap();
        m
    }

    fn host(in_width: u32, out_width: u32) -> Module {
        let mut m = Module::new("\\top");
        m.add_wire(Wire::input("\\a", in_width, 1)).unwrap();
        m.add_wire(Wire::output("\\y", out_width, 2)).unwrap();
        let cell = Cell::new("\\u0", "\\inv")
            .with_port("\\A", m.sig("\\a").unwrap())
            .with_port("\\Y", m.sig("\\y").unwrap());
        m.add_cell(cell).unwrap();
        m
    }

    #[test]
    fn inlines_with_prefix() {
        let mut m = host(4, 4);
        let sink = DiagnosticSink::new();
        expand_cell(&mut m, &IdString::public("u0"), &inverter_template(4), &sink).unwrap();
        assert!(m.cell("\\u0").is_none());
        let gate = m.cell("\\u0.g").unwrap();
        assert_eq!(gate.cell_type.as_str(), "$not");
        for name in ["\\u0.A", "\\u0.Y", "\\u0.t"] {
            assert!(!m.wire(name).unwrap().is_port(), "{name} still a port");
        }
        m.check().unwrap();
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn outputs_drive_external_signal() {
        let mut m = host(4, 4);
        let sink = DiagnosticSink::new();
        expand_cell(&mut m, &IdString::public("u0"), &inverter_template(4), &sink).unwrap();
        let map = SigMap::from_module(&m);
        assert_eq!(
            map.resolve(&m.sig("\\y").unwrap()),
            map.resolve(&m.sig("\\u0.t").unwrap())
        );
        assert_eq!(
            map.resolve(&m.sig("\\u0.A").unwrap()),
            map.resolve(&m.sig("\\a").unwrap())
        );
    }

    #[test]
    fn names_do_not_collide() {
        let mut m = host(4, 4);
        m.add_wire(Wire::new("\\u0.t", 1)).unwrap();
        let sink = DiagnosticSink::new();
        expand_cell(&mut m, &IdString::public("u0"), &inverter_template(4), &sink).unwrap();
        assert_eq!(m.wire("\\u0.t").unwrap().width, 1);
        assert_eq!(m.wire("\\u0.t_1").unwrap().width, 4);
        m.check().unwrap();
    }

    #[test]
    fn wide_input_is_truncated() {
        let mut m = host(8, 4);
        let sink = DiagnosticSink::new();
        expand_cell(&mut m, &IdString::public("u0"), &inverter_template(4), &sink).unwrap();
        assert_eq!(sink.warning_count(), 1);
        let conn = m
            .connections()
            .iter()
            .find(|c| c.dst == m.sig("\\u0.A").unwrap())
            .unwrap();
        assert_eq!(conn.src, SigSpec::wire_range(&IdString::public("a"), 0, 4));
    }

    #[test]
    fn narrow_output_source_is_zero_extended() {
        let mut m = host(4, 6);
        let sink = DiagnosticSink::new();
        expand_cell(&mut m, &IdString::public("u0"), &inverter_template(4), &sink).unwrap();
        let diags = sink.take_all();
        assert!(diags.iter().any(|d| d.severity == Severity::Warning));
        let conn = m
            .connections()
            .iter()
            .find(|c| c.dst == m.sig("\\y").unwrap())
            .unwrap();
        assert_eq!(conn.src.width(), 6);
        let high: Vec<SigBit> = conn.src.bits().skip(4).collect();
        assert_eq!(high, [SigBit::Const(Logic::Zero), SigBit::Const(Logic::Zero)]);
    }

    #[test]
    fn missing_port_is_fatal_and_leaves_module_untouched() {
        let mut m = host(4, 4);
        let q = SigSpec::wire_range(&IdString::public("a"), 0, 1);
        m.cell_mut("\\u0")
            .unwrap()
            .connections
            .insert(IdString::public("Q"), q);
        let sink = DiagnosticSink::new();
        let err = expand_cell(&mut m, &IdString::public("u0"), &inverter_template(4), &sink)
            .unwrap_err();
        assert!(matches!(err, SynthError::MissingTemplatePort { .. }));
        assert!(m.cell("\\u0").is_some());
        assert_eq!(m.wire_count(), 2);
    }

    #[test]
    fn memories_are_fatal() {
        let mut m = host(4, 4);
        let mut tpl = inverter_template(4);
        tpl.add_memory(Memory {
            name: IdString::public("mem"),
            width: 8,
            size: 16,
            attributes: Default::default(),
        })
        .unwrap();
        let sink = DiagnosticSink::new();
        let err = expand_cell(&mut m, &IdString::public("u0"), &tpl, &sink).unwrap_err();
        assert!(matches!(err, SynthError::TemplateHasMemories { .. }));
    }
}
