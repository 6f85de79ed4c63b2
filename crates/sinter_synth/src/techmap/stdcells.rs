//! Built-in templates lowering word-level cells to single-bit gates.
//!
//! Each generator reads the cell's width and signedness parameters and
//! emits one gate per output bit (`$_NOT_`, `$_AND_`, `$_OR_`, `$_XOR_`,
//! `$_MUX_`, `$_DFF_P_`, `$_DFF_N_`). Operands are zero-extended or
//! truncated to the result width. Configurations that would need sign
//! extension, or a multi-bit `$mux` select, produce a template carrying the
//! failure marker so the cell stays unmapped.

use crate::error::SynthResult;
use crate::techmap::library::{Generator, Params, FAILED_REASON, TECHMAP_FAILED};
use sinter_common::{Const, IdString, Logic};
use sinter_ir::{Cell, Module, SigSpec, Wire};

/// Generators registered by [`Library::builtin`](super::Library::builtin).
pub(crate) const GENERATORS: &[(&str, Generator)] = &[
    ("$not", gen_not),
    ("$pos", gen_pos),
    ("$and", gen_and),
    ("$or", gen_or),
    ("$xor", gen_xor),
    ("$xnor", gen_xnor),
    ("$reduce_and", gen_reduce_and),
    ("$reduce_or", gen_reduce_or),
    ("$reduce_xor", gen_reduce_xor),
    ("$reduce_bool", gen_reduce_or),
    ("$logic_not", gen_logic_not),
    ("$eq", gen_eq),
    ("$ne", gen_ne),
    ("$mux", gen_mux),
    ("$pmux", gen_pmux),
    ("$dff", gen_dff),
];

fn param_width(params: &Params, name: &str) -> u32 {
    params
        .get(name)
        .and_then(Const::as_u64)
        .and_then(|w| u32::try_from(w).ok())
        .unwrap_or(1)
}

fn param_flag(params: &Params, name: &str) -> bool {
    params.get(name).is_some_and(Const::as_bool)
}

/// Incrementally builds a template module.
struct TemplateBuilder {
    module: Module,
    next_port: u32,
    next_id: u32,
}

impl TemplateBuilder {
    fn new() -> Self {
        Self {
            module: Module::new("$template"),
            next_port: 1,
            next_id: 1,
        }
    }

    fn port(&mut self, name: &str, width: u32, output: bool) -> SynthResult<SigSpec> {
        let wire = if output {
            Wire::output(name, width, self.next_port)
        } else {
            Wire::input(name, width, self.next_port)
        };
        self.next_port += 1;
        Ok(SigSpec::from_wire(self.module.add_wire(wire)?))
    }

    fn input(&mut self, name: &str, width: u32) -> SynthResult<SigSpec> {
        self.port(name, width, false)
    }

    fn output(&mut self, name: &str, width: u32) -> SynthResult<SigSpec> {
        self.port(name, width, true)
    }

    fn fresh(&mut self) -> IdString {
        let id = IdString::new(format!("${}", self.next_id));
        self.next_id += 1;
        id
    }

    fn wire(&mut self, width: u32) -> SynthResult<SigSpec> {
        let name = self.fresh();
        Ok(SigSpec::from_wire(self.module.add_wire(Wire::new(name, width))?))
    }

    fn gate(&mut self, cell_type: &str, ports: &[(&str, &SigSpec)]) -> SynthResult<()> {
        let mut cell = Cell::new(self.fresh(), cell_type);
        for (port, sig) in ports {
            cell.connections.insert(IdString::new(*port), (*sig).clone());
        }
        self.module.add_cell(cell)?;
        Ok(())
    }

    /// Emits a two-input gate into a fresh one-bit wire and returns it.
    fn gate2(&mut self, cell_type: &str, a: &SigSpec, b: &SigSpec) -> SynthResult<SigSpec> {
        let y = self.wire(1)?;
        self.gate(cell_type, &[("\\A", a), ("\\B", b), ("\\Y", &y)])?;
        Ok(y)
    }

    fn not(&mut self, a: &SigSpec) -> SynthResult<SigSpec> {
        let y = self.wire(1)?;
        self.gate("$_NOT_", &[("\\A", a), ("\\Y", &y)])?;
        Ok(y)
    }

    /// Folds the bits of `sig` with a two-input gate; `empty` for zero width.
    fn reduce(&mut self, cell_type: &str, sig: &SigSpec, empty: Logic) -> SynthResult<SigSpec> {
        let mut bits = (0..sig.width()).map(|i| sig.extract(i, 1));
        let Some(mut acc) = bits.next() else {
            return Ok(SigSpec::repeat(empty, 1));
        };
        for bit in bits {
            acc = self.gate2(cell_type, &acc, &bit)?;
        }
        Ok(acc)
    }

    fn connect(&mut self, dst: SigSpec, src: SigSpec) -> SynthResult<()> {
        self.module.connect(dst, src)?;
        Ok(())
    }

    /// Drives a result port from a single bit, zero-filling the rest.
    fn drive_bool(&mut self, y: &SigSpec, bit: SigSpec) -> SynthResult<()> {
        if y.width() == 0 {
            return Ok(());
        }
        let mut value = bit;
        value.zero_extend(y.width());
        self.connect(y.clone(), value)
    }

    fn finish(self) -> Module {
        self.module
    }
}

fn resized(sig: &SigSpec, width: u32) -> SigSpec {
    let mut out = sig.clone();
    out.truncate(width);
    out.zero_extend(width);
    out
}

/// A template that the engine will refuse, with the reason attached.
fn failed(reason: &str) -> SynthResult<Module> {
    let mut module = Module::new("$template");
    let marker = Cell::new("$failed", TECHMAP_FAILED);
    let cell = module.add_cell(marker)?;
    cell.attributes
        .insert(IdString::new(FAILED_REASON), Const::from_string(reason));
    Ok(module)
}

fn gen_not(params: &Params) -> SynthResult<Module> {
    let a_width = param_width(params, "\\A_WIDTH");
    let y_width = param_width(params, "\\Y_WIDTH");
    if param_flag(params, "\\A_SIGNED") && a_width != y_width {
        return failed("signed $not with operand and result of different width");
    }
    let mut b = TemplateBuilder::new();
    let a = b.input("\\A", a_width)?;
    let y = b.output("\\Y", y_width)?;
    let a = resized(&a, y_width);
    for i in 0..y_width {
        b.gate("$_NOT_", &[("\\A", &a.extract(i, 1)), ("\\Y", &y.extract(i, 1))])?;
    }
    Ok(b.finish())
}

fn gen_pos(params: &Params) -> SynthResult<Module> {
    let a_width = param_width(params, "\\A_WIDTH");
    let y_width = param_width(params, "\\Y_WIDTH");
    if param_flag(params, "\\A_SIGNED") && a_width != y_width {
        return failed("signed $pos with operand and result of different width");
    }
    let mut b = TemplateBuilder::new();
    let a = b.input("\\A", a_width)?;
    let y = b.output("\\Y", y_width)?;
    b.connect(y, resized(&a, y_width))?;
    Ok(b.finish())
}

fn bitwise(params: &Params, gate: &str, invert: bool) -> SynthResult<Module> {
    let a_width = param_width(params, "\\A_WIDTH");
    let b_width = param_width(params, "\\B_WIDTH");
    let y_width = param_width(params, "\\Y_WIDTH");
    let signed = param_flag(params, "\\A_SIGNED") || param_flag(params, "\\B_SIGNED");
    if signed && (a_width != y_width || b_width != y_width) {
        return failed("signed operands of different width");
    }
    let mut b = TemplateBuilder::new();
    let a = b.input("\\A", a_width)?;
    let bb = b.input("\\B", b_width)?;
    let y = b.output("\\Y", y_width)?;
    let a = resized(&a, y_width);
    let bb = resized(&bb, y_width);
    for i in 0..y_width {
        let (ai, bi, yi) = (a.extract(i, 1), bb.extract(i, 1), y.extract(i, 1));
        if invert {
            let t = b.gate2(gate, &ai, &bi)?;
            b.gate("$_NOT_", &[("\\A", &t), ("\\Y", &yi)])?;
        } else {
            b.gate(gate, &[("\\A", &ai), ("\\B", &bi), ("\\Y", &yi)])?;
        }
    }
    Ok(b.finish())
}

fn gen_and(params: &Params) -> SynthResult<Module> {
    bitwise(params, "$_AND_", false)
}

fn gen_or(params: &Params) -> SynthResult<Module> {
    bitwise(params, "$_OR_", false)
}

fn gen_xor(params: &Params) -> SynthResult<Module> {
    bitwise(params, "$_XOR_", false)
}

fn gen_xnor(params: &Params) -> SynthResult<Module> {
    bitwise(params, "$_XOR_", true)
}

fn reduction(params: &Params, gate: &str, empty: Logic, invert: bool) -> SynthResult<Module> {
    let a_width = param_width(params, "\\A_WIDTH");
    let y_width = param_width(params, "\\Y_WIDTH");
    let mut b = TemplateBuilder::new();
    let a = b.input("\\A", a_width)?;
    let y = b.output("\\Y", y_width)?;
    let mut r = b.reduce(gate, &a, empty)?;
    if invert {
        r = b.not(&r)?;
    }
    b.drive_bool(&y, r)?;
    Ok(b.finish())
}

fn gen_reduce_and(params: &Params) -> SynthResult<Module> {
    reduction(params, "$_AND_", Logic::One, false)
}

fn gen_reduce_or(params: &Params) -> SynthResult<Module> {
    reduction(params, "$_OR_", Logic::Zero, false)
}

fn gen_reduce_xor(params: &Params) -> SynthResult<Module> {
    reduction(params, "$_XOR_", Logic::Zero, false)
}

fn gen_logic_not(params: &Params) -> SynthResult<Module> {
    reduction(params, "$_OR_", Logic::Zero, true)
}

fn equality(params: &Params, invert: bool) -> SynthResult<Module> {
    let a_width = param_width(params, "\\A_WIDTH");
    let b_width = param_width(params, "\\B_WIDTH");
    let y_width = param_width(params, "\\Y_WIDTH");
    let signed = param_flag(params, "\\A_SIGNED") || param_flag(params, "\\B_SIGNED");
    if signed && a_width != b_width {
        return failed("signed operands of different width");
    }
    let width = a_width.max(b_width);
    let mut b = TemplateBuilder::new();
    let a = b.input("\\A", a_width)?;
    let bb = b.input("\\B", b_width)?;
    let y = b.output("\\Y", y_width)?;
    let a = resized(&a, width);
    let bb = resized(&bb, width);
    let mut diff = SigSpec::new();
    for i in 0..width {
        let d = b.gate2("$_XOR_", &a.extract(i, 1), &bb.extract(i, 1))?;
        diff.append(&d);
    }
    let any = b.reduce("$_OR_", &diff, Logic::Zero)?;
    let r = if invert { b.not(&any)? } else { any };
    b.drive_bool(&y, r)?;
    Ok(b.finish())
}

fn gen_eq(params: &Params) -> SynthResult<Module> {
    equality(params, true)
}

fn gen_ne(params: &Params) -> SynthResult<Module> {
    equality(params, false)
}

fn gen_mux(params: &Params) -> SynthResult<Module> {
    let width = param_width(params, "\\WIDTH");
    if param_width(params, "\\S_WIDTH") != 1 {
        return failed("$mux with a multi-bit select");
    }
    let mut b = TemplateBuilder::new();
    let a = b.input("\\A", width)?;
    let bb = b.input("\\B", width)?;
    let s = b.input("\\S", 1)?;
    let y = b.output("\\Y", width)?;
    for i in 0..width {
        b.gate(
            "$_MUX_",
            &[
                ("\\A", &a.extract(i, 1)),
                ("\\B", &bb.extract(i, 1)),
                ("\\S", &s),
                ("\\Y", &y.extract(i, 1)),
            ],
        )?;
    }
    Ok(b.finish())
}

/// Chains one `$_MUX_` row per select bit; higher select indices win.
fn gen_pmux(params: &Params) -> SynthResult<Module> {
    let width = param_width(params, "\\WIDTH");
    let s_width = param_width(params, "\\S_WIDTH");
    let Some(b_width) = width.checked_mul(s_width) else {
        return failed("$pmux case bus wider than 2^32 bits");
    };
    let mut b = TemplateBuilder::new();
    let a = b.input("\\A", width)?;
    let bb = b.input("\\B", b_width)?;
    let s = b.input("\\S", s_width)?;
    let y = b.output("\\Y", width)?;
    if s_width == 0 {
        b.connect(y, a)?;
        return Ok(b.finish());
    }
    let mut acc = a;
    for j in 0..s_width {
        let next = if j + 1 == s_width { y.clone() } else { b.wire(width)? };
        let sel = s.extract(j, 1);
        let case = bb.extract(j * width, width);
        for i in 0..width {
            b.gate(
                "$_MUX_",
                &[
                    ("\\A", &acc.extract(i, 1)),
                    ("\\B", &case.extract(i, 1)),
                    ("\\S", &sel),
                    ("\\Y", &next.extract(i, 1)),
                ],
            )?;
        }
        acc = next;
    }
    Ok(b.finish())
}

fn gen_dff(params: &Params) -> SynthResult<Module> {
    let width = param_width(params, "\\WIDTH");
    let positive = params
        .get("\\CLK_POLARITY")
        .map_or(true, Const::as_bool);
    let gate = if positive { "$_DFF_P_" } else { "$_DFF_N_" };
    let mut b = TemplateBuilder::new();
    let clk = b.input("\\CLK", 1)?;
    let d = b.input("\\D", width)?;
    let q = b.output("\\Q", width)?;
    for i in 0..width {
        b.gate(
            gate,
            &[("\\C", &clk), ("\\D", &d.extract(i, 1)), ("\\Q", &q.extract(i, 1))],
        )?;
    }
    Ok(b.finish())
}
