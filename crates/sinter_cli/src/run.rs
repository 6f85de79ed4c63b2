//! `sinter run`: load a netlist, run a pass script, write the result.
//!
//! 1. Load config (`--config` or `./sinter.toml`)
//! 2. Read the input netlist
//! 3. Run each `-p` script, or `[script] commands` when none is given
//! 4. Render diagnostics
//! 5. Write the netlist unless a fatal error occurred

use std::path::Path;

use sinter_diagnostics::DiagnosticSink;
use sinter_ir::Design;
use sinter_synth::{PassContext, PassRegistry, SynthResult};

use crate::pipeline::{load_config, print_summary, render_diagnostics};
use crate::{GlobalArgs, RunArgs};

/// Runs the `sinter run` command.
///
/// Returns exit code 0 on success and 1 when a pass failed or any error
/// diagnostic was emitted.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let mut design = sinter_ir::io::read_design(Path::new(&args.design))?;

    if !global.quiet {
        eprintln!(
            "   Loaded {} ({} module(s))",
            args.design,
            design.module_count()
        );
    }

    let scripts = if args.scripts.is_empty() {
        config.script.commands.clone()
    } else {
        args.scripts.clone()
    };

    let sink = DiagnosticSink::new();
    let registry = PassRegistry::with_builtin_passes();
    let ctx = PassContext::new(&sink, &config);
    let outcome = run_scripts(&registry, &scripts, &mut design, &ctx);
    if let Err(ref e) = outcome {
        tracing::debug!(error = %e, "pass script aborted");
        sink.emit(e.to_diagnostic());
    }

    let diagnostics = sink.diagnostics();
    render_diagnostics(&diagnostics, global);
    print_summary(&diagnostics, global);

    if outcome.is_err() {
        return Ok(1);
    }

    match args.output {
        Some(ref out) => sinter_ir::io::write_design(&design, Path::new(out))?,
        None => println!("{}", sinter_ir::io::design_to_string(&design)),
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Runs `scripts` in order, stopping at the first fatal error.
fn run_scripts(
    registry: &PassRegistry,
    scripts: &[String],
    design: &mut Design,
    ctx: &PassContext<'_>,
) -> SynthResult<()> {
    for script in scripts {
        registry.run_script(script, design, ctx)?;
    }
    Ok(())
}
