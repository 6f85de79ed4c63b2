//! Pass trait, registry, and script runner.
//!
//! A [`Pass`] receives exclusive access to the [`Design`] for the duration
//! of one invocation; passes never run concurrently. Per-module rewrites that
//! must repeat until nothing changes use [`iterate_to_fixpoint`].

use crate::codes;
use crate::error::{SynthError, SynthResult};
use sinter_common::IdString;
use sinter_config::SinterConfig;
use sinter_diagnostics::{Diagnostic, DiagnosticSink};
use sinter_ir::{Design, Module};
use std::collections::BTreeMap;

/// Shared state handed to every pass invocation.
pub struct PassContext<'a> {
    /// Receives progress, warnings, and soft failures.
    pub sink: &'a DiagnosticSink,
    /// Defaults for options not given on the command line.
    pub config: &'a SinterConfig,
}

impl<'a> PassContext<'a> {
    /// Creates a context.
    pub fn new(sink: &'a DiagnosticSink, config: &'a SinterConfig) -> Self {
        Self { sink, config }
    }

    /// Emits the "Executing ... pass" progress header.
    pub fn header(&self, text: &str) {
        self.sink
            .emit(Diagnostic::note(codes::PASS_HEADER, format!("Executing {text}")));
    }
}

/// A named design transformation.
pub trait Pass {
    /// The name used to invoke the pass from a script.
    fn name(&self) -> &'static str;

    /// A one-line usage summary.
    fn help(&self) -> &'static str;

    /// Runs the pass. `args` excludes the pass name itself.
    fn execute(&self, args: &[String], design: &mut Design, ctx: &PassContext<'_>)
        -> SynthResult<()>;
}

/// The set of passes available to scripts, keyed by name.
pub struct PassRegistry {
    passes: BTreeMap<&'static str, Box<dyn Pass>>,
}

impl PassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            passes: BTreeMap::new(),
        }
    }

    /// Creates a registry holding every builtin pass.
    pub fn with_builtin_passes() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::techmap::TechmapPass));
        registry.register(Box::new(crate::fsm_detect::FsmDetectPass));
        registry
    }

    /// Adds a pass, replacing any pass of the same name.
    pub fn register(&mut self, pass: Box<dyn Pass>) {
        self.passes.insert(pass.name(), pass);
    }

    /// Looks up a pass by name.
    pub fn get(&self, name: &str) -> Option<&dyn Pass> {
        self.passes.get(name).map(|pass| pass.as_ref())
    }

    /// Iterates over the registered passes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Pass> + '_ {
        self.passes.values().map(|pass| pass.as_ref())
    }

    /// Runs the pass `name` with `args`.
    pub fn run(
        &self,
        name: &str,
        args: &[String],
        design: &mut Design,
        ctx: &PassContext<'_>,
    ) -> SynthResult<()> {
        let pass = self
            .get(name)
            .ok_or_else(|| SynthError::UnknownPass(name.to_string()))?;
        tracing::debug!(pass = name, ?args, "running pass");
        pass.execute(args, design, ctx)
    }

    /// Runs a single whitespace-separated command such as `techmap -map lib.json`.
    ///
    /// An empty command does nothing.
    pub fn run_command(
        &self,
        command: &str,
        design: &mut Design,
        ctx: &PassContext<'_>,
    ) -> SynthResult<()> {
        let mut words = command.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(());
        };
        let args: Vec<String> = words.map(str::to_string).collect();
        self.run(name, &args, design, ctx)
    }

    /// Runs a `;`-separated script, stopping at the first fatal error.
    pub fn run_script(
        &self,
        script: &str,
        design: &mut Design,
        ctx: &PassContext<'_>,
    ) -> SynthResult<()> {
        for command in script.split(';') {
            self.run_command(command, design, ctx)?;
        }
        Ok(())
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_builtin_passes()
    }
}

/// The modules a pass should touch; empty means all of them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleFilter {
    names: Vec<IdString>,
}

impl ModuleFilter {
    /// A filter selecting every module.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a filter from the arguments left after flag parsing.
    ///
    /// Bare names get the public `\` prefix. Any remaining argument that
    /// looks like a flag is an error.
    pub fn from_args(pass: &str, args: &[String]) -> SynthResult<Self> {
        let mut names = Vec::with_capacity(args.len());
        for arg in args {
            if arg.starts_with('-') {
                return Err(SynthError::UnknownOption {
                    pass: pass.to_string(),
                    option: arg.clone(),
                });
            }
            if arg.starts_with('\\') || arg.starts_with('$') {
                names.push(IdString::new(arg.as_str()));
            } else {
                names.push(IdString::public(arg));
            }
        }
        Ok(Self { names })
    }

    /// Returns `true` if the module named `name` is selected.
    pub fn selects(&self, name: &IdString) -> bool {
        self.names.is_empty() || self.names.contains(name)
    }
}

/// Re-runs `step` over every selected module until a full sweep changes
/// nothing, returning the number of sweeps performed (including the final
/// unchanged one).
///
/// With `max_sweeps` set, a sweep that still changes something once the
/// limit is reached fails with [`SynthError::NoConvergence`].
pub fn iterate_to_fixpoint<F>(
    design: &mut Design,
    filter: &ModuleFilter,
    max_sweeps: Option<usize>,
    mut step: F,
) -> SynthResult<usize>
where
    F: FnMut(&mut Module) -> SynthResult<bool>,
{
    let mut sweeps = 0;
    loop {
        sweeps += 1;
        let mut changed = false;
        for module in design.modules_mut() {
            if !filter.selects(&module.name) {
                continue;
            }
            if step(module)? {
                changed = true;
            }
        }
        tracing::debug!(sweep = sweeps, changed, "sweep finished");
        if !changed {
            return Ok(sweeps);
        }
        if let Some(limit) = max_sweeps {
            if sweeps >= limit {
                return Err(SynthError::NoConvergence { sweeps: limit });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinter_ir::Wire;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        calls: Rc<RefCell<Vec<Vec<String>>>>,
    }

    impl Pass for Recorder {
        fn name(&self) -> &'static str {
            "record"
        }

        fn help(&self) -> &'static str {
            "record [args...]"
        }

        fn execute(&self, args: &[String], _: &mut Design, _: &PassContext<'_>) -> SynthResult<()> {
            self.calls.borrow_mut().push(args.to_vec());
            Ok(())
        }
    }

    fn two_modules() -> Design {
        let mut d = Design::new();
        d.add_module(Module::new("\\a")).unwrap();
        d.add_module(Module::new("\\b")).unwrap();
        d
    }

    #[test]
    fn builtin_passes_registered() {
        let registry = PassRegistry::with_builtin_passes();
        let names: Vec<&str> = registry.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["fsm_detect", "techmap"]);
    }

    #[test]
    fn unknown_pass_is_fatal() {
        let registry = PassRegistry::new();
        let sink = DiagnosticSink::new();
        let config = SinterConfig::default();
        let ctx = PassContext::new(&sink, &config);
        let err = registry
            .run_command("opt_clean", &mut Design::new(), &ctx)
            .unwrap_err();
        assert!(matches!(err, SynthError::UnknownPass(name) if name == "opt_clean"));
    }

    #[test]
    fn script_splits_commands_and_args() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = PassRegistry::new();
        registry.register(Box::new(Recorder {
            calls: Rc::clone(&calls),
        }));
        let sink = DiagnosticSink::new();
        let config = SinterConfig::default();
        let ctx = PassContext::new(&sink, &config);
        registry
            .run_script("record -x 1 top; ;record", &mut Design::new(), &ctx)
            .unwrap();
        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ["-x", "1", "top"]);
        assert!(calls[1].is_empty());
    }

    #[test]
    fn filter_parsing() {
        let args = vec!["top".to_string(), "\\sub".to_string()];
        let filter = ModuleFilter::from_args("techmap", &args).unwrap();
        assert!(filter.selects(&IdString::public("top")));
        assert!(filter.selects(&IdString::public("sub")));
        assert!(!filter.selects(&IdString::public("other")));
        assert!(ModuleFilter::all().selects(&IdString::public("other")));
    }

    #[test]
    fn filter_rejects_flags() {
        let args = vec!["top".to_string(), "-bogus".to_string()];
        let err = ModuleFilter::from_args("techmap", &args).unwrap_err();
        assert_eq!(err.to_string(), "techmap: unknown option '-bogus'");
    }

    #[test]
    fn fixpoint_counts_final_sweep() {
        let mut d = two_modules();
        let mut budget = 3;
        let sweeps = iterate_to_fixpoint(&mut d, &ModuleFilter::all(), None, |m| {
            if budget > 0 && m.name.as_str() == "\\a" {
                budget -= 1;
                m.add_wire(Wire::new(format!("\\w{budget}"), 1))?;
                return Ok(true);
            }
            Ok(false)
        })
        .unwrap();
        assert_eq!(sweeps, 4);
        assert_eq!(d.module("\\a").unwrap().wire_count(), 3);
    }

    #[test]
    fn fixpoint_honors_filter() {
        let mut d = two_modules();
        let mut visited = Vec::new();
        let filter = ModuleFilter::from_args("t", &["b".to_string()]).unwrap();
        iterate_to_fixpoint(&mut d, &filter, None, |m| {
            visited.push(m.name.clone());
            Ok(false)
        })
        .unwrap();
        assert_eq!(visited, [IdString::public("b")]);
    }

    #[test]
    fn fixpoint_limit() {
        let mut d = two_modules();
        let err = iterate_to_fixpoint(&mut d, &ModuleFilter::all(), Some(5), |_| Ok(true))
            .unwrap_err();
        assert!(matches!(err, SynthError::NoConvergence { sweeps: 5 }));
    }

    #[test]
    fn header_is_a_note() {
        let sink = DiagnosticSink::new();
        let config = SinterConfig::default();
        PassContext::new(&sink, &config).header("TEST pass.");
        let diags = sink.take_all();
        assert_eq!(diags[0].message, "Executing TEST pass.");
        assert!(!sink.has_errors());
    }
}
