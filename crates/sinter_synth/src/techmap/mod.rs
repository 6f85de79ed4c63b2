//! Hierarchical technology mapping.
//!
//! Every cell whose type names a library template is replaced by the
//! template's contents, and the whole design is swept again until nothing
//! expands. Templates are resolved once per (type, parameters) key; keys
//! whose template carries the `_TECHMAP_FAILED_` marker are remembered as
//! unsupported and their instances are left alone.

mod cache;
mod expand;
pub mod library;
mod stdcells;

pub use library::{derived_name, Generator, Library, Params, FAILED_REASON, TECHMAP_FAILED};

use crate::codes;
use crate::error::{SynthError, SynthResult};
use crate::pass::{iterate_to_fixpoint, ModuleFilter, Pass, PassContext};
use cache::{CacheEntry, CacheKey, TemplateCache};
use sinter_common::IdString;
use sinter_diagnostics::{Diagnostic, DiagnosticSink, Location};
use sinter_ir::{Design, Module};
use std::path::PathBuf;

/// Counters describing one mapping run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TechmapStats {
    /// Sweeps over the design, including the final one that changed nothing.
    pub sweeps: usize,
    /// Cells replaced by their template.
    pub expanded: usize,
    /// Parameter-specialized templates produced.
    pub derivations: usize,
    /// Keys found to be unsupported.
    pub unsupported: usize,
}

/// The mapping engine: a library plus its template cache.
///
/// The cache survives across [`run`](Self::run) calls as long as the
/// library's fingerprint is unchanged.
pub struct TechmapEngine {
    library: Library,
    cache: TemplateCache,
    max_sweeps: Option<usize>,
}

impl TechmapEngine {
    /// Creates an engine over `library` with no sweep limit.
    pub fn new(library: Library) -> Self {
        Self {
            library,
            cache: TemplateCache::default(),
            max_sweeps: None,
        }
    }

    /// Sets the sweep limit; `None` means unlimited.
    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Returns the library.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Returns the library for modification.
    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    /// Expands library cells in the selected modules until a fixpoint.
    pub fn run(
        &mut self,
        design: &mut Design,
        filter: &ModuleFilter,
        sink: &DiagnosticSink,
    ) -> SynthResult<TechmapStats> {
        self.cache.sync(self.library.fingerprint());
        let derivations_before = self.library.derivations();
        let mut stats = TechmapStats::default();
        let max_sweeps = self.max_sweeps;

        let sweeps = iterate_to_fixpoint(design, filter, max_sweeps, |module| {
            self.map_module(module, &mut stats, sink)
        })?;
        stats.sweeps = sweeps;
        stats.derivations = self.library.derivations() - derivations_before;

        sink.emit(Diagnostic::note(
            codes::MAPPING_DONE,
            "No more expansions possible.",
        ));
        tracing::debug!(?stats, cached = self.cache.len(), "techmap finished");
        Ok(stats)
    }

    /// One sweep over one module. Cells created by this sweep are left for
    /// the next one.
    fn map_module(
        &mut self,
        module: &mut Module,
        stats: &mut TechmapStats,
        sink: &DiagnosticSink,
    ) -> SynthResult<bool> {
        let mut changed = false;
        for name in module.cell_names() {
            let Some(cell) = module.cell(name.as_str()) else {
                continue;
            };
            if !self.library.contains(cell.cell_type.as_str()) {
                continue;
            }
            let key = CacheKey::of(cell);
            if self.cache.get(&key).is_none() {
                let entry = self.resolve(&key, module, &name, sink)?;
                if matches!(entry, CacheEntry::Unsupported) {
                    stats.unsupported += 1;
                }
                self.cache.insert(key.clone(), entry);
            }
            let Some(CacheEntry::Usable(template)) = self.cache.get(&key) else {
                continue;
            };
            expand::expand_cell(module, &name, template, sink)?;
            stats.expanded += 1;
            changed = true;
        }
        Ok(changed)
    }

    fn resolve(
        &mut self,
        key: &CacheKey,
        module: &Module,
        cell_name: &IdString,
        sink: &DiagnosticSink,
    ) -> SynthResult<CacheEntry> {
        let template = self.library.instantiate(&key.cell_type, &key.params)?;
        let Some(marker) = template
            .cells()
            .find(|c| c.cell_type.as_str() == TECHMAP_FAILED)
        else {
            return Ok(CacheEntry::Usable(template));
        };
        let mut diag = Diagnostic::note(
            codes::TEMPLATE_UNSUPPORTED,
            format!(
                "Not using module `{}' from techmap as it contains a {} marker cell.",
                template.name,
                TECHMAP_FAILED.trim_start_matches('\\')
            ),
        )
        .at(Location::object(&module.name, cell_name));
        if let Some(reason) = marker
            .attributes
            .get(FAILED_REASON)
            .and_then(|r| r.as_string())
        {
            diag = diag.with_note(reason);
        }
        sink.emit(diag);
        Ok(CacheEntry::Unsupported)
    }
}

/// Options of one `techmap` invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TechmapArgs {
    /// Library file given with `-map`.
    pub map: Option<PathBuf>,
    /// Sweep limit given with `-max_sweeps`.
    pub max_sweeps: Option<usize>,
    /// Modules to map.
    pub filter: ModuleFilter,
}

impl TechmapArgs {
    /// Parses `[-map <file>] [-max_sweeps <n>] [module...]`.
    pub fn parse(args: &[String]) -> SynthResult<Self> {
        let mut parsed = Self::default();
        let mut idx = 0;
        while idx < args.len() {
            match args[idx].as_str() {
                "-map" => {
                    let value = args.get(idx + 1).ok_or_else(|| missing("-map", "a file name"))?;
                    parsed.map = Some(PathBuf::from(value));
                    idx += 2;
                }
                "-max_sweeps" => {
                    let value = args
                        .get(idx + 1)
                        .and_then(|v| v.parse::<usize>().ok())
                        .filter(|n| *n > 0)
                        .ok_or_else(|| missing("-max_sweeps", "a positive integer"))?;
                    parsed.max_sweeps = Some(value);
                    idx += 2;
                }
                _ => break,
            }
        }
        parsed.filter = ModuleFilter::from_args("techmap", &args[idx..])?;
        Ok(parsed)
    }
}

fn missing(option: &str, expected: &'static str) -> SynthError {
    SynthError::MissingArgument {
        pass: "techmap".to_string(),
        option: option.to_string(),
        expected,
    }
}

/// The `techmap` pass.
pub struct TechmapPass;

impl Pass for TechmapPass {
    fn name(&self) -> &'static str {
        "techmap"
    }

    fn help(&self) -> &'static str {
        "techmap [-map <file>] [-max_sweeps <n>] [module...]: replace cells with library templates"
    }

    fn execute(
        &self,
        args: &[String],
        design: &mut Design,
        ctx: &PassContext<'_>,
    ) -> SynthResult<()> {
        ctx.header("TECHMAP pass (map to technology primitives).");
        let args = TechmapArgs::parse(args)?;
        let map = args.map.or_else(|| ctx.config.techmap.map.clone());
        let library = match &map {
            Some(path) => Library::load(path)?,
            None => Library::builtin(),
        };
        let max_sweeps = args.max_sweeps.or(ctx.config.techmap.max_sweeps);
        let mut engine = TechmapEngine::new(library).with_max_sweeps(max_sweeps);
        engine.run(design, &args.filter, ctx.sink)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinter_common::Const;
    use sinter_config::SinterConfig;
    use sinter_ir::{Cell, Wire};

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn and_design(instances: usize, width: u64) -> Design {
        let mut m = Module::new("\\top");
        m.add_wire(Wire::input("\\a", width as u32, 1)).unwrap();
        m.add_wire(Wire::input("\\b", width as u32, 2)).unwrap();
        for i in 0..instances {
            let y = format!("\\y{i}");
            m.add_wire(Wire::new(y.as_str(), width as u32)).unwrap();
            let cell = Cell::new(format!("\\u{i}"), "$and")
                .with_param("\\A_WIDTH", Const::from_u64(width, 32))
                .with_param("\\B_WIDTH", Const::from_u64(width, 32))
                .with_param("\\Y_WIDTH", Const::from_u64(width, 32))
                .with_port("\\A", m.sig("\\a").unwrap())
                .with_port("\\B", m.sig("\\b").unwrap())
                .with_port("\\Y", m.sig(&y).unwrap());
            m.add_cell(cell).unwrap();
        }
        let mut d = Design::new();
        d.add_module(m).unwrap();
        d
    }

    #[test]
    fn parse_flags_then_modules() {
        let args = TechmapArgs::parse(&strings(&["-map", "lib.json", "-max_sweeps", "3", "top"])).unwrap();
        assert_eq!(args.map, Some(PathBuf::from("lib.json")));
        assert_eq!(args.max_sweeps, Some(3));
        assert!(args.filter.selects(&IdString::public("top")));
        assert!(!args.filter.selects(&IdString::public("other")));
    }

    #[test]
    fn parse_rejects_late_flags() {
        let err = TechmapArgs::parse(&strings(&["top", "-map", "x"])).unwrap_err();
        assert!(matches!(err, SynthError::UnknownOption { .. }));
    }

    #[test]
    fn parse_requires_values() {
        assert!(matches!(
            TechmapArgs::parse(&strings(&["-map"])),
            Err(SynthError::MissingArgument { .. })
        ));
        assert!(matches!(
            TechmapArgs::parse(&strings(&["-max_sweeps", "zero"])),
            Err(SynthError::MissingArgument { .. })
        ));
    }

    #[test]
    fn shared_key_derives_once() {
        let mut d = and_design(3, 4);
        let sink = DiagnosticSink::new();
        let mut engine = TechmapEngine::new(Library::builtin());
        let stats = engine.run(&mut d, &ModuleFilter::all(), &sink).unwrap();
        assert_eq!(stats.derivations, 1);
        assert_eq!(stats.expanded, 3);
        assert_eq!(stats.sweeps, 2);
        let top = d.module("\\top").unwrap();
        assert_eq!(top.cells().filter(|c| c.cell_type.as_str() == "$_AND_").count(), 12);
        top.check().unwrap();
    }

    #[test]
    fn cache_survives_runs_until_library_changes() {
        let sink = DiagnosticSink::new();
        let mut engine = TechmapEngine::new(Library::builtin());
        engine
            .run(&mut and_design(1, 2), &ModuleFilter::all(), &sink)
            .unwrap();
        let again = engine
            .run(&mut and_design(1, 2), &ModuleFilter::all(), &sink)
            .unwrap();
        assert_eq!(again.derivations, 0);

        engine.library_mut().add_module(Module::new("\\unrelated"));
        let after_change = engine
            .run(&mut and_design(1, 2), &ModuleFilter::all(), &sink)
            .unwrap();
        assert_eq!(after_change.derivations, 1);
    }

    #[test]
    fn unsupported_key_is_noted_and_kept() {
        let mut d = and_design(2, 4);
        for cell in ["\\u0", "\\u1"] {
            let c = d.module_mut("\\top").unwrap().cell_mut(cell).unwrap();
            c.parameters
                .insert(IdString::public("A_SIGNED"), Const::from_u64(1, 1));
            c.parameters
                .insert(IdString::public("A_WIDTH"), Const::from_u64(2, 32));
        }
        let sink = DiagnosticSink::new();
        let mut engine = TechmapEngine::new(Library::builtin());
        let stats = engine.run(&mut d, &ModuleFilter::all(), &sink).unwrap();
        assert_eq!(stats.unsupported, 1);
        assert_eq!(stats.expanded, 0);
        assert_eq!(stats.sweeps, 1);
        assert_eq!(d.module("\\top").unwrap().cell_count(), 2);
        let notes: Vec<_> = sink
            .take_all()
            .into_iter()
            .filter(|d| d.code == codes::TEMPLATE_UNSUPPORTED)
            .collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notes, ["signed operands of different width"]);
    }

    #[test]
    fn self_instantiating_template_hits_limit() {
        let mut lib_module = Module::new("\\loop");
        lib_module.add_wire(Wire::input("\\I", 1, 1)).unwrap();
        let inner = Cell::new("\\again", "\\loop").with_port("\\I", lib_module.sig("\\I").unwrap());
        lib_module.add_cell(inner).unwrap();
        let mut lib = Library::empty();
        lib.add_module(lib_module);

        let mut m = Module::new("\\top");
        m.add_wire(Wire::input("\\x", 1, 1)).unwrap();
        m.add_cell(Cell::new("\\u0", "\\loop").with_port("\\I", m.sig("\\x").unwrap()))
            .unwrap();
        let mut d = Design::new();
        d.add_module(m).unwrap();

        let sink = DiagnosticSink::new();
        let mut engine = TechmapEngine::new(lib).with_max_sweeps(Some(4));
        let err = engine.run(&mut d, &ModuleFilter::all(), &sink).unwrap_err();
        assert!(matches!(err, SynthError::NoConvergence { sweeps: 4 }));
    }

    #[test]
    fn pass_uses_builtin_library() {
        let mut d = and_design(1, 2);
        let sink = DiagnosticSink::new();
        let config = SinterConfig::default();
        let ctx = PassContext::new(&sink, &config);
        TechmapPass.execute(&[], &mut d, &ctx).unwrap();
        let messages: Vec<String> = sink.take_all().into_iter().map(|d| d.message).collect();
        assert_eq!(
            messages.first().map(String::as_str),
            Some("Executing TECHMAP pass (map to technology primitives).")
        );
        assert_eq!(
            messages.last().map(String::as_str),
            Some("No more expansions possible.")
        );
        let top = d.module("\\top").unwrap();
        assert!(top.cells().all(|c| c.cell_type.as_str() == "$_AND_"));
        assert!(top.wire("\\u0.A").is_some());
        let y0 = top.sig("\\y0").unwrap();
        assert!(top.connections().iter().any(|c| c.dst == y0));
    }
}
