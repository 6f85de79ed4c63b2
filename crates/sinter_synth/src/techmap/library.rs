//! Template libraries for technology mapping.
//!
//! A [`Library`] names the cell types that can be expanded and produces the
//! template module for a given parameter set. Templates come from two
//! sources: static modules loaded from a netlist file, and Rust generators
//! that build width-dependent structure from the parameters.

use crate::error::{SynthError, SynthResult};
use crate::techmap::stdcells;
use sinter_common::{Const, ContentHash, ContentHasher, IdString};
use sinter_ir::{Design, Module};
use std::collections::BTreeMap;
use std::path::Path;

/// Cell type of the marker that makes a template unusable.
pub const TECHMAP_FAILED: &str = "\\_TECHMAP_FAILED_";

/// Attribute on the marker cell explaining why the template was rejected.
pub const FAILED_REASON: &str = "\\reason";

/// A parameter map, ordered by name.
pub type Params = BTreeMap<IdString, Const>;

/// Builds a template for the given parameters.
pub type Generator = fn(&Params) -> SynthResult<Module>;

/// The set of templates available to the mapping engine.
pub struct Library {
    modules: BTreeMap<IdString, Module>,
    generators: BTreeMap<IdString, Generator>,
    fingerprint: ContentHash,
    derivations: usize,
}

impl Library {
    /// Creates a library without templates.
    pub fn empty() -> Self {
        let mut lib = Self {
            modules: BTreeMap::new(),
            generators: BTreeMap::new(),
            fingerprint: ContentHash::from_bytes(b""),
            derivations: 0,
        };
        lib.refresh_fingerprint();
        lib
    }

    /// The built-in library lowering word-level cells to gate-level cells.
    pub fn builtin() -> Self {
        let mut lib = Self::empty();
        for (name, generator) in stdcells::GENERATORS {
            lib.add_generator(*name, *generator);
        }
        lib
    }

    /// Builds a library from the modules of `design`.
    ///
    /// Modules named with an escaped reserved name (`\$and`) are registered
    /// under the unescaped name (`$and`) so they match builtin cell types.
    pub fn from_design(mut design: Design) -> Self {
        let mut lib = Self::empty();
        for name in design.module_names() {
            if let Some(mut module) = design.remove_module(&name) {
                module.name = module.name.unescape_reserved();
                lib.modules.insert(module.name.clone(), module);
            }
        }
        lib.refresh_fingerprint();
        lib
    }

    /// Loads a library from a netlist file.
    pub fn load(path: &Path) -> SynthResult<Self> {
        let design = sinter_ir::io::read_design(path).map_err(|e| SynthError::LibraryLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), modules = design.module_count(), "loaded techmap library");
        Ok(Self::from_design(design))
    }

    /// Adds or replaces a static template module.
    pub fn add_module(&mut self, mut module: Module) {
        module.name = module.name.unescape_reserved();
        self.modules.insert(module.name.clone(), module);
        self.refresh_fingerprint();
    }

    /// Adds or replaces a generator for `cell_type`.
    pub fn add_generator(&mut self, cell_type: impl Into<IdString>, generator: Generator) {
        self.generators.insert(cell_type.into(), generator);
        self.refresh_fingerprint();
    }

    /// Returns `true` if cells of this type can be expanded.
    pub fn contains(&self, cell_type: &str) -> bool {
        self.modules.contains_key(cell_type) || self.generators.contains_key(cell_type)
    }

    /// Returns the content fingerprint of the library.
    ///
    /// Covers the static modules and the set of generator names; derived
    /// templates do not contribute.
    pub fn fingerprint(&self) -> ContentHash {
        self.fingerprint
    }

    /// Returns how many parameter-specialized templates were produced.
    pub fn derivations(&self) -> usize {
        self.derivations
    }

    fn refresh_fingerprint(&mut self) {
        let mut hasher = ContentHasher::new();
        for (name, module) in &self.modules {
            hasher.update(name.as_str().as_bytes());
            hasher.update(&serde_json::to_vec(module).unwrap_or_default());
        }
        for name in self.generators.keys() {
            hasher.update(b"generator");
            hasher.update(name.as_str().as_bytes());
        }
        self.fingerprint = hasher.finish();
    }

    /// Produces the template for a cell of `cell_type` with `params`.
    ///
    /// Without parameters a static module is used as is. With parameters the
    /// template is derived: static modules are cloned under a
    /// `$paramod` name after checking that every parameter is declared;
    /// generators build a fresh module.
    pub fn instantiate(&mut self, cell_type: &IdString, params: &Params) -> SynthResult<Module> {
        if let Some(generator) = self.generators.get(cell_type) {
            let mut template = generator(params)?;
            template.name = if params.is_empty() {
                cell_type.clone()
            } else {
                self.derivations += 1;
                derived_name(cell_type, params)
            };
            return Ok(template);
        }

        let Some(base) = self.modules.get(cell_type) else {
            return Err(sinter_common::InternalError::new(format!(
                "no template for cell type {cell_type}"
            ))
            .into());
        };
        if params.is_empty() {
            return Ok(base.clone());
        }
        if let Some(unknown) = params.keys().find(|p| !base.parameters.contains_key(*p)) {
            return Err(SynthError::UnknownParameter {
                module: cell_type.clone(),
                parameter: unknown.clone(),
            });
        }
        let mut derived = base.clone();
        derived.name = derived_name(cell_type, params);
        derived
            .parameters
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.derivations += 1;
        tracing::debug!(template = %derived.name, "derived template");
        Ok(derived)
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Name of a parameter-specialized template: `$paramod<type><param>=<value>...`.
pub fn derived_name(cell_type: &IdString, params: &Params) -> IdString {
    let mut name = format!("$paramod{cell_type}");
    for (param, value) in params {
        name.push_str(&format!("{param}={value}"));
    }
    IdString::new(name)
}
