//! The top-level container of a netlist.

use crate::module::Module;
use serde::{Deserialize, Serialize};
use sinter_common::{IdString, InternalError, SinterResult};
use std::collections::BTreeMap;

/// A complete design: a set of uniquely named modules.
///
/// Cells refer to other modules by name through their type, so the module
/// map is flat; hierarchy is implied by instantiation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    modules: BTreeMap<IdString, Module>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module. Fails if the name is taken.
    pub fn add_module(&mut self, module: Module) -> SinterResult<&mut Module> {
        if self.modules.contains_key(&module.name) {
            return Err(InternalError::new(format!(
                "module {} already exists",
                module.name
            )));
        }
        let name = module.name.clone();
        Ok(self.modules.entry(name).or_insert(module))
    }

    /// Removes a module and returns it.
    pub fn remove_module(&mut self, name: &IdString) -> Option<Module> {
        self.modules.remove(name)
    }

    /// Looks up a module by name.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Looks up a module by name for mutation.
    pub fn module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.get_mut(name)
    }

    /// Iterates over modules in name order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> + '_ {
        self.modules.values()
    }

    /// Iterates over modules in name order for mutation.
    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> + '_ {
        self.modules.values_mut()
    }

    /// Returns the module names in order.
    pub fn module_names(&self) -> Vec<IdString> {
        self.modules.keys().cloned().collect()
    }

    /// Returns the number of modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Verifies every module's invariants and that names match map keys.
    pub fn check(&self) -> SinterResult<()> {
        for (key, module) in &self.modules {
            if key != &module.name {
                return Err(InternalError::new(format!(
                    "design entry {key} holds module {}",
                    module.name
                )));
            }
            module.check()?;
        }
        Ok(())
    }
}
