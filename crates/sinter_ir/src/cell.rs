//! Cell instances: builtin primitives and instantiations of other modules.

use crate::sigspec::SigSpec;
use serde::{Deserialize, Serialize};
use sinter_common::{Const, IdString};
use std::collections::BTreeMap;

/// An instance of a builtin primitive or of another module.
///
/// The type together with the parameter map forms the instance's mapping
/// identity. Connections map port names to the signal bound there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// The instance name, unique within its module.
    pub name: IdString,
    /// The primitive type (`$and`, `$_DFF_P_`) or instantiated module name.
    #[serde(rename = "type")]
    pub cell_type: IdString,
    /// Parameter values, ordered by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<IdString, Const>,
    /// Port bindings.
    #[serde(default)]
    pub connections: BTreeMap<IdString, SigSpec>,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<IdString, Const>,
}

impl Cell {
    /// Creates an unconnected cell without parameters.
    pub fn new(name: impl Into<IdString>, cell_type: impl Into<IdString>) -> Self {
        Self {
            name: name.into(),
            cell_type: cell_type.into(),
            parameters: BTreeMap::new(),
            connections: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets a parameter, builder style.
    pub fn with_param(mut self, name: impl Into<IdString>, value: Const) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Binds a port, builder style.
    pub fn with_port(mut self, port: impl Into<IdString>, sig: SigSpec) -> Self {
        self.connections.insert(port.into(), sig);
        self
    }

    /// Returns the signal bound to `port`.
    pub fn port(&self, port: &str) -> Option<&SigSpec> {
        self.connections.get(port)
    }

    /// Returns a parameter as an unsigned integer, if set and fully defined.
    pub fn param_u64(&self, name: &str) -> Option<u64> {
        self.parameters.get(name).and_then(Const::as_u64)
    }

    /// Returns `true` if the parameter is set to a nonzero value.
    pub fn param_bool(&self, name: &str) -> bool {
        self.parameters.get(name).is_some_and(Const::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let cell = Cell::new("\\u0", "$and")
            .with_param("\\A_WIDTH", Const::from_u64(4, 32))
            .with_param("\\A_SIGNED", Const::from_u64(0, 1))
            .with_port("\\A", SigSpec::wire_range(&IdString::public("a"), 0, 4));
        assert_eq!(cell.param_u64("\\A_WIDTH"), Some(4));
        assert!(!cell.param_bool("\\A_SIGNED"));
        assert_eq!(cell.port("\\A").map(SigSpec::width), Some(4));
        assert!(cell.port("\\B").is_none());
    }

    #[test]
    fn type_field_is_named_type() {
        let cell = Cell::new("\\u0", "$not");
        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(json["type"], "$not");
    }
}
