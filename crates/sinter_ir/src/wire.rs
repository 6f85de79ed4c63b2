//! Named multi-bit nets.

use serde::{Deserialize, Serialize};
use sinter_common::{Const, IdString};
use std::collections::BTreeMap;

/// A named net of one or more bits.
///
/// A nonzero `port_id` makes the wire part of the module's interface, with
/// `port_input`/`port_output` giving its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    /// The wire name, unique within its module.
    pub name: IdString,
    /// The number of bits.
    pub width: u32,
    /// Port position (1-based), or 0 for an internal wire.
    #[serde(default)]
    pub port_id: u32,
    /// Whether the port is driven from outside the module.
    #[serde(default)]
    pub port_input: bool,
    /// Whether the port drives a signal outside the module.
    #[serde(default)]
    pub port_output: bool,
    /// Free-form attributes (e.g. `\fsm_encoding`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<IdString, Const>,
}

impl Wire {
    /// Creates an internal wire.
    pub fn new(name: impl Into<IdString>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
            port_id: 0,
            port_input: false,
            port_output: false,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates an input port at position `port_id`.
    pub fn input(name: impl Into<IdString>, width: u32, port_id: u32) -> Self {
        Self {
            port_id,
            port_input: true,
            ..Self::new(name, width)
        }
    }

    /// Creates an output port at position `port_id`.
    pub fn output(name: impl Into<IdString>, width: u32, port_id: u32) -> Self {
        Self {
            port_id,
            port_output: true,
            ..Self::new(name, width)
        }
    }

    /// Returns `true` if the wire is part of the module interface.
    pub fn is_port(&self) -> bool {
        self.port_id != 0
    }

    /// Clears the port role, turning the wire into an internal net.
    pub fn demote_to_internal(&mut self) {
        self.port_id = 0;
        self.port_input = false;
        self.port_output = false;
    }
}
