//! Memories and behavioral processes.
//!
//! Both are carried through the core unelaborated. Passes only need to know
//! that they exist, e.g. technology mapping refuses templates containing them.

use serde::{Deserialize, Serialize};
use sinter_common::{Const, IdString};
use std::collections::BTreeMap;

/// A memory array declared in a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// The memory name.
    pub name: IdString,
    /// Word width in bits.
    pub width: u32,
    /// Number of words.
    pub size: u32,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<IdString, Const>,
}

/// A behavioral process that has not been lowered to cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    /// The process name.
    pub name: IdString,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<IdString, Const>,
}
