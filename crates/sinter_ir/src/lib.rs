//! The sinter netlist intermediate representation.
//!
//! A [`Design`] owns [`Module`]s; a module owns [`Wire`]s and [`Cell`]s and
//! an ordered list of direct connections between bit-level [`SigSpec`]s.
//! On top of the data model this crate provides the structural-analysis
//! substrate shared by the synthesis passes: canonical alias resolution
//! ([`SigMap`]), driver/user indexing ([`SignalIndex`]), and the builtin cell
//! capability table ([`celltypes`]).

#![warn(missing_docs)]

pub mod cell;
pub mod celltypes;
pub mod design;
pub mod index;
pub mod io;
pub mod memory;
pub mod module;
pub mod sigmap;
pub mod sigspec;
pub mod wire;

pub use cell::Cell;
pub use celltypes::{CellClass, CellInfo};
pub use design::Design;
pub use index::{PortRef, SignalIndex};
pub use io::LoadError;
pub use memory::{Memory, Process};
pub use module::{Connection, Module};
pub use sigmap::SigMap;
pub use sigspec::{SigBit, SigChunk, SigSpec};
pub use wire::Wire;
