//! Shared foundational types used across the sinter synthesis toolchain.
//!
//! This crate provides netlist identifiers, 4-state logic values, fixed-width
//! constant vectors, content fingerprints, and the internal error type.

#![warn(missing_docs)]

pub mod constant;
pub mod hash;
pub mod ident;
pub mod logic;
pub mod result;

pub use constant::{Const, ParseConstError};
pub use hash::{ContentHash, ContentHasher};
pub use ident::IdString;
pub use logic::Logic;
pub use result::{InternalError, SinterResult};
