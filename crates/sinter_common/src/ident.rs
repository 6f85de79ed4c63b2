//! Netlist identifiers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A name of a module, wire, cell, port, parameter, or attribute.
///
/// Follows the RTLIL naming convention: user-visible names start with `\`,
/// generated names and builtin cell types start with `$`. Library cell-library
/// sources may escape reserved names as `\$name`; see
/// [`unescape_reserved`](Self::unescape_reserved).
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdString(String);

impl IdString {
    /// Creates an identifier from its full spelling, including the sigil.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a public identifier, prepending `\`.
    pub fn public(name: &str) -> Self {
        Self(format!("\\{name}"))
    }

    /// Returns the full spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for user-visible names (leading `\`).
    pub fn is_public(&self) -> bool {
        self.0.starts_with('\\')
    }

    /// Returns `true` for generated names and builtin types (leading `$`).
    pub fn is_internal(&self) -> bool {
        self.0.starts_with('$')
    }

    /// Rewrites an escaped reserved name `\$foo` to `$foo`.
    pub fn unescape_reserved(&self) -> IdString {
        match self.0.strip_prefix("\\$") {
            Some(rest) => IdString(format!("${rest}")),
            None => self.clone(),
        }
    }

    /// Places this name inside the hierarchy level `prefix`.
    ///
    /// Produces `<prefix>.<name>`, dropping the leading `\` of a public name.
    pub fn with_prefix(&self, prefix: &IdString) -> IdString {
        let local = self.0.strip_prefix('\\').unwrap_or(&self.0);
        IdString(format!("{}.{local}", prefix.0))
    }
}

impl Borrow<str> for IdString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdString {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for IdString {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for IdString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for IdString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
