//! Reading and writing designs in the JSON netlist interchange format.
//!
//! The format is the serde encoding of [`Design`]. Loaded designs are checked
//! with [`Design::check`] so that passes can rely on the IR invariants.

use crate::design::Design;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading a netlist file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read or written.
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The content is not a valid netlist document.
    #[error("{}:{line}:{column}: {message}", path.display())]
    Parse {
        /// The file being parsed (`<string>` for in-memory input).
        path: PathBuf,
        /// 1-based line of the error.
        line: usize,
        /// 1-based column of the error.
        column: usize,
        /// The parser's description.
        message: String,
    },

    /// The document parsed but violates a netlist invariant.
    #[error("invalid netlist in '{}': {message}", path.display())]
    Invalid {
        /// The file being loaded.
        path: PathBuf,
        /// The violated invariant.
        message: String,
    },
}

fn parse(content: &str, path: &Path) -> Result<Design, LoadError> {
    let design: Design = serde_json::from_str(content).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;
    design.check().map_err(|e| LoadError::Invalid {
        path: path.to_path_buf(),
        message: e.message,
    })?;
    Ok(design)
}

/// Parses a design from a JSON string.
pub fn design_from_str(content: &str) -> Result<Design, LoadError> {
    parse(content, Path::new("<string>"))
}

/// Reads a design from a JSON file.
pub fn read_design(path: &Path) -> Result<Design, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content, path)
}

/// Serializes a design to pretty-printed JSON.
pub fn design_to_string(design: &Design) -> String {
    // Every IR type serializes infallibly: all map keys are strings.
    serde_json::to_string_pretty(design).unwrap_or_default()
}

/// Writes a design to a JSON file.
pub fn write_design(design: &Design, path: &Path) -> Result<(), LoadError> {
    std::fs::write(path, design_to_string(design)).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
