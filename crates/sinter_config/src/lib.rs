//! Parsing and validation of `sinter.toml` configuration files.
//!
//! The configuration supplies defaults for the synthesis passes: the
//! technology-mapping library and sweep limit, the encoding tag written by
//! state-register detection, and the default pass script.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
