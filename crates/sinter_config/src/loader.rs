//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::SinterConfig;
use std::path::Path;

/// The conventional configuration file name.
pub const CONFIG_FILE_NAME: &str = "sinter.toml";

/// Loads and validates a `sinter.toml` configuration file.
///
/// Relative `[techmap] map` paths are resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<SinterConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    if let (Some(map), Some(dir)) = (config.techmap.map.as_mut(), path.parent()) {
        if map.is_relative() {
            *map = dir.join(&*map);
        }
    }
    Ok(config)
}

/// Parses and validates a `sinter.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SinterConfig, ConfigError> {
    let config: SinterConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges that the TOML schema cannot express.
fn validate_config(config: &SinterConfig) -> Result<(), ConfigError> {
    if config.techmap.max_sweeps == Some(0) {
        return Err(ConfigError::ValidationError(
            "techmap.max_sweeps must be positive".to_string(),
        ));
    }
    if config.fsm_detect.encoding.is_empty() {
        return Err(ConfigError::ValidationError(
            "fsm_detect.encoding must not be empty".to_string(),
        ));
    }
    if config.script.commands.iter().any(|c| c.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "script.commands contains an empty command".to_string(),
        ));
    }
    Ok(())
}
