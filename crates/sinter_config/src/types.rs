//! Configuration types deserialized from `sinter.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The encoding tag written on detected state registers when none is configured.
pub const DEFAULT_FSM_ENCODING: &str = "auto";

/// The top-level configuration parsed from `sinter.toml`.
///
/// Every section is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinterConfig {
    /// Technology-mapping defaults.
    #[serde(default)]
    pub techmap: TechmapConfig,
    /// State-register detection defaults.
    #[serde(default)]
    pub fsm_detect: FsmDetectConfig,
    /// The default pass script.
    #[serde(default)]
    pub script: ScriptConfig,
}

/// Defaults for the `techmap` pass.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TechmapConfig {
    /// Library netlist used when no `-map` argument is given.
    #[serde(default)]
    pub map: Option<PathBuf>,
    /// Upper bound on expansion sweeps; unlimited when unset.
    #[serde(default)]
    pub max_sweeps: Option<usize>,
}

/// Defaults for the `fsm_detect` pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FsmDetectConfig {
    /// Value of the `\fsm_encoding` attribute written on each detected register.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl Default for FsmDetectConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
        }
    }
}

fn default_encoding() -> String {
    DEFAULT_FSM_ENCODING.to_string()
}

/// The pass script run by `sinter run` when no `-p` is given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptConfig {
    /// Commands in execution order, each `<pass> [args...]`.
    #[serde(default)]
    pub commands: Vec<String>,
}
