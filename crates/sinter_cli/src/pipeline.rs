//! Shared helpers for CLI commands: configuration discovery and diagnostic
//! rendering.

use std::path::{Path, PathBuf};

use sinter_config::{SinterConfig, CONFIG_FILE_NAME};
use sinter_diagnostics::{
    Diagnostic, DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer,
};

use crate::{GlobalArgs, ReportFormat};

/// Picks the configuration file to load.
///
/// `--config` wins; otherwise `sinter.toml` in `cwd` is used if present.
pub fn config_path(global: &GlobalArgs, cwd: &Path) -> Option<PathBuf> {
    if let Some(ref path) = global.config {
        return Some(PathBuf::from(path));
    }
    let candidate = cwd.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Loads the configuration selected by [`config_path`], or the defaults when
/// there is none.
pub fn load_config(global: &GlobalArgs) -> Result<SinterConfig, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    match config_path(global, &cwd) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            sinter_config::load_config(&path)
                .map_err(|e| format!("{}: {e}", path.display()).into())
        }
        None => Ok(SinterConfig::default()),
    }
}

/// Renders `diagnostics` to stderr in the selected format.
///
/// With `--quiet` only errors are shown.
pub fn render_diagnostics(diagnostics: &[Diagnostic], global: &GlobalArgs) {
    let renderer: Box<dyn DiagnosticRenderer> = match global.format {
        ReportFormat::Text => Box::new(TerminalRenderer::new(global.color)),
        ReportFormat::Json => Box::new(JsonRenderer),
    };
    for diag in diagnostics {
        if global.quiet && diag.severity != Severity::Error {
            continue;
        }
        eprint!("{}", renderer.render(diag));
    }
}

/// Prints the error and warning totals in text mode.
pub fn print_summary(diagnostics: &[Diagnostic], global: &GlobalArgs) {
    if global.quiet || global.format != ReportFormat::Text {
        return;
    }
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
}
