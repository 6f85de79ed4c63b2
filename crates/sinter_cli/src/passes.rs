//! `sinter passes`: list the registered passes.

use sinter_synth::PassRegistry;

use crate::{GlobalArgs, ReportFormat};

/// Runs the `sinter passes` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let registry = PassRegistry::with_builtin_passes();
    println!("{}", listing(&registry, global.format)?);
    Ok(0)
}

/// Formats one line per pass, or a JSON array of `{name, help}` objects.
fn listing(
    registry: &PassRegistry,
    format: ReportFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    match format {
        ReportFormat::Text => {
            let width = registry.iter().map(|p| p.name().len()).max().unwrap_or(0);
            let lines: Vec<String> = registry
                .iter()
                .map(|p| format!("{:width$}  {}", p.name(), p.help()))
                .collect();
            Ok(lines.join("\n"))
        }
        ReportFormat::Json => {
            let entries: Vec<serde_json::Value> = registry
                .iter()
                .map(|p| serde_json::json!({ "name": p.name(), "help": p.help() }))
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
    }
}
