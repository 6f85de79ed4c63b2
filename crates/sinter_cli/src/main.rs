//! Sinter CLI, the command-line front end for the sinter synthesis passes.
//!
//! Provides `sinter run` for loading a JSON netlist, running a pass script
//! over it and writing the result, and `sinter passes` for listing the
//! registered passes.

#![warn(missing_docs)]

mod passes;
mod pipeline;
mod run;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Sinter, a logic-synthesis pass runner.
#[derive(Parser, Debug)]
#[command(name = "sinter", version, about = "Sinter logic synthesis")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `sinter.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output format for diagnostics.
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a pass script over a design.
    Run(RunArgs),
    /// List the registered passes.
    Passes,
}

/// Arguments for the `sinter run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Input netlist in JSON form.
    pub design: String,

    /// Pass script such as `"techmap -map cells.json; fsm_detect"`. May be
    /// repeated; scripts run in order. Defaults to `[script] commands` from
    /// the configuration.
    #[arg(short = 'p', long = "pass")]
    pub scripts: Vec<String>,

    /// Where to write the resulting netlist. Printed to stdout if omitted.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
    /// Diagnostic output format.
    pub format: ReportFormat,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        format: cli.format,
    };

    init_tracing(&global);

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::Passes => passes::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the `tracing` subscriber. `RUST_LOG` takes precedence over the
/// level implied by `--verbose` and `--quiet`.
fn init_tracing(global: &GlobalArgs) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .try_init();
}
