//! Fatal synthesis errors.

use crate::codes;
use sinter_common::{IdString, InternalError};
use sinter_diagnostics::{Diagnostic, DiagnosticCode};
use std::path::PathBuf;

/// A condition that aborts the current pass run.
///
/// Recoverable situations (an unsupported template, a reconciled width
/// mismatch) are reported as diagnostics instead and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// A technology-mapping template still contains memories.
    #[error("technology map template {template} yielded memories, which is not supported")]
    TemplateHasMemories {
        /// The offending template.
        template: IdString,
    },

    /// A technology-mapping template still contains processes.
    #[error("technology map template {template} yielded processes, which is not supported")]
    TemplateHasProcesses {
        /// The offending template.
        template: IdString,
    },

    /// An instance binds a port that the template does not declare.
    #[error("template {template} has no port {port} (bound on cell {cell})")]
    MissingTemplatePort {
        /// The template being instantiated.
        template: IdString,
        /// The instance being expanded.
        cell: IdString,
        /// The port with no counterpart.
        port: IdString,
    },

    /// An instance sets a parameter that the library module does not declare.
    #[error("module {module} has no parameter {parameter}")]
    UnknownParameter {
        /// The library module.
        module: IdString,
        /// The undeclared parameter.
        parameter: IdString,
    },

    /// The mapping library could not be loaded.
    #[error("can't open map file '{}': {message}", path.display())]
    LibraryLoad {
        /// The library path.
        path: PathBuf,
        /// The loader's description.
        message: String,
    },

    /// Expansion kept changing the design past the sweep limit.
    #[error("technology mapping did not converge within {sweeps} sweeps")]
    NoConvergence {
        /// The configured limit.
        sweeps: usize,
    },

    /// A script named a pass that is not registered.
    #[error("no such pass: {0}")]
    UnknownPass(String),

    /// A pass received an option it does not understand.
    #[error("{pass}: unknown option '{option}'")]
    UnknownOption {
        /// The pass.
        pass: String,
        /// The offending argument.
        option: String,
    },

    /// An option was given without its required value.
    #[error("{pass}: option '{option}' requires {expected}")]
    MissingArgument {
        /// The pass.
        pass: String,
        /// The option.
        option: String,
        /// Description of the expected value.
        expected: &'static str,
    },

    /// An IR invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Result alias for pass operations.
pub type SynthResult<T> = Result<T, SynthError>;

impl SynthError {
    /// Returns the diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            SynthError::TemplateHasMemories { .. } => codes::TEMPLATE_HAS_MEMORIES,
            SynthError::TemplateHasProcesses { .. } => codes::TEMPLATE_HAS_PROCESSES,
            SynthError::MissingTemplatePort { .. } => codes::MISSING_TEMPLATE_PORT,
            SynthError::UnknownParameter { .. } => codes::UNKNOWN_PARAMETER,
            SynthError::LibraryLoad { .. } => codes::LIBRARY_LOAD,
            SynthError::NoConvergence { .. } => codes::NO_CONVERGENCE,
            SynthError::UnknownPass(_) => codes::UNKNOWN_PASS,
            SynthError::UnknownOption { .. } | SynthError::MissingArgument { .. } => {
                codes::UNKNOWN_OPTION
            }
            SynthError::Internal(_) => codes::INTERNAL,
        }
    }

    /// Converts the error into an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code(), self.to_string())
    }
}
