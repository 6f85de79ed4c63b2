//! Diagnostic codes emitted by the synthesis passes.

use sinter_diagnostics::{Category, DiagnosticCode};

/// Template contains memories.
pub const TEMPLATE_HAS_MEMORIES: DiagnosticCode = DiagnosticCode::new(Category::Error, 1);
/// Template contains processes.
pub const TEMPLATE_HAS_PROCESSES: DiagnosticCode = DiagnosticCode::new(Category::Error, 2);
/// Instance port missing from template.
pub const MISSING_TEMPLATE_PORT: DiagnosticCode = DiagnosticCode::new(Category::Error, 3);
/// Undeclared template parameter.
pub const UNKNOWN_PARAMETER: DiagnosticCode = DiagnosticCode::new(Category::Error, 4);
/// Library could not be loaded.
pub const LIBRARY_LOAD: DiagnosticCode = DiagnosticCode::new(Category::Error, 5);
/// Sweep limit exceeded.
pub const NO_CONVERGENCE: DiagnosticCode = DiagnosticCode::new(Category::Error, 6);
/// Unregistered pass name.
pub const UNKNOWN_PASS: DiagnosticCode = DiagnosticCode::new(Category::Error, 7);
/// Bad pass option.
pub const UNKNOWN_OPTION: DiagnosticCode = DiagnosticCode::new(Category::Error, 8);
/// IR invariant violation.
pub const INTERNAL: DiagnosticCode = DiagnosticCode::new(Category::Error, 9);

/// Port widths reconciled by truncation or zero extension.
pub const WIDTH_MISMATCH: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);

/// "Executing ... pass" header.
pub const PASS_HEADER: DiagnosticCode = DiagnosticCode::new(Category::Info, 201);
/// A cell was replaced by its template.
pub const CELL_MAPPED: DiagnosticCode = DiagnosticCode::new(Category::Info, 202);
/// A template was rejected by its failure marker.
pub const TEMPLATE_UNSUPPORTED: DiagnosticCode = DiagnosticCode::new(Category::Info, 203);
/// Technology mapping reached its fixpoint.
pub const MAPPING_DONE: DiagnosticCode = DiagnosticCode::new(Category::Info, 204);
/// A state register was tagged.
pub const FSM_FOUND: DiagnosticCode = DiagnosticCode::new(Category::Info, 205);
