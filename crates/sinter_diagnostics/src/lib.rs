//! Diagnostic creation, severity management, and rendering.
//!
//! Passes report progress, soft failures, and fatal conditions as structured
//! [`Diagnostic`] messages. The thread-safe [`DiagnosticSink`] accumulates
//! them during a run, and [`DiagnosticRenderer`] implementations format them
//! for the terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Location};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
