//! Synthesis passes for sinter.
//!
//! Passes operate in place on a [`sinter_ir::Design`] and are looked up by
//! name through a [`PassRegistry`], so a script like
//! `"techmap -max_sweeps 8; fsm_detect"` runs them in order. Two passes ship
//! with the crate:
//!
//! - `techmap` replaces every cell that has a template in a [`Library`] with
//!   the template's contents, sweeping until nothing more expands.
//! - `fsm_detect` tags state registers of finite-state machines with the
//!   `\fsm_encoding` attribute.
//!
//! # Usage
//!
//! ```ignore
//! let registry = PassRegistry::with_builtin_passes();
//! let ctx = PassContext::new(&sink, &config);
//! registry.run_script("techmap; fsm_detect", &mut design, &ctx)?;
//! ```

#![warn(missing_docs)]

pub mod codes;
mod error;
pub mod fsm_detect;
pub mod pass;
pub mod techmap;

pub use error::{SynthError, SynthResult};
pub use fsm_detect::FsmDetectPass;
pub use pass::{iterate_to_fixpoint, ModuleFilter, Pass, PassContext, PassRegistry};
pub use techmap::{Library, TechmapEngine, TechmapPass, TechmapStats};
