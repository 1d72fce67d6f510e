//! # Context Protocol
//!
//! Shared data model for the context placement pipeline: instructions coming
//! in from discovery, placement decisions coming out of the optimizer, and the
//! compilation report handed to whatever renders it.

use anyhow::Result;
use serde::Serialize;

mod instruction;
mod options;
pub mod path_filters;
mod placement;
mod report;

pub use instruction::{Instruction, InstructionSource};
pub use options::{CatalogOptions, CompileOptions, ConfigFile, DEFAULT_OUTPUT_FILE_NAME};
pub use placement::{OptimizationDecision, PlacementMap, PlacementOutcome, PlacementStrategy};
pub use report::{CompilationResult, CompilationStats, GeneratedFile};

/// Pattern label used in decisions for instructions without a scope.
pub const GLOBAL_PATTERN_LABEL: &str = "(global)";

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
