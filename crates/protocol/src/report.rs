use crate::placement::{OptimizationDecision, PlacementMap};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Aggregate statistics about a compilation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationStats {
    /// Number of output files produced (or that would be, on dry runs)
    pub files_generated: usize,

    /// Placements across all output files
    pub instructions_placed: usize,

    /// Sum of distinct patterns per output file
    pub patterns_covered: usize,

    /// Catalogued directories (directories holding files)
    pub directories_analyzed: usize,

    /// Files counted by the catalog
    pub files_analyzed: usize,

    /// Mean share of inherited instructions that are relevant, per directory
    pub average_context_efficiency: f64,

    /// Same metric with every instruction placed at the project root
    pub baseline_efficiency: f64,

    /// Reduction in average pollution versus the baseline
    pub pollution_improvement: f64,

    /// Time taken in milliseconds
    pub generation_time_ms: u64,
}

/// One output file's content, before build-id finalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
    pub instruction_count: usize,
    pub patterns: Vec<String>,
}

/// Everything a compilation produced, for the reporting layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilationResult {
    pub placement_map: PlacementMap,
    pub files: Vec<GeneratedFile>,
    pub decisions: Vec<OptimizationDecision>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub orphaned: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub stats: CompilationStats,
    pub dry_run: bool,
}

impl CompilationResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}
