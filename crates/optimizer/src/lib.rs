//! # Context Optimizer
//!
//! Decides which directories receive each instruction.
//!
//! ## Routing
//!
//! ```text
//! Instruction
//!     │
//!     ├──> no scope ──────────────> project root
//!     │
//!     ├──> no matching files ─────> intended directory, else root (+ warning)
//!     │
//!     └──> distribution score = matching/total × (1 + 0.5 × depth variance)
//!            ├─ < 0.3  Single Point     best coverage-complete candidate
//!            ├─ > 0.7  Distributed      project root
//!            └─ else   Selective Multi  covering ancestor or high-relevance set
//! ```
//!
//! Candidates are scored as
//! `efficiency × 1.0 + (1 − pollution) × 0.8 − max(0, (depth − 3) × 0.1)`,
//! where pollution only looks at a candidate's direct child directories.
//!
//! ## Example
//!
//! ```no_run
//! use context_catalog::{DirectoryCatalog, PatternMatcher};
//! use context_optimizer::PlacementOptimizer;
//! use context_protocol::{CatalogOptions, Instruction};
//!
//! let mut catalog = DirectoryCatalog::scan(".", &CatalogOptions::default()).unwrap();
//! let mut matcher = PatternMatcher::new();
//! let rust = Instruction::new("rust", ".context/rust.md", "Prefer iterators.")
//!     .with_scope("**/*.rs");
//!
//! let output = PlacementOptimizer::default().place(&[rust], &mut catalog, &mut matcher);
//! for decision in &output.decisions {
//!     println!("{}: {} -> {:?}", decision.instruction, decision.strategy, decision.placements);
//! }
//! ```

mod candidate;
mod config;
mod coverage;
mod inheritance;
mod placement;

pub use candidate::{pollution_score, PlacementCandidate};
pub use config::OptimizerConfig;
pub use coverage::CoverageAnalyzer;
pub use inheritance::{InheritanceAnalysis, InheritanceAnalyzer, OptimizationStats};
pub use placement::{intended_directory, PlacementOptimizer, PlacementOutput};
