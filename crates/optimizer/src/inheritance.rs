use context_catalog::{DirectoryCatalog, PatternMatcher};
use context_protocol::{Instruction, PlacementMap};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What a working directory inherits from the placement map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InheritanceAnalysis {
    pub directory: PathBuf,

    /// Placement directories seen walking up, most specific first
    pub chain: Vec<PathBuf>,

    pub total_inherited: usize,
    pub relevant_inherited: usize,

    /// Share of inherited instructions that concern no file here
    pub pollution: f64,
}

impl InheritanceAnalysis {
    /// Relevant share of the inherited context (1.0 when nothing is inherited).
    pub fn efficiency(&self) -> f64 {
        if self.total_inherited == 0 {
            return 1.0;
        }
        self.relevant_inherited as f64 / self.total_inherited as f64
    }
}

/// Context efficiency summary for a placement map
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationStats {
    pub directories_analyzed: usize,
    pub placement_directories: usize,

    /// Mean efficiency over catalogued directories
    pub average_efficiency: f64,

    /// Mean efficiency if every instruction sat at the project root
    pub baseline_efficiency: f64,

    /// `average_efficiency - baseline_efficiency`
    pub pollution_improvement: f64,
}

/// Measures context pollution along inheritance chains.
///
/// Reporting only; placement never consults it.
#[derive(Debug, Default)]
pub struct InheritanceAnalyzer;

impl InheritanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Walk from `directory` up to the project root collecting inherited instructions.
    pub fn analyze(
        &self,
        directory: &Path,
        placement_map: &PlacementMap,
        catalog: &mut DirectoryCatalog,
        matcher: &mut PatternMatcher,
    ) -> InheritanceAnalysis {
        let root = catalog.root().to_path_buf();
        let mut chain = Vec::new();
        let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
        let mut total_inherited = 0;
        let mut relevant_inherited = 0;

        for ancestor in directory.ancestors() {
            if !ancestor.starts_with(&root) {
                break;
            }
            if placement_map.contains_directory(ancestor) {
                chain.push(ancestor.to_path_buf());
                for instruction in placement_map.instructions_at(ancestor) {
                    if !seen.insert(instruction.identity().to_path_buf()) {
                        continue;
                    }
                    total_inherited += 1;
                    if Self::is_relevant(instruction, directory, catalog, matcher) {
                        relevant_inherited += 1;
                    }
                }
            }
            if ancestor == root {
                break;
            }
        }

        let pollution = if total_inherited == 0 {
            0.0
        } else {
            1.0 - relevant_inherited as f64 / total_inherited as f64
        };

        InheritanceAnalysis {
            directory: directory.to_path_buf(),
            chain,
            total_inherited,
            relevant_inherited,
            pollution,
        }
    }

    /// Average efficiency of `placement_map` and of the everything-at-root baseline.
    pub fn optimization_stats(
        &self,
        placement_map: &PlacementMap,
        instructions: &[Instruction],
        catalog: &mut DirectoryCatalog,
        matcher: &mut PatternMatcher,
    ) -> OptimizationStats {
        let average_efficiency = self.average_efficiency(placement_map, catalog, matcher);

        let mut baseline = PlacementMap::new();
        for instruction in instructions {
            baseline.place(catalog.root().to_path_buf(), instruction);
        }
        let baseline_efficiency = self.average_efficiency(&baseline, catalog, matcher);

        let stats = OptimizationStats {
            directories_analyzed: catalog.len(),
            placement_directories: placement_map.len(),
            average_efficiency,
            baseline_efficiency,
            pollution_improvement: average_efficiency - baseline_efficiency,
        };
        log::debug!(
            "Context efficiency {:.3} (baseline {:.3}) over {} directories",
            stats.average_efficiency,
            stats.baseline_efficiency,
            stats.directories_analyzed
        );
        stats
    }

    fn average_efficiency(
        &self,
        placement_map: &PlacementMap,
        catalog: &mut DirectoryCatalog,
        matcher: &mut PatternMatcher,
    ) -> f64 {
        if placement_map.is_empty() || catalog.is_empty() {
            return 0.0;
        }

        let directories: Vec<PathBuf> = catalog.directories().cloned().collect();
        let total: f64 = directories
            .iter()
            .map(|directory| {
                self.analyze(directory, placement_map, catalog, matcher)
                    .efficiency()
            })
            .sum();
        total / directories.len() as f64
    }

    fn is_relevant(
        instruction: &Instruction,
        directory: &Path,
        catalog: &mut DirectoryCatalog,
        matcher: &mut PatternMatcher,
    ) -> bool {
        match instruction.scope() {
            None => true,
            Some(pattern) => matcher.count_in_directory(pattern, directory, catalog) > 0,
        }
    }
}
