use crate::candidate::PlacementCandidate;
use crate::config::OptimizerConfig;
use crate::coverage::CoverageAnalyzer;
use context_catalog::{expand_braces, DirectoryCatalog, PatternMatcher};
use context_protocol::path_filters::relative_display;
use context_protocol::{
    Instruction, OptimizationDecision, PlacementMap, PlacementOutcome, PlacementStrategy,
    GLOBAL_PATTERN_LABEL,
};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Everything one optimization pass produces
#[derive(Debug, Clone, Default)]
pub struct PlacementOutput {
    pub placement_map: PlacementMap,
    pub decisions: Vec<OptimizationDecision>,
    pub warnings: Vec<String>,
}

/// Chooses where each instruction is materialized.
///
/// Every directory holding a file an instruction's scope matches ends up
/// with that instruction on an ancestor-or-self placement. Efficiency is only
/// optimized inside that constraint.
#[derive(Debug, Clone, Default)]
pub struct PlacementOptimizer {
    config: OptimizerConfig,
}

impl PlacementOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Place every instruction, in input order.
    pub fn place(
        &self,
        instructions: &[Instruction],
        catalog: &mut DirectoryCatalog,
        matcher: &mut PatternMatcher,
    ) -> PlacementOutput {
        let coverage = CoverageAnalyzer::new(catalog.root());
        let mut output = PlacementOutput::default();

        for instruction in instructions {
            let decision = match instruction.scope() {
                None => self.place_global(instruction, catalog),
                Some(pattern) => self.place_scoped(
                    instruction,
                    pattern,
                    catalog,
                    matcher,
                    &coverage,
                    &mut output.warnings,
                ),
            };

            for directory in &decision.placements {
                output.placement_map.place(directory.clone(), instruction);
            }
            output.decisions.push(decision);
        }

        log::info!(
            "Placed {} instructions into {} locations ({} warnings)",
            instructions.len(),
            output.placement_map.len(),
            output.warnings.len()
        );
        output
    }

    /// Spread of `matching` over the catalog, weighted by depth variance.
    pub fn distribution_score(
        &self,
        matching: &BTreeSet<PathBuf>,
        catalog: &DirectoryCatalog,
    ) -> f64 {
        let total = catalog.len();
        if total == 0 || matching.is_empty() {
            return 0.0;
        }

        let base_ratio = matching.len() as f64 / total as f64;
        let depths: Vec<f64> = matching
            .iter()
            .map(|directory| catalog.depth_of(directory) as f64)
            .collect();
        let mean = depths.iter().sum::<f64>() / depths.len() as f64;
        let variance =
            depths.iter().map(|depth| (depth - mean).powi(2)).sum::<f64>() / depths.len() as f64;

        base_ratio * (1.0 + variance * self.config.diversity_factor)
    }

    pub fn strategy_for(&self, distribution_score: f64) -> PlacementStrategy {
        if distribution_score < self.config.single_point_threshold {
            PlacementStrategy::SinglePoint
        } else if distribution_score > self.config.distributed_threshold {
            PlacementStrategy::Distributed
        } else {
            PlacementStrategy::SelectiveMulti
        }
    }

    fn place_global(&self, instruction: &Instruction, catalog: &DirectoryCatalog) -> OptimizationDecision {
        log::debug!("'{}' has no scope, placing at project root", instruction.name);
        OptimizationDecision {
            instruction: instruction.name.clone(),
            pattern: GLOBAL_PATTERN_LABEL.to_string(),
            matching_directories: catalog.len(),
            total_directories: catalog.len(),
            distribution_score: 1.0,
            strategy: PlacementStrategy::Distributed,
            outcome: PlacementOutcome::Covered,
            placements: vec![catalog.root().to_path_buf()],
            reasoning: "Global instruction placed at project root".to_string(),
            relevance_score: 1.0,
        }
    }

    fn place_scoped(
        &self,
        instruction: &Instruction,
        pattern: &str,
        catalog: &mut DirectoryCatalog,
        matcher: &mut PatternMatcher,
        coverage: &CoverageAnalyzer,
        warnings: &mut Vec<String>,
    ) -> OptimizationDecision {
        let matching = matcher.matching_directories(pattern, catalog);
        if matching.is_empty() {
            return self.place_unmatched(instruction, pattern, catalog, warnings);
        }

        let distribution_score = self.distribution_score(&matching, catalog);
        let strategy = self.strategy_for(distribution_score);
        let (placements, reasoning) = match strategy {
            PlacementStrategy::SinglePoint => (
                self.single_point(&matching, pattern, catalog, coverage),
                "Low distribution pattern optimized for minimal pollution".to_string(),
            ),
            PlacementStrategy::Distributed => (
                vec![catalog.root().to_path_buf()],
                "High distribution pattern placed at root to minimize duplication".to_string(),
            ),
            PlacementStrategy::SelectiveMulti => {
                match self.selective_multi(&matching, pattern, catalog, coverage, warnings) {
                    Ok(chosen) => (
                        chosen,
                        "Medium distribution pattern with selective high-relevance placement"
                            .to_string(),
                    ),
                    Err(covering) => {
                        let reasoning = format!(
                            "Medium distribution pattern; selective placement left matches uncovered, fell back to covering ancestor '{}'",
                            relative_display(catalog.root(), &covering)
                        );
                        (vec![covering], reasoning)
                    }
                }
            }
        };
        let (placements, reasoning) =
            match Self::enforce_coverage(&placements, &matching, pattern, coverage) {
                Some(covering) => {
                    let reasoning = format!(
                        "Placement left matches uncovered, fell back to covering ancestor '{}'",
                        relative_display(catalog.root(), &covering)
                    );
                    (vec![covering], reasoning)
                }
                None => (placements, reasoning),
            };

        let relevance_score = placements
            .first()
            .and_then(|primary| catalog.get(primary))
            .map(|record| record.relevance(pattern))
            .unwrap_or(0.0);

        log::debug!(
            "'{}' ({}): {}/{} directories, score {:.3}, {} -> {:?}",
            instruction.name,
            pattern,
            matching.len(),
            catalog.len(),
            distribution_score,
            strategy,
            placements
                .iter()
                .map(|placement| relative_display(catalog.root(), placement))
                .collect::<Vec<_>>()
        );

        OptimizationDecision {
            instruction: instruction.name.clone(),
            pattern: pattern.to_string(),
            matching_directories: matching.len(),
            total_directories: catalog.len(),
            distribution_score,
            strategy,
            outcome: PlacementOutcome::Covered,
            placements,
            reasoning,
            relevance_score,
        }
    }

    fn place_unmatched(
        &self,
        instruction: &Instruction,
        pattern: &str,
        catalog: &DirectoryCatalog,
        warnings: &mut Vec<String>,
    ) -> OptimizationDecision {
        let root = catalog.root().to_path_buf();
        let intended = intended_directory(pattern)
            .map(|segment| root.join(segment))
            .filter(|directory| catalog.has_directory(directory));

        let (placement, outcome, reasoning, warning) = match intended {
            Some(directory) => {
                let shown = relative_display(&root, &directory);
                (
                    directory,
                    PlacementOutcome::FallbackIntended,
                    format!("No matching files found, placed in intended directory '{shown}'"),
                    format!("Pattern '{pattern}' matches no files - placing in intended directory '{shown}'"),
                )
            }
            None => (
                root.clone(),
                PlacementOutcome::FallbackRoot,
                "No matching files found, fallback to root placement".to_string(),
                format!("Pattern '{pattern}' matches no files - placing at project root"),
            ),
        };

        log::warn!("{warning}");
        warnings.push(warning);
        log::debug!("'{}' routed by fallback: {:?}", instruction.name, outcome);

        OptimizationDecision {
            instruction: instruction.name.clone(),
            pattern: pattern.to_string(),
            matching_directories: 0,
            total_directories: catalog.len(),
            distribution_score: 0.0,
            strategy: PlacementStrategy::Distributed,
            outcome,
            placements: vec![placement],
            reasoning,
            relevance_score: 0.0,
        }
    }

    /// Best single coverage-complete candidate.
    fn single_point(
        &self,
        matching: &BTreeSet<PathBuf>,
        pattern: &str,
        catalog: &DirectoryCatalog,
        coverage: &CoverageAnalyzer,
    ) -> Vec<PathBuf> {
        let candidates = Self::candidates(matching, pattern, catalog, coverage);
        let best = candidates
            .iter()
            .filter(|candidate| {
                coverage
                    .covered_set(std::iter::once(&candidate.directory), matching)
                    .len()
                    == matching.len()
            })
            .max_by(|left, right| left.single_point_order(right));

        match best {
            Some(candidate) => vec![candidate.directory.clone()],
            None => vec![coverage.minimal_covering_ancestor(matching)],
        }
    }

    /// Covering ancestor when it is below root, otherwise the high-relevance set.
    ///
    /// `Err` carries the covering ancestor used when the selected set leaves a
    /// matching directory uncovered.
    fn selective_multi(
        &self,
        matching: &BTreeSet<PathBuf>,
        pattern: &str,
        catalog: &DirectoryCatalog,
        coverage: &CoverageAnalyzer,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<PathBuf>, PathBuf> {
        let covering = coverage.minimal_covering_ancestor(matching);
        if covering != coverage.root() {
            return Ok(vec![covering]);
        }

        let candidates = Self::candidates(matching, pattern, catalog, coverage);
        let mut efficiencies: Vec<f64> = candidates
            .iter()
            .map(|candidate| candidate.coverage_efficiency)
            .collect();
        efficiencies.sort_by(|left, right| right.total_cmp(left));
        let top_fifth = efficiencies
            .get(efficiencies.len() / 5)
            .copied()
            .unwrap_or(0.0);
        let threshold = self.config.high_relevance_threshold.min(top_fifth);

        let mut chosen: Vec<PathBuf> = candidates
            .iter()
            .filter(|candidate| candidate.coverage_efficiency >= threshold)
            .map(|candidate| candidate.directory.clone())
            .collect();
        if chosen.is_empty() {
            if let Some(best) = candidates.iter().max_by(|left, right| {
                left.total_score
                    .total_cmp(&right.total_score)
                    .then_with(|| right.directory.cmp(&left.directory))
            }) {
                chosen.push(best.directory.clone());
            }
        }

        // Nested placements add nothing an ancestor placement does not.
        let selected = chosen.clone();
        chosen.retain(|directory| {
            !selected
                .iter()
                .any(|other| other != directory && directory.starts_with(other))
        });

        let covered = coverage.covered_set(&chosen, matching);
        if covered.len() < matching.len() {
            let warning = format!(
                "Pattern '{}' selective placement leaves {} matching directories uncovered - placing at '{}'",
                pattern,
                matching.len() - covered.len(),
                relative_display(coverage.root(), &covering)
            );
            log::warn!("{warning}");
            warnings.push(warning);
            return Err(covering);
        }

        Ok(chosen)
    }

    /// Matching directories plus every directory between them and their covering ancestor.
    fn candidates(
        matching: &BTreeSet<PathBuf>,
        pattern: &str,
        catalog: &DirectoryCatalog,
        coverage: &CoverageAnalyzer,
    ) -> Vec<PlacementCandidate> {
        let covering = coverage.minimal_covering_ancestor(matching);
        let directories: BTreeSet<PathBuf> = matching
            .iter()
            .flat_map(|directory| coverage.ancestors_up_to(directory, &covering))
            .collect();

        directories
            .iter()
            .map(|directory| PlacementCandidate::evaluate(directory, pattern, catalog))
            .collect()
    }

    /// Covering ancestor replacing `placements` when they miss a matching directory.
    fn enforce_coverage(
        placements: &[PathBuf],
        matching: &BTreeSet<PathBuf>,
        pattern: &str,
        coverage: &CoverageAnalyzer,
    ) -> Option<PathBuf> {
        if !placements.is_empty() && coverage.covered_set(placements, matching).len() == matching.len() {
            return None;
        }
        let covering = coverage.minimal_covering_ancestor(matching);
        log::warn!(
            "Placement for '{}' left matches uncovered, using {}",
            pattern,
            covering.display()
        );
        Some(covering)
    }
}

/// Literal first directory a pattern names, e.g. `docs` for `docs/**/*.md`.
///
/// `None` for patterns without a directory part, patterns starting with `**`
/// and first segments holding glob metacharacters.
pub fn intended_directory(pattern: &str) -> Option<String> {
    let first = expand_braces(pattern).into_iter().next()?;
    if first.starts_with("**") || !first.contains('/') {
        return None;
    }

    let segment = first.split('/').next()?;
    let is_literal = !segment.is_empty()
        && !segment.contains(|c: char| matches!(c, '*' | '?' | '[' | ']' | '{' | '}'));
    is_literal.then(|| segment.to_string())
}
