use context_catalog::DirectoryCatalog;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub const COVERAGE_EFFICIENCY_WEIGHT: f64 = 1.0;
pub const POLLUTION_MINIMIZATION_WEIGHT: f64 = 0.8;

/// Depth below which no nesting penalty applies
pub const DEPTH_PENALTY_START: usize = 3;
pub const DEPTH_PENALTY_FACTOR: f64 = 0.1;

/// Penalty for a direct child with no matching files
pub const UNRELATED_CHILD_PENALTY: f64 = 0.5;
/// Penalty for a direct child whose relevance is below [`WEAK_RELEVANCE_THRESHOLD`]
pub const WEAK_CHILD_PENALTY: f64 = 0.2;
pub const WEAK_RELEVANCE_THRESHOLD: f64 = 0.1;

/// A directory considered for one instruction, with its objective scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementCandidate {
    pub directory: PathBuf,
    pub depth: usize,

    /// Fraction of the directory's own files the pattern matches
    pub coverage_efficiency: f64,

    /// Penalty from direct children the pattern does not concern
    pub pollution_score: f64,

    pub maintenance_locality: f64,
    pub depth_penalty: f64,
    pub total_score: f64,
}

impl PlacementCandidate {
    /// Score `directory` for `pattern`.
    ///
    /// Relies on match counts already recorded in the catalog; directories
    /// the catalog does not hold (no files) score zero efficiency.
    pub fn evaluate(directory: &Path, pattern: &str, catalog: &DirectoryCatalog) -> Self {
        let depth = catalog.depth_of(directory);
        let coverage_efficiency = catalog
            .get(directory)
            .map(|record| record.relevance(pattern))
            .unwrap_or(0.0);
        let pollution_score = pollution_score(directory, pattern, catalog);
        let maintenance_locality = coverage_efficiency.min(1.0);
        let depth_penalty =
            depth.saturating_sub(DEPTH_PENALTY_START) as f64 * DEPTH_PENALTY_FACTOR;

        let total_score = coverage_efficiency * COVERAGE_EFFICIENCY_WEIGHT
            + (1.0 - pollution_score) * POLLUTION_MINIMIZATION_WEIGHT
            - depth_penalty;

        Self {
            directory: directory.to_path_buf(),
            depth,
            coverage_efficiency,
            pollution_score,
            maintenance_locality,
            depth_penalty,
            total_score,
        }
    }

    /// Efficiency net of pollution; the single-point objective.
    pub fn balance(&self) -> f64 {
        self.coverage_efficiency - self.pollution_score
    }

    /// Single-point preference: balance, then total score, then locality,
    /// then shallower, then lexicographically smaller path.
    pub fn single_point_order(&self, other: &Self) -> Ordering {
        self.balance()
            .total_cmp(&other.balance())
            .then_with(|| self.total_score.total_cmp(&other.total_score))
            .then_with(|| {
                self.maintenance_locality
                    .total_cmp(&other.maintenance_locality)
            })
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| other.directory.cmp(&self.directory))
    }
}

/// Pollution from the catalogued direct children of `directory`.
///
/// Only one level is inspected; grandchildren never contribute.
pub fn pollution_score(directory: &Path, pattern: &str, catalog: &DirectoryCatalog) -> f64 {
    catalog
        .children_of(directory)
        .map(|child| {
            let relevance = child.relevance(pattern);
            if relevance == 0.0 {
                UNRELATED_CHILD_PENALTY
            } else if relevance < WEAK_RELEVANCE_THRESHOLD {
                WEAK_CHILD_PENALTY
            } else {
                0.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_catalog::PatternMatcher;
    use context_protocol::CatalogOptions;

    fn scored(files: &[&str], pattern: &str) -> DirectoryCatalog {
        let mut catalog = DirectoryCatalog::from_paths(
            "/repo",
            files.iter().copied(),
            std::iter::empty::<&str>(),
            &CatalogOptions::default(),
        );
        PatternMatcher::new().matching_directories(pattern, &mut catalog);
        catalog
    }

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn pollution_counts_direct_children_only() {
        let catalog = scored(
            &["a/x.rs", "a/docs/readme.md", "a/docs/deep/y.md", "a/src/lib.rs"],
            "**/*.rs",
        );
        // docs is unrelated (+0.5); src is fully relevant; docs/deep is a grandchild.
        assert!(close(pollution_score(Path::new("/repo/a"), "**/*.rs", &catalog), 0.5));
    }

    #[test]
    fn weakly_relevant_children_cost_less() {
        let mut files = vec!["top.rs".to_string(), "big/one.rs".to_string()];
        files.extend((0..19).map(|i| format!("big/f{i}.txt")));
        let catalog = scored(
            &files.iter().map(String::as_str).collect::<Vec<_>>(),
            "**/*.rs",
        );
        // big: 1 of 20 files match -> relevance 0.05 -> weak penalty
        assert!(close(pollution_score(Path::new("/repo"), "**/*.rs", &catalog), 0.2));
    }

    #[test]
    fn total_score_combines_objectives_with_depth_penalty() {
        let catalog = scored(&["a/b/c/d/e/x.rs", "a/b/c/d/e/y.md"], "**/*.rs");
        let candidate = PlacementCandidate::evaluate(Path::new("/repo/a/b/c/d/e"), "**/*.rs", &catalog);

        assert_eq!(candidate.depth, 5);
        assert!(close(candidate.coverage_efficiency, 0.5));
        assert!(close(candidate.pollution_score, 0.0));
        assert!(close(candidate.depth_penalty, 0.2));
        assert!(close(candidate.total_score, 0.5 + 0.8 - 0.2));
    }

    #[test]
    fn uncatalogued_directory_has_zero_efficiency() {
        let catalog = scored(&["a/b/x.rs"], "**/*.rs");
        let candidate = PlacementCandidate::evaluate(Path::new("/repo/a"), "**/*.rs", &catalog);
        assert!(close(candidate.coverage_efficiency, 0.0));
        assert!(close(candidate.total_score, 0.8));
    }

    #[test]
    fn single_point_order_prefers_shallower_on_ties() {
        let catalog = scored(&["a/x.rs", "b/c/y.rs"], "**/*.rs");
        let shallow = PlacementCandidate::evaluate(Path::new("/repo/a"), "**/*.rs", &catalog);
        let deep = PlacementCandidate::evaluate(Path::new("/repo/b/c"), "**/*.rs", &catalog);
        assert_eq!(shallow.single_point_order(&deep), Ordering::Greater);
    }
}
