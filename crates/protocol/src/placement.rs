use crate::instruction::Instruction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Strategy chosen for an instruction based on its distribution score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Narrow pattern: one placement as close to the matches as coverage allows
    SinglePoint,
    /// Medium spread: a covering ancestor or a few high-relevance directories
    SelectiveMulti,
    /// Broad pattern (or global instruction): project root
    Distributed,
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SinglePoint => "Single Point",
            Self::SelectiveMulti => "Selective Multi",
            Self::Distributed => "Distributed",
        };
        f.write_str(label)
    }
}

/// How a placement was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementOutcome {
    /// Placement derived from matching files
    Covered,
    /// Pattern matched nothing; placed in the directory the pattern names
    FallbackIntended,
    /// Pattern matched nothing; placed at project root
    FallbackRoot,
}

/// Audit record for one instruction's placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationDecision {
    pub instruction: String,
    pub pattern: String,
    pub matching_directories: usize,
    pub total_directories: usize,
    pub distribution_score: f64,
    pub strategy: PlacementStrategy,
    pub outcome: PlacementOutcome,
    pub placements: Vec<PathBuf>,
    pub reasoning: String,
    /// Coverage efficiency of the primary placement
    pub relevance_score: f64,
}

impl OptimizationDecision {
    pub fn distribution_ratio(&self) -> f64 {
        if self.total_directories == 0 {
            return 0.0;
        }
        self.matching_directories as f64 / self.total_directories as f64
    }
}

/// Directory → instructions materialized there.
///
/// Keys are kept sorted so iteration (and therefore generated output) is
/// deterministic. Within a directory instructions keep discovery order and
/// appear at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementMap {
    entries: BTreeMap<PathBuf, Vec<Instruction>>,
}

impl PlacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `instruction` at `directory`; returns `false` if it was already there.
    pub fn place(&mut self, directory: impl Into<PathBuf>, instruction: &Instruction) -> bool {
        let slot = self.entries.entry(directory.into()).or_default();
        if slot.iter().any(|existing| existing.same_as(instruction)) {
            return false;
        }
        slot.push(instruction.clone());
        true
    }

    /// Make sure `directory` has an entry, even an empty one.
    pub fn ensure_directory(&mut self, directory: impl Into<PathBuf>) {
        self.entries.entry(directory.into()).or_default();
    }

    pub fn remove(&mut self, directory: &Path) -> Option<Vec<Instruction>> {
        self.entries.remove(directory)
    }

    pub fn instructions_at(&self, directory: &Path) -> &[Instruction] {
        self.entries
            .get(directory)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn holds(&self, directory: &Path, instruction: &Instruction) -> bool {
        self.instructions_at(directory)
            .iter()
            .any(|existing| existing.same_as(instruction))
    }

    /// True when some ancestor-or-self of `target` holds `instruction`.
    pub fn covers(&self, target: &Path, instruction: &Instruction) -> bool {
        target
            .ancestors()
            .any(|ancestor| self.holds(ancestor, instruction))
    }

    pub fn contains_directory(&self, directory: &Path) -> bool {
        self.entries.contains_key(directory)
    }

    pub fn directories(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<Instruction>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total placements across all directories (an instruction placed twice counts twice).
    pub fn instruction_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Identities of every instruction placed anywhere.
    pub fn placed_identities(&self) -> BTreeSet<&Path> {
        self.entries
            .values()
            .flatten()
            .map(Instruction::identity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn instruction(name: &str) -> Instruction {
        Instruction::new(name, format!("/repo/.context/{name}.md"), "body").with_scope("**/*.rs")
    }

    #[test]
    fn place_deduplicates_by_identity() {
        let mut map = PlacementMap::new();
        let a = instruction("a");
        assert!(map.place("/repo/src", &a));
        assert!(!map.place("/repo/src", &a));
        assert_eq!(map.instructions_at(Path::new("/repo/src")).len(), 1);
        assert_eq!(map.instruction_count(), 1);
    }

    #[test]
    fn covers_through_ancestors() {
        let mut map = PlacementMap::new();
        let a = instruction("a");
        map.place("/repo/src", &a);
        assert!(map.covers(Path::new("/repo/src/deep/nested"), &a));
        assert!(map.covers(Path::new("/repo/src"), &a));
        assert!(!map.covers(Path::new("/repo/srcx"), &a));
        assert!(!map.covers(Path::new("/repo"), &a));
    }

    #[test]
    fn keys_iterate_sorted() {
        let mut map = PlacementMap::new();
        let a = instruction("a");
        map.place("/repo/z", &a);
        map.place("/repo/a", &a);
        map.ensure_directory("/repo");
        let keys: Vec<_> = map.directories().cloned().collect();
        assert_eq!(
            keys,
            vec![
                PathBuf::from("/repo"),
                PathBuf::from("/repo/a"),
                PathBuf::from("/repo/z")
            ]
        );
    }

    #[test]
    fn distribution_ratio_handles_empty_catalog() {
        let decision = OptimizationDecision {
            instruction: "a".into(),
            pattern: "*.rs".into(),
            matching_directories: 0,
            total_directories: 0,
            distribution_score: 0.0,
            strategy: PlacementStrategy::Distributed,
            outcome: PlacementOutcome::FallbackRoot,
            placements: vec![],
            reasoning: String::new(),
            relevance_score: 0.0,
        };
        assert_eq!(decision.distribution_ratio(), 0.0);
    }
}
