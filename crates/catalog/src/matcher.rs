use crate::braces::expand_braces;
use crate::catalog::DirectoryCatalog;
use context_protocol::path_filters::join_relative;
use globset::{GlobBuilder, GlobMatcher};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Resolves scope globs against a [`DirectoryCatalog`].
///
/// All caches live inside the matcher. Build a new one for every compilation
/// so nothing keyed on old filesystem state survives.
#[derive(Debug, Default)]
pub struct PatternMatcher {
    /// `**` sub-pattern -> matching root-relative files
    expansions: HashMap<String, BTreeSet<String>>,
    /// Compiled globs; `None` for patterns that failed to compile
    globs: HashMap<String, Option<GlobMatcher>>,
    /// Raw pattern -> directories with at least one match
    resolved: HashMap<String, BTreeSet<PathBuf>>,
}

impl PatternMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories holding at least one file that `pattern` matches.
    ///
    /// Records the per-directory match count for every catalogued directory
    /// (zero included), so later relevance lookups never re-match.
    pub fn matching_directories(
        &mut self,
        pattern: &str,
        catalog: &mut DirectoryCatalog,
    ) -> BTreeSet<PathBuf> {
        if let Some(hit) = self.resolved.get(pattern) {
            return hit.clone();
        }

        let counts = self.count_matches(pattern, catalog);

        let directories: Vec<PathBuf> = catalog.directories().cloned().collect();
        for directory in &directories {
            let count = counts.get(directory).copied().unwrap_or(0);
            if let Some(record) = catalog.get_mut(directory) {
                record.record_matches(pattern, count);
            }
        }

        let matched: BTreeSet<PathBuf> = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(directory, _)| directory)
            .collect();

        log::debug!(
            "Pattern '{}' matches files in {} of {} directories",
            pattern,
            matched.len(),
            catalog.len()
        );

        self.resolved.insert(pattern.to_string(), matched.clone());
        matched
    }

    /// Number of files directly in `directory` that `pattern` matches.
    ///
    /// Served from the catalog memo; uncatalogued directories hold no files.
    pub fn count_in_directory(
        &mut self,
        pattern: &str,
        directory: &Path,
        catalog: &mut DirectoryCatalog,
    ) -> usize {
        let Some(record) = catalog.get(directory) else {
            return 0;
        };
        if let Some(count) = record.match_count(pattern) {
            return count;
        }

        self.matching_directories(pattern, catalog);
        catalog
            .get(directory)
            .and_then(|record| record.match_count(pattern))
            .unwrap_or(0)
    }

    /// True when `relative_file` (root-relative, forward slashes) matches `pattern`.
    pub fn file_matches(&mut self, pattern: &str, relative_file: &str) -> bool {
        expand_braces(pattern)
            .iter()
            .any(|sub_pattern| self.sub_pattern_matches(sub_pattern, relative_file))
    }

    fn count_matches(
        &mut self,
        pattern: &str,
        catalog: &DirectoryCatalog,
    ) -> BTreeMap<PathBuf, usize> {
        let mut matched_files: BTreeSet<String> = BTreeSet::new();
        for sub_pattern in expand_braces(pattern) {
            if sub_pattern.contains("**") {
                matched_files.extend(self.expand_recursive(&sub_pattern, catalog).iter().cloned());
            } else {
                for file in catalog.files() {
                    if self.sub_pattern_matches(&sub_pattern, file) {
                        matched_files.insert(file.clone());
                    }
                }
            }
        }

        let mut counts: BTreeMap<PathBuf, usize> = BTreeMap::new();
        for file in matched_files {
            let parent = file.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
            *counts
                .entry(join_relative(catalog.root(), parent))
                .or_insert(0) += 1;
        }
        counts
    }

    /// Whole-project expansion of a `**` sub-pattern, computed once per sub-pattern.
    fn expand_recursive(&mut self, sub_pattern: &str, catalog: &DirectoryCatalog) -> &BTreeSet<String> {
        if !self.expansions.contains_key(sub_pattern) {
            let glob = self.glob(sub_pattern);
            let files: BTreeSet<String> = match glob {
                Some(glob) => catalog
                    .files()
                    .iter()
                    .filter(|file| glob.is_match(file.as_str()))
                    .cloned()
                    .collect(),
                None => BTreeSet::new(),
            };
            self.expansions.insert(sub_pattern.to_string(), files);
        }
        &self.expansions[sub_pattern]
    }

    fn sub_pattern_matches(&mut self, sub_pattern: &str, relative_file: &str) -> bool {
        let Some(glob) = self.glob(sub_pattern) else {
            return false;
        };
        if glob.is_match(relative_file) {
            return true;
        }
        // Slash-free patterns also match by bare file name.
        if !sub_pattern.contains('/') && !sub_pattern.contains("**") {
            let name = relative_file.rsplit('/').next().unwrap_or(relative_file);
            return glob.is_match(name);
        }
        false
    }

    fn glob(&mut self, sub_pattern: &str) -> Option<GlobMatcher> {
        self.globs
            .entry(sub_pattern.to_string())
            .or_insert_with(|| {
                match GlobBuilder::new(sub_pattern).literal_separator(true).build() {
                    Ok(glob) => Some(glob.compile_matcher()),
                    Err(e) => {
                        log::debug!("Invalid glob pattern '{sub_pattern}': {e}");
                        None
                    }
                }
            })
            .clone()
    }
}
