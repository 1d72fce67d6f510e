use context_protocol::path_filters::is_within;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Pure path arithmetic for the coverage guarantee.
///
/// A placement covers a directory when it is that directory or one of its
/// ancestors. Nothing here touches the filesystem.
#[derive(Debug, Clone)]
pub struct CoverageAnalyzer {
    root: PathBuf,
}

impl CoverageAnalyzer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deepest directory that is an ancestor-or-self of every member.
    ///
    /// One member yields itself; no shared segments (or no members) yields root.
    pub fn minimal_covering_ancestor<I, P>(&self, directories: I) -> PathBuf
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut shared: Option<Vec<String>> = None;

        for directory in directories {
            let Ok(relative) = directory.as_ref().strip_prefix(&self.root) else {
                return self.root.clone();
            };
            let segments: Vec<String> = relative
                .components()
                .filter_map(|component| match component {
                    Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();

            shared = Some(match shared {
                None => segments,
                Some(prefix) => prefix
                    .into_iter()
                    .zip(segments)
                    .take_while(|(left, right)| left == right)
                    .map(|(left, _)| left)
                    .collect(),
            });
        }

        shared
            .unwrap_or_default()
            .iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// True when `placement` is `target` or one of its ancestors (segment-wise).
    pub fn is_covered(&self, target: &Path, placement: &Path) -> bool {
        is_within(target, placement)
    }

    /// Members of `targets` reachable from at least one of `placements`.
    pub fn covered_set<'a, P, T>(&self, placements: P, targets: T) -> BTreeSet<PathBuf>
    where
        P: IntoIterator<Item = &'a PathBuf>,
        T: IntoIterator<Item = &'a PathBuf>,
    {
        let placements: Vec<&PathBuf> = placements.into_iter().collect();
        targets
            .into_iter()
            .filter(|target| {
                placements
                    .iter()
                    .any(|placement| self.is_covered(target, placement))
            })
            .cloned()
            .collect()
    }

    /// `directory` followed by each parent, up to and including `stop`.
    ///
    /// Stops at the project root when `stop` is not an ancestor.
    pub fn ancestors_up_to(&self, directory: &Path, stop: &Path) -> Vec<PathBuf> {
        let mut chain = Vec::new();
        for ancestor in directory.ancestors() {
            if !ancestor.starts_with(&self.root) {
                break;
            }
            chain.push(ancestor.to_path_buf());
            if ancestor == stop || ancestor == self.root {
                break;
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyzer() -> CoverageAnalyzer {
        CoverageAnalyzer::new("/repo")
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn single_directory_covers_itself() {
        let mca = analyzer().minimal_covering_ancestor(paths(&["/repo/src/a"]));
        assert_eq!(mca, PathBuf::from("/repo/src/a"));
    }

    #[test]
    fn shared_prefix_is_segment_wise() {
        let mca = analyzer()
            .minimal_covering_ancestor(paths(&["/repo/src/app/x", "/repo/src/apple/y"]));
        assert_eq!(mca, PathBuf::from("/repo/src"));
    }

    #[test]
    fn disjoint_or_empty_sets_collapse_to_root() {
        let analyzer = analyzer();
        assert_eq!(
            analyzer.minimal_covering_ancestor(paths(&["/repo/a", "/repo/b"])),
            PathBuf::from("/repo")
        );
        assert_eq!(
            analyzer.minimal_covering_ancestor(Vec::<PathBuf>::new()),
            PathBuf::from("/repo")
        );
    }

    #[test]
    fn coverage_is_not_string_prefix() {
        let analyzer = analyzer();
        assert!(analyzer.is_covered(Path::new("/repo/src/a"), Path::new("/repo/src")));
        assert!(analyzer.is_covered(Path::new("/repo/src"), Path::new("/repo/src")));
        assert!(!analyzer.is_covered(Path::new("/repo/srcfoo"), Path::new("/repo/src")));
        assert!(!analyzer.is_covered(Path::new("/repo"), Path::new("/repo/src")));
    }

    #[test]
    fn covered_set_unions_placements() {
        let placements = paths(&["/repo/a", "/repo/b/c"]);
        let targets = paths(&["/repo/a/x", "/repo/b/c", "/repo/b/d"]);
        let covered = analyzer().covered_set(&placements, &targets);
        assert_eq!(
            covered.into_iter().collect::<Vec<_>>(),
            paths(&["/repo/a/x", "/repo/b/c"])
        );
    }

    #[test]
    fn ancestors_stop_at_requested_directory() {
        let analyzer = analyzer();
        assert_eq!(
            analyzer.ancestors_up_to(Path::new("/repo/a/b/c"), Path::new("/repo/a")),
            paths(&["/repo/a/b/c", "/repo/a/b", "/repo/a"])
        );
        assert_eq!(
            analyzer.ancestors_up_to(Path::new("/repo/a/b"), Path::new("/elsewhere")),
            paths(&["/repo/a/b", "/repo/a", "/repo"])
        );
    }
}
