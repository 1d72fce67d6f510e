use context_protocol::path_filters::depth_below;
use context_protocol::PlacementMap;
use std::path::{Path, PathBuf};

/// Fold directories holding fewer than `min_instructions` instructions into
/// their parent. Returns how many directories were folded.
///
/// Runs deepest level first so a parent that grows from promoted children is
/// judged on its merged count. Promotion only moves instructions upward, so
/// coverage is preserved. The project root is never folded.
pub fn promote_sparse_directories(map: &mut PlacementMap, root: &Path, min_instructions: usize) -> usize {
    if min_instructions <= 1 {
        return 0;
    }

    let max_depth = map
        .directories()
        .filter_map(|directory| depth_below(root, directory))
        .max()
        .unwrap_or(0);

    let mut folded = 0;
    for depth in (1..=max_depth).rev() {
        let level: Vec<PathBuf> = map
            .directories()
            .filter(|directory| depth_below(root, directory) == Some(depth))
            .cloned()
            .collect();

        for directory in level {
            if map.instructions_at(&directory).len() >= min_instructions {
                continue;
            }
            let Some(parent) = directory.parent().map(Path::to_path_buf) else {
                continue;
            };
            let Some(instructions) = map.remove(&directory) else {
                continue;
            };

            log::debug!(
                "Promoting {} instruction(s) from {} to {}",
                instructions.len(),
                directory.display(),
                parent.display()
            );
            map.ensure_directory(parent.clone());
            for instruction in &instructions {
                map.place(parent.clone(), instruction);
            }
            folded += 1;
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_protocol::Instruction;
    use pretty_assertions::assert_eq;

    fn rule(name: &str) -> Instruction {
        Instruction::new(name, format!("/repo/.context/{name}.md"), name).with_scope("**/*")
    }

    #[test]
    fn sparse_directories_cascade_to_root() {
        let mut map = PlacementMap::new();
        map.place("/repo/a/b/c", &rule("deep"));
        map.place("/repo/a", &rule("mid"));
        map.place("/repo/x", &rule("x1"));
        map.place("/repo/x", &rule("x2"));

        let folded = promote_sparse_directories(&mut map, Path::new("/repo"), 2);

        // a/b/c -> a/b (1) -> a (now 2: mid + deep) stays; x stays.
        assert_eq!(folded, 2);
        let dirs: Vec<_> = map.directories().cloned().collect();
        assert_eq!(dirs, vec![PathBuf::from("/repo/a"), PathBuf::from("/repo/x")]);
        let names: Vec<_> = map
            .instructions_at(Path::new("/repo/a"))
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["mid", "deep"]);
    }

    #[test]
    fn duplicates_merge_and_root_is_kept() {
        let shared = rule("shared");
        let mut map = PlacementMap::new();
        map.place("/repo/a", &shared);
        map.place("/repo", &shared);

        promote_sparse_directories(&mut map, Path::new("/repo"), 3);

        assert_eq!(map.len(), 1);
        assert_eq!(map.instructions_at(Path::new("/repo")).len(), 1);
    }

    #[test]
    fn promotion_preserves_coverage() {
        let first = rule("first");
        let second = rule("second");
        let mut map = PlacementMap::new();
        map.place("/repo/src/a", &first);
        map.place("/repo/src/b", &second);

        promote_sparse_directories(&mut map, Path::new("/repo"), 2);

        assert!(map.covers(Path::new("/repo/src/a"), &first));
        assert!(map.covers(Path::new("/repo/src/b"), &second));
        assert!(map.holds(Path::new("/repo/src"), &first));
    }

    #[test]
    fn threshold_of_one_is_a_no_op() {
        let mut map = PlacementMap::new();
        map.place("/repo/a", &rule("only"));
        assert_eq!(promote_sparse_directories(&mut map, Path::new("/repo"), 1), 0);
        assert!(map.contains_directory(Path::new("/repo/a")));
    }
}
