use crate::content::is_generated;
use context_catalog::is_ignored_directory_name;
use context_protocol::path_filters::relative_display;
use context_protocol::CatalogOptions;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Orphans listed by name before the rest are summarized
const MAX_LISTED_ORPHANS: usize = 5;

/// Generated output files under `root` that this run did not produce.
///
/// Only files carrying the generator marker count; hand-written files that
/// happen to share the output name are never reported or removed.
pub fn find_orphans(
    root: &Path,
    output_file_name: &str,
    generated: &BTreeSet<PathBuf>,
    options: &CatalogOptions,
) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_ignored_directory_name(
                    &entry.file_name().to_string_lossy(),
                    &options.extra_ignored,
                )
        });

    let mut orphans = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry during orphan scan: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != output_file_name {
            continue;
        }
        let path = entry.into_path();
        if generated.contains(&path) {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) if is_generated(&content) => orphans.push(path),
            Ok(_) => log::debug!("Ignoring hand-written {}", path.display()),
            Err(e) => log::debug!("Cannot read {}: {e}", path.display()),
        }
    }
    orphans
}

/// Warning text for orphaned files: one line for a single file, a short list otherwise.
pub fn orphan_warnings(root: &Path, orphans: &[PathBuf], output_file_name: &str) -> Vec<String> {
    match orphans {
        [] => Vec::new(),
        [single] => vec![format!(
            "Orphaned {} found: {} - run 'context-compile --clean' to remove",
            output_file_name,
            relative_display(root, single)
        )],
        _ => {
            let mut listed: Vec<String> = orphans
                .iter()
                .take(MAX_LISTED_ORPHANS)
                .map(|path| format!("  - {}", relative_display(root, path)))
                .collect();
            if orphans.len() > MAX_LISTED_ORPHANS {
                listed.push(format!(
                    "  - ...and {} more",
                    orphans.len() - MAX_LISTED_ORPHANS
                ));
            }
            vec![format!(
                "Found {} orphaned {} files:\n{}\n  Run 'context-compile --clean' to remove orphaned files",
                orphans.len(),
                output_file_name,
                listed.join("\n")
            )]
        }
    }
}

/// Delete `orphans`, returning what was removed and a message per file.
pub fn remove_orphans(root: &Path, orphans: &[PathBuf]) -> (Vec<PathBuf>, Vec<String>) {
    let mut removed = Vec::new();
    let mut messages = Vec::new();

    for path in orphans {
        let shown = relative_display(root, path);
        match fs::remove_file(path) {
            Ok(()) => {
                log::info!("Removed orphaned {shown}");
                messages.push(format!("Removed orphaned file {shown}"));
                removed.push(path.clone());
            }
            Err(e) => {
                log::warn!("Failed to remove {shown}: {e}");
                messages.push(format!("Failed to remove orphaned file {shown}: {e}"));
            }
        }
    }
    (removed, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GENERATOR_MARKER;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn generated_file(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("# AGENTS.md\n{GENERATOR_MARKER}\n")).unwrap();
    }

    #[test]
    fn finds_marked_files_outside_the_current_output() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        generated_file(&root.join("AGENTS.md"));
        generated_file(&root.join("src/utils/AGENTS.md"));
        generated_file(&root.join("node_modules/pkg/AGENTS.md"));
        generated_file(&root.join(".git/AGENTS.md"));
        fs::create_dir_all(root.join("manual")).unwrap();
        fs::write(root.join("manual/AGENTS.md"), "hand written").unwrap();

        let current: BTreeSet<PathBuf> = [root.join("AGENTS.md")].into_iter().collect();
        let orphans = find_orphans(root, "AGENTS.md", &current, &CatalogOptions::default());

        assert_eq!(orphans, vec![root.join("src/utils/AGENTS.md")]);
    }

    #[test]
    fn single_orphan_warning_names_the_file() {
        let root = Path::new("/repo");
        let warnings = orphan_warnings(root, &[root.join("src/utils/AGENTS.md")], "AGENTS.md");
        assert_eq!(
            warnings,
            vec!["Orphaned AGENTS.md found: src/utils/AGENTS.md - run 'context-compile --clean' to remove".to_string()]
        );
    }

    #[test]
    fn long_orphan_lists_are_truncated() {
        let root = Path::new("/repo");
        let orphans: Vec<PathBuf> = (0..7).map(|i| root.join(format!("d{i}/AGENTS.md"))).collect();

        let warnings = orphan_warnings(root, &orphans, "AGENTS.md");

        assert_eq!(warnings.len(), 1);
        let text = &warnings[0];
        assert!(text.starts_with("Found 7 orphaned AGENTS.md files:\n"));
        assert!(text.contains("  - d4/AGENTS.md\n"));
        assert!(!text.contains("d5/AGENTS.md"));
        assert!(text.contains("  - ...and 2 more\n"));
    }

    #[test]
    fn removal_reports_each_file() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let stale = root.join("a/AGENTS.md");
        generated_file(&stale);
        let missing = root.join("b/AGENTS.md");

        let (removed, messages) = remove_orphans(root, &[stale.clone(), missing]);

        assert_eq!(removed, vec![stale.clone()]);
        assert!(!stale.exists());
        assert_eq!(messages.len(), 2);
        assert!(messages[1].starts_with("Failed to remove orphaned file b/AGENTS.md"));
    }
}
