use context_protocol::path_filters::relative_key;
use context_protocol::CatalogOptions;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Directory where installed dependency packages live.
pub const DEPENDENCY_DIRECTORY: &str = "apm_modules";

/// Directory names pruned from every walk (in addition to hidden ones).
pub const IGNORED_DIRECTORIES: &[&str] = &[
    "node_modules",
    "__pycache__",
    "dist",
    "build",
    "target",
    DEPENDENCY_DIRECTORY,
];

/// True for hidden names and names on the fixed (or extra) ignore list.
pub fn is_ignored_directory_name(name: &str, extra: &[String]) -> bool {
    name.starts_with('.')
        || IGNORED_DIRECTORIES.contains(&name)
        || extra.iter().any(|candidate| candidate == name)
}

/// Raw result of one walk, as root-relative forward-slash paths
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Non-hidden files outside pruned directories
    pub files: Vec<String>,

    /// Every directory visited (root is the empty string)
    pub directories: Vec<String>,

    /// Entries that could not be read
    pub skipped: Vec<String>,
}

/// Single-pass walker for the project tree
pub struct TreeScanner {
    root: PathBuf,
    options: CatalogOptions,
}

impl TreeScanner {
    pub fn new(root: impl AsRef<Path>, options: CatalogOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    /// Walk the tree once, pruning hidden and ignored directories before descent.
    pub fn scan(&self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let respect_gitignore = self.options.respect_gitignore;
        let canonical_root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .hidden(true)
            .parents(respect_gitignore)
            .git_ignore(respect_gitignore)
            .git_global(respect_gitignore)
            .git_exclude(respect_gitignore)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let extra = self.options.extra_ignored.clone();
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            if !is_dir {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !is_ignored_directory_name(&name, &extra)
        });

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    let Some(relative) = relative_key(&self.root, entry.path()) else {
                        continue;
                    };

                    if file_type.is_dir() {
                        outcome.directories.push(relative);
                        continue;
                    }

                    // Symlinks count when they resolve to a regular file inside the root.
                    let is_file = file_type.is_file()
                        || (file_type.is_symlink()
                            && resolves_inside(entry.path(), &canonical_root));
                    let excluded = entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.options.excluded_files.iter().any(|x| x == name));
                    if is_file && !excluded {
                        outcome.files.push(relative);
                    }
                }
                Err(e) => {
                    log::debug!("Skipping unreadable entry: {e}");
                    outcome.skipped.push(e.to_string());
                }
            }
        }

        log::info!(
            "Scanned {} files in {} directories",
            outcome.files.len(),
            outcome.directories.len()
        );
        outcome
    }
}

fn resolves_inside(link: &Path, canonical_root: &Path) -> bool {
    match link.canonicalize() {
        Ok(target) if target.is_file() && target.starts_with(canonical_root) => true,
        Ok(target) => {
            log::debug!(
                "Skipping symlink {} -> {}",
                link.display(),
                target.display()
            );
            false
        }
        Err(_) => false,
    }
}
