use crate::error::{CatalogError, Result};
use crate::scanner::{is_ignored_directory_name, ScanOutcome, TreeScanner};
use context_protocol::path_filters::{depth_below, join_relative, normalize_relative, relative_key};
use context_protocol::CatalogOptions;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// File distribution of one directory that holds at least one file
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryRecord {
    /// Absolute directory path
    pub path: PathBuf,

    /// Segments below the project root (root is 0)
    pub depth: usize,

    /// Non-hidden files directly inside the directory
    pub file_count: usize,

    /// Dotted extensions seen (`""` for files without one)
    pub extensions: BTreeSet<String>,

    /// Sorted file names
    pub files: Vec<String>,

    pattern_matches: HashMap<String, usize>,
}

impl DirectoryRecord {
    fn new(path: PathBuf, depth: usize) -> Self {
        Self {
            path,
            depth,
            file_count: 0,
            extensions: BTreeSet::new(),
            files: Vec::new(),
            pattern_matches: HashMap::new(),
        }
    }

    fn add_file(&mut self, name: &str) {
        let extension = Path::new(name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        self.extensions.insert(extension);
        self.files.push(name.to_string());
        self.file_count += 1;
    }

    /// Memoized count of files matching `pattern`, if already computed.
    pub fn match_count(&self, pattern: &str) -> Option<usize> {
        self.pattern_matches.get(pattern).copied()
    }

    /// Fraction of this directory's files matched by `pattern` (0 when unknown).
    pub fn relevance(&self, pattern: &str) -> f64 {
        if self.file_count == 0 {
            return 0.0;
        }
        self.match_count(pattern).unwrap_or(0) as f64 / self.file_count as f64
    }

    pub(crate) fn record_matches(&mut self, pattern: &str, count: usize) {
        self.pattern_matches.insert(pattern.to_string(), count);
    }
}

/// Per-directory view of the project, built by one walk.
///
/// Lives for a single compilation; nothing here is shared across runs.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
    records: BTreeMap<PathBuf, DirectoryRecord>,
    known_directories: BTreeSet<PathBuf>,
    files: Vec<String>,
    skipped: Vec<String>,
}

impl DirectoryCatalog {
    /// Walk `root` on disk. A missing root is fatal; unreadable subtrees are skipped.
    pub fn scan(root: impl AsRef<Path>, options: &CatalogOptions) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(CatalogError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(CatalogError::NotADirectory(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let outcome = TreeScanner::new(&root, options.clone()).scan();
        Ok(Self::build(root, outcome))
    }

    /// Build a catalog from a virtual tree of root-relative paths.
    ///
    /// `directories` only needs to list directories that hold no files (for
    /// example an empty `docs/`); parents of files are implied.
    pub fn from_paths<F, D>(
        root: impl Into<PathBuf>,
        files: F,
        directories: D,
        options: &CatalogOptions,
    ) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut outcome = ScanOutcome::default();
        for file in files {
            let file = normalize_relative(file.as_ref());
            if file.is_empty() || !Self::virtual_path_visible(&file, true, options) {
                continue;
            }
            outcome.files.push(file);
        }
        for dir in directories {
            let dir = normalize_relative(dir.as_ref());
            if Self::virtual_path_visible(&dir, false, options) {
                outcome.directories.push(dir);
            }
        }
        outcome.files.sort();
        Self::build(root.into(), outcome)
    }

    fn virtual_path_visible(relative: &str, is_file: bool, options: &CatalogOptions) -> bool {
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let dir_segments = if is_file {
            segments.len().saturating_sub(1)
        } else {
            segments.len()
        };
        let dirs_visible = segments[..dir_segments]
            .iter()
            .all(|segment| !is_ignored_directory_name(segment, &options.extra_ignored));
        let file_visible = !is_file
            || segments.last().is_some_and(|name| {
                !name.starts_with('.') && !options.excluded_files.iter().any(|x| x == name)
            });
        dirs_visible && file_visible
    }

    fn build(root: PathBuf, outcome: ScanOutcome) -> Self {
        let mut records: BTreeMap<PathBuf, DirectoryRecord> = BTreeMap::new();
        let mut known_directories: BTreeSet<PathBuf> = BTreeSet::new();
        known_directories.insert(root.clone());

        for dir in &outcome.directories {
            remember_with_ancestors(&mut known_directories, &root, &join_relative(&root, dir));
        }

        for file in &outcome.files {
            let (dir_rel, name) = match file.rsplit_once('/') {
                Some((dir, name)) => (dir, name),
                None => ("", file.as_str()),
            };
            let dir_path = join_relative(&root, dir_rel);

            // Parents of a file are known directories even in virtual trees.
            remember_with_ancestors(&mut known_directories, &root, &dir_path);

            let depth = depth_below(&root, &dir_path).unwrap_or(0);
            records
                .entry(dir_path.clone())
                .or_insert_with(|| DirectoryRecord::new(dir_path, depth))
                .add_file(name);
        }

        for record in records.values_mut() {
            record.files.sort();
        }

        let mut files = outcome.files;
        files.sort();

        log::debug!(
            "Catalogued {} directories with files under {}",
            records.len(),
            root.display()
        );

        Self {
            root,
            records,
            known_directories,
            files,
            skipped: outcome.skipped,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, directory: &Path) -> Option<&DirectoryRecord> {
        self.records.get(directory)
    }

    pub(crate) fn get_mut(&mut self, directory: &Path) -> Option<&mut DirectoryRecord> {
        self.records.get_mut(directory)
    }

    /// True when `directory` holds files (is a catalogued record).
    pub fn contains(&self, directory: &Path) -> bool {
        self.records.contains_key(directory)
    }

    /// True when the walk saw `directory`, whether or not it holds files.
    pub fn has_directory(&self, directory: &Path) -> bool {
        self.known_directories.contains(directory)
    }

    pub fn records(&self) -> impl Iterator<Item = &DirectoryRecord> {
        self.records.values()
    }

    pub fn directories(&self) -> impl Iterator<Item = &PathBuf> {
        self.records.keys()
    }

    /// Catalogued directories whose parent is `directory`.
    pub fn children_of<'a>(
        &'a self,
        directory: &'a Path,
    ) -> impl Iterator<Item = &'a DirectoryRecord> + 'a {
        self.records
            .values()
            .filter(move |record| record.path.parent() == Some(directory))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn depth_of(&self, path: &Path) -> usize {
        depth_below(&self.root, path).unwrap_or(0)
    }

    /// Root-relative key of `path` (empty for root).
    pub fn relative(&self, path: &Path) -> String {
        relative_key(&self.root, path).unwrap_or_default()
    }

    /// All catalogued files as sorted root-relative paths.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn total_files(&self) -> usize {
        self.records.values().map(|record| record.file_count).sum()
    }

    pub fn extensions(&self) -> BTreeSet<String> {
        self.records
            .values()
            .flat_map(|record| record.extensions.iter().cloned())
            .collect()
    }

    pub fn max_depth(&self) -> usize {
        self.records
            .values()
            .map(|record| record.depth)
            .max()
            .unwrap_or(0)
    }

    /// Entries the walk could not read.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

fn remember_with_ancestors(known: &mut BTreeSet<PathBuf>, root: &Path, directory: &Path) {
    for ancestor in directory.ancestors() {
        if !ancestor.starts_with(root) {
            break;
        }
        known.insert(ancestor.to_path_buf());
    }
}
