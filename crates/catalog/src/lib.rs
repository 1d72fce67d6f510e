//! # Context Catalog
//!
//! Project structure analysis for instruction placement.
//!
//! ## Pipeline
//!
//! ```text
//! Project root
//!     │
//!     ├──> Tree Scanner (hidden + ignored dirs pruned)
//!     │      └─> Relative file and directory paths
//!     │
//!     ├──> Directory Catalog
//!     │      └─> Per-directory file counts, extensions, match memo
//!     │
//!     └──> Pattern Matcher (brace expansion, cached `**` expansion)
//!            └─> Directories holding files a scope glob matches
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_catalog::{DirectoryCatalog, PatternMatcher};
//! use context_protocol::CatalogOptions;
//!
//! fn main() -> context_catalog::Result<()> {
//!     let mut catalog = DirectoryCatalog::scan("/path/to/project", &CatalogOptions::default())?;
//!     let mut matcher = PatternMatcher::new();
//!     let dirs = matcher.matching_directories("src/**/*.rs", &mut catalog);
//!
//!     println!("{} of {} directories match", dirs.len(), catalog.len());
//!     Ok(())
//! }
//! ```

mod braces;
mod catalog;
mod error;
mod matcher;
mod scanner;

pub use braces::expand_braces;
pub use catalog::{DirectoryCatalog, DirectoryRecord};
pub use error::{CatalogError, Result};
pub use matcher::PatternMatcher;
pub use scanner::{is_ignored_directory_name, TreeScanner, DEPENDENCY_DIRECTORY, IGNORED_DIRECTORIES};
