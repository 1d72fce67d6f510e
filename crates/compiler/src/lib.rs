//! # Context Compiler
//!
//! Turns scoped instructions into `AGENTS.md` files spread over a project.
//!
//! ## Pipeline
//!
//! ```text
//! Instructions + project root
//!     │
//!     ├──> Directory Catalog (one walk)
//!     │
//!     ├──> Placement Optimizer ──> placement map + decisions + warnings
//!     │
//!     ├──> Promotion (min instructions per file)
//!     │
//!     ├──> Rendering (sorted pattern sections, build-id placeholder)
//!     │
//!     ├──> Orphan scan (marked files not produced this run)
//!     │
//!     └──> Writer (build id, skip unchanged, temp file + rename)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_compiler::DistributedCompiler;
//! use context_protocol::{CompileOptions, Instruction};
//!
//! fn main() -> context_compiler::Result<()> {
//!     let instructions = vec![
//!         Instruction::new("rust", ".context/rust.md", "Run clippy before committing.")
//!             .with_scope("**/*.rs"),
//!     ];
//!
//!     let result = DistributedCompiler::new("/path/to/project", CompileOptions::default())
//!         .compile(&instructions)?;
//!
//!     for warning in &result.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     println!("{} files generated", result.stats.files_generated);
//!     Ok(())
//! }
//! ```

pub mod build_id;
mod compiler;
pub mod content;
mod error;
mod orphans;
mod promotion;
mod writer;

pub use compiler::{DistributedCompiler, CONSTITUTION_RELATIVE_PATH};
pub use content::{render_agents_file, GENERATOR_MARKER};
pub use error::{CompilerError, Result};
pub use orphans::{find_orphans, orphan_warnings};
pub use promotion::promote_sparse_directories;
pub use writer::{write_generated, WriteStatus};
