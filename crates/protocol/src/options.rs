use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_FILE_NAME: &str = "AGENTS.md";

/// Configuration for the directory catalog walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogOptions {
    /// Also honor `.gitignore` / git exclude rules while walking
    pub respect_gitignore: bool,

    /// Additional directory names pruned from the walk
    pub extra_ignored: Vec<String>,

    /// File names never catalogued (generated outputs)
    pub excluded_files: Vec<String>,
}

/// Configuration for a distributed compilation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Delete orphaned generated files (ignored on dry runs)
    pub clean_orphaned: bool,

    /// Compute everything but write nothing
    pub dry_run: bool,

    /// Directories holding fewer instructions than this are folded into their parent
    pub min_instructions_per_file: usize,

    /// Emit `<!-- Source: ... -->` attribution comments
    pub source_attribution: bool,

    /// Whether a constitution document exists; `None` probes the project
    pub constitution: Option<bool>,

    /// File name of every generated output file
    pub output_file_name: String,

    pub catalog: CatalogOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            clean_orphaned: false,
            dry_run: false,
            min_instructions_per_file: 1,
            source_attribution: true,
            constitution: None,
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            catalog: CatalogOptions::default(),
        }
    }
}

impl CompileOptions {
    /// Preview configuration: nothing is written or deleted
    pub fn preview() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_instructions_per_file == 0 {
            return Err("min_instructions_per_file must be >= 1".to_string());
        }

        let name = self.output_file_name.trim();
        if name.is_empty() {
            return Err("output_file_name must not be empty".to_string());
        }
        if name.contains('/') || name.contains('\\') {
            return Err(format!(
                "output_file_name ({name}) must be a bare file name"
            ));
        }

        Ok(())
    }

    /// Parse the `[compile]` table of a project config file.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw).context("Invalid config file")?;
        Ok(file.compile)
    }
}

/// On-disk project config file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub compile: CompileOptions,
}
