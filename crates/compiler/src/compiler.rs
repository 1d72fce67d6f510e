use crate::content::{patterns_of, render_agents_file};
use crate::error::{CompilerError, Result};
use crate::orphans::{find_orphans, orphan_warnings, remove_orphans};
use crate::promotion::promote_sparse_directories;
use crate::writer::{write_generated, WriteStatus};
use context_catalog::{DirectoryCatalog, PatternMatcher};
use context_optimizer::{InheritanceAnalyzer, OptimizerConfig, PlacementOptimizer};
use context_protocol::path_filters::relative_display;
use context_protocol::{
    CatalogOptions, CompilationResult, CompilationStats, CompileOptions, GeneratedFile,
    Instruction, PlacementMap,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Project-relative location of the constitution document
pub const CONSTITUTION_RELATIVE_PATH: &str = "memory/constitution.md";

/// Compiles instructions into per-directory output files.
///
/// Each [`compile`](Self::compile) call walks the project once and builds its
/// own catalog and matcher; nothing is cached between calls.
pub struct DistributedCompiler {
    root: PathBuf,
    options: CompileOptions,
    optimizer: PlacementOptimizer,
}

impl DistributedCompiler {
    pub fn new(root: impl Into<PathBuf>, options: CompileOptions) -> Self {
        Self {
            root: root.into(),
            options,
            optimizer: PlacementOptimizer::default(),
        }
    }

    pub fn with_optimizer_config(mut self, config: OptimizerConfig) -> Self {
        self.optimizer = PlacementOptimizer::new(config);
        self
    }

    pub fn compile(&self, instructions: &[Instruction]) -> Result<CompilationResult> {
        let started = Instant::now();
        self.options
            .validate()
            .map_err(CompilerError::InvalidOptions)?;
        self.optimizer
            .config()
            .validate()
            .map_err(CompilerError::InvalidOptions)?;

        let output_name = self.options.output_file_name.trim().to_string();
        let mut catalog_options = self.options.catalog.clone();
        if !catalog_options.excluded_files.contains(&output_name) {
            catalog_options.excluded_files.push(output_name.clone());
        }

        let mut catalog = DirectoryCatalog::scan(&self.root, &catalog_options)?;
        let root = catalog.root().to_path_buf();
        let mut matcher = PatternMatcher::new();

        log::info!(
            "Compiling {} instructions across {} directories ({} files)",
            instructions.len(),
            catalog.len(),
            catalog.total_files()
        );

        let placement = self.optimizer.place(instructions, &mut catalog, &mut matcher);

        let mut result = CompilationResult {
            dry_run: self.options.dry_run,
            decisions: placement.decisions,
            ..Default::default()
        };
        for skipped in catalog.skipped() {
            result.add_warning(format!("Skipped unreadable path: {skipped}"));
        }
        result.warnings.extend(placement.warnings);

        let mut placement_map = placement.placement_map;
        if placement_map.is_empty() && self.constitution_present(&root) {
            log::debug!("Constitution present, emitting an empty root file");
            placement_map.ensure_directory(root.clone());
        }

        let folded = promote_sparse_directories(
            &mut placement_map,
            &root,
            self.options.min_instructions_per_file,
        );
        if folded > 0 {
            log::info!(
                "Folded {folded} directories below {} instructions into their parents",
                self.options.min_instructions_per_file
            );
        }

        result.files = self.render(&root, &placement_map, &output_name);

        self.handle_orphans(&root, &output_name, &catalog_options, &mut result);

        for warning in coverage_warnings(&placement_map, instructions) {
            log::warn!("{warning}");
            result.add_warning(warning);
        }

        if !self.options.dry_run {
            self.write_files(&root, &mut result);
        }

        let efficiency = InheritanceAnalyzer::new().optimization_stats(
            &placement_map,
            instructions,
            &mut catalog,
            &mut matcher,
        );
        result.stats = CompilationStats {
            files_generated: result.files.len(),
            instructions_placed: placement_map.instruction_count(),
            patterns_covered: result.files.iter().map(|file| file.patterns.len()).sum(),
            directories_analyzed: catalog.len(),
            files_analyzed: catalog.total_files(),
            average_context_efficiency: efficiency.average_efficiency,
            baseline_efficiency: efficiency.baseline_efficiency,
            pollution_improvement: efficiency.pollution_improvement,
            generation_time_ms: started.elapsed().as_millis() as u64,
        };
        result.placement_map = placement_map;

        log::info!(
            "Generated {} files ({} written, {} unchanged), {} warnings, {} errors in {}ms",
            result.stats.files_generated,
            result.written.len(),
            result.unchanged.len(),
            result.warnings.len(),
            result.errors.len(),
            result.stats.generation_time_ms
        );
        Ok(result)
    }

    fn constitution_present(&self, root: &Path) -> bool {
        self.options
            .constitution
            .unwrap_or_else(|| root.join(CONSTITUTION_RELATIVE_PATH).is_file())
    }

    fn render(&self, root: &Path, placement_map: &PlacementMap, output_name: &str) -> Vec<GeneratedFile> {
        placement_map
            .iter()
            .map(|(directory, placed)| GeneratedFile {
                path: directory.join(output_name),
                content: render_agents_file(root, placed, self.options.source_attribution),
                instruction_count: placed.len(),
                patterns: patterns_of(placed),
            })
            .collect()
    }

    fn handle_orphans(
        &self,
        root: &Path,
        output_name: &str,
        catalog_options: &CatalogOptions,
        result: &mut CompilationResult,
    ) {
        let generated: BTreeSet<PathBuf> = result.files.iter().map(|file| file.path.clone()).collect();
        let orphans = find_orphans(root, output_name, &generated, catalog_options);
        if orphans.is_empty() {
            return;
        }

        for warning in orphan_warnings(root, &orphans, output_name) {
            log::warn!("{warning}");
            result.add_warning(warning);
        }

        if self.options.clean_orphaned && !self.options.dry_run {
            let (removed, messages) = remove_orphans(root, &orphans);
            result.removed = removed;
            result.warnings.extend(messages);
        }
        result.orphaned = orphans;
    }

    fn write_files(&self, root: &Path, result: &mut CompilationResult) {
        let mut written = Vec::new();
        let mut unchanged = Vec::new();
        let mut failures = Vec::new();

        for file in &result.files {
            match write_generated(&file.path, &file.content) {
                Ok(WriteStatus::Written) => written.push(file.path.clone()),
                Ok(WriteStatus::Unchanged) => unchanged.push(file.path.clone()),
                Err(e) => {
                    log::error!("{e}");
                    failures.push(format!(
                        "Failed to write {}: {}",
                        relative_display(root, &file.path),
                        e
                    ));
                }
            }
        }

        result.written = written;
        result.unchanged = unchanged;
        for failure in failures {
            result.add_error(failure);
        }
    }
}

/// One warning per input instruction that no directory holds.
fn coverage_warnings(placement_map: &PlacementMap, instructions: &[Instruction]) -> Vec<String> {
    let placed = placement_map.placed_identities();
    instructions
        .iter()
        .filter(|instruction| !placed.contains(instruction.identity()))
        .map(|instruction| {
            format!(
                "Instruction '{}' ({}) was not placed in any output file",
                instruction.name,
                instruction.file_path.display()
            )
        })
        .collect()
}
