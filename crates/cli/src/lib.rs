use anyhow::{bail, Context as AnyhowContext, Result};
use clap::Parser;
use context_compiler::DistributedCompiler;
use context_protocol::{CompileOptions, Instruction};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod report;

/// Project config file read from the root, if present
pub const CONFIG_FILE_NAME: &str = "context-compile.toml";

/// Manifest location relative to the root when `--manifest` is not given
pub const DEFAULT_MANIFEST: &str = ".context/instructions.json";

#[derive(Parser, Debug)]
#[command(name = "context-compile")]
#[command(about = "Compile scoped instructions into per-directory AGENTS.md files", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Instruction manifest (JSON array of instructions)
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Remove orphaned generated files
    #[arg(long)]
    clean: bool,

    /// Compute placements without writing or deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Fold directories with fewer instructions into their parent
    #[arg(long, value_name = "N")]
    min_instructions: Option<usize>,

    /// Omit source attribution comments
    #[arg(long)]
    no_attribution: bool,

    /// Print the full compilation result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Accepted manifest layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<Instruction>),
    Wrapped { instructions: Vec<Instruction> },
}

impl Manifest {
    fn into_instructions(self) -> Vec<Instruction> {
        match self {
            Manifest::List(instructions) | Manifest::Wrapped { instructions } => instructions,
        }
    }
}

pub fn main_entry() -> Result<ExitCode> {
    let mut cli = Cli::parse();
    // stdout carries the JSON report
    if cli.json {
        cli.quiet = true;
    }
    init_logging(&cli);

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let root = fs::canonicalize(&root)
        .with_context(|| format!("Project root {} does not exist", root.display()))?;
    if !root.is_dir() {
        bail!("Project root {} is not a directory", root.display());
    }

    let options = resolve_options(&root, &cli)?;
    let instructions = load_instructions(&root, cli.manifest.as_deref())?;
    log::debug!("Loaded {} instructions", instructions.len());

    let result = DistributedCompiler::new(&root, options)
        .compile(&instructions)
        .with_context(|| format!("Compilation failed for {}", root.display()))?;

    let rendered = if cli.json {
        context_protocol::serialize_json_pretty(&result)?
    } else {
        report::render_text(&root, &result)
    };
    print_stdout(&rendered)?;

    if result.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Config file defaults, then command-line overrides.
fn resolve_options(root: &Path, cli: &Cli) -> Result<CompileOptions> {
    let config_path = root.join(CONFIG_FILE_NAME);
    let mut options = if config_path.is_file() {
        let raw = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        log::debug!("Using config {}", config_path.display());
        CompileOptions::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?
    } else {
        CompileOptions::default()
    };

    if cli.clean {
        options.clean_orphaned = true;
    }
    if cli.dry_run {
        options.dry_run = true;
    }
    if let Some(min) = cli.min_instructions {
        options.min_instructions_per_file = min;
    }
    if cli.no_attribution {
        options.source_attribution = false;
    }

    if let Err(message) = options.validate() {
        bail!("Invalid options: {message}");
    }
    Ok(options)
}

/// Read the manifest and anchor relative instruction paths at `root`.
///
/// A missing default manifest yields no instructions; an explicit one must exist.
fn load_instructions(root: &Path, manifest: Option<&Path>) -> Result<Vec<Instruction>> {
    let path = match manifest {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => std::env::current_dir()
            .context("Failed to read current directory")?
            .join(path),
        None => {
            let path = root.join(DEFAULT_MANIFEST);
            if !path.exists() {
                log::warn!("No manifest at {}, compiling without instructions", path.display());
                return Ok(Vec::new());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid manifest {}", path.display()))?;

    Ok(manifest
        .into_instructions()
        .into_iter()
        .map(|mut instruction| {
            if instruction.file_path.is_relative() {
                instruction.file_path = root.join(&instruction.file_path);
            }
            instruction
        })
        .collect())
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}
