use anyhow::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    context_cli::main_entry()
}
