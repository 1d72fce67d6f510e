use context_protocol::path_filters::relative_display;
use context_protocol::CompilationResult;
use std::path::Path;

/// Human-readable summary of a compilation run.
pub fn render_text(root: &Path, result: &CompilationResult) -> String {
    let mut out = String::new();
    let mode = if result.dry_run { " (dry run)" } else { "" };
    out.push_str(&format!("Context compilation{mode}: {}\n", root.display()));

    for file in &result.files {
        let status = if result.dry_run {
            "would write"
        } else if result.written.contains(&file.path) {
            "written"
        } else if result.unchanged.contains(&file.path) {
            "unchanged"
        } else {
            "failed"
        };
        out.push_str(&format!(
            "  {:<11} {} ({} instructions)\n",
            status,
            relative_display(root, &file.path),
            file.instruction_count
        ));
    }
    for path in &result.removed {
        out.push_str(&format!("  {:<11} {}\n", "removed", relative_display(root, path)));
    }

    if !result.decisions.is_empty() {
        out.push_str("\nPlacements:\n");
        for decision in &result.decisions {
            let targets: Vec<String> = decision
                .placements
                .iter()
                .map(|dir| relative_display(root, dir))
                .collect();
            out.push_str(&format!(
                "  {} [{}] {} -> {} (distribution {:.2})\n",
                decision.instruction,
                decision.pattern,
                decision.strategy,
                targets.join(", "),
                decision.distribution_score
            ));
        }
    }

    for warning in &result.warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }
    for error in &result.errors {
        out.push_str(&format!("error: {error}\n"));
    }

    let stats = &result.stats;
    out.push_str(&format!(
        "\n{} files, {} instructions placed, {} directories / {} files analyzed\n",
        stats.files_generated,
        stats.instructions_placed,
        stats.directories_analyzed,
        stats.files_analyzed
    ));
    out.push_str(&format!(
        "Context efficiency {:.1}% (baseline {:.1}%, {:+.1} points) in {}ms",
        stats.average_context_efficiency * 100.0,
        stats.baseline_efficiency * 100.0,
        stats.pollution_improvement * 100.0,
        stats.generation_time_ms
    ));
    out
}
