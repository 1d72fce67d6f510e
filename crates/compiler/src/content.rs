use crate::build_id::BUILD_ID_PLACEHOLDER;
use context_protocol::path_filters::relative_display;
use context_protocol::Instruction;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Comment line that identifies a file as produced by this tool
pub const GENERATOR_MARKER: &str =
    "<!-- Generated by context-compile from distributed instruction sources -->";

pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

const GLOBAL_SECTION_TITLE: &str = "## Global instructions";

/// Render one output file for the instructions placed in a directory.
///
/// Globals come first, then one section per distinct scope pattern in
/// lexicographic order. Instructions keep their placement order inside a
/// section. The build-id placeholder is left for [`crate::build_id::finalize`].
pub fn render_agents_file(root: &Path, instructions: &[Instruction], source_attribution: bool) -> String {
    let mut lines: Vec<String> = vec![
        "# AGENTS.md".to_string(),
        GENERATOR_MARKER.to_string(),
        BUILD_ID_PLACEHOLDER.to_string(),
        format!("<!-- Generator Version: {GENERATOR_VERSION} -->"),
    ];

    if source_attribution && !instructions.is_empty() {
        let sources: BTreeSet<String> = instructions
            .iter()
            .map(|instruction| instruction.source.to_string())
            .collect();
        let label = if sources.len() > 1 { "Sources" } else { "Source" };
        let joined = sources.into_iter().collect::<Vec<_>>().join(", ");
        lines.push(format!("<!-- {label}: {joined} -->"));
    }
    lines.push(String::new());

    let globals: Vec<&Instruction> = instructions.iter().filter(|i| i.is_global()).collect();
    if globals.iter().any(|instruction| has_body(instruction)) {
        lines.push(GLOBAL_SECTION_TITLE.to_string());
        lines.push(String::new());
        push_bodies(&mut lines, root, &globals, source_attribution);
    }

    for (pattern, grouped) in group_by_pattern(instructions) {
        lines.push(format!("## Files matching `{pattern}`"));
        lines.push(String::new());
        push_bodies(&mut lines, root, &grouped, source_attribution);
    }

    lines.push("---".to_string());
    lines.push("*This file was generated by context-compile. Do not edit manually.*".to_string());
    lines.push("*To regenerate: `context-compile`*".to_string());
    lines.push(String::new());

    lines.join("\n")
}

/// Distinct scope patterns among `instructions`, sorted.
pub fn patterns_of(instructions: &[Instruction]) -> Vec<String> {
    instructions
        .iter()
        .filter_map(Instruction::scope)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn is_generated(content: &str) -> bool {
    content.lines().any(|line| line.trim() == GENERATOR_MARKER)
}

fn group_by_pattern(instructions: &[Instruction]) -> BTreeMap<&str, Vec<&Instruction>> {
    let mut groups: BTreeMap<&str, Vec<&Instruction>> = BTreeMap::new();
    for instruction in instructions {
        if let Some(pattern) = instruction.scope() {
            groups.entry(pattern).or_default().push(instruction);
        }
    }
    groups
}

fn has_body(instruction: &Instruction) -> bool {
    !instruction.content.trim().is_empty()
}

fn push_bodies(lines: &mut Vec<String>, root: &Path, instructions: &[&Instruction], source_attribution: bool) {
    for instruction in instructions {
        if !has_body(instruction) {
            continue;
        }
        if source_attribution {
            lines.push(format!(
                "<!-- Source: {} {} -->",
                instruction.source,
                relative_display(root, &instruction.file_path)
            ));
        }
        lines.push(instruction.content.trim().to_string());
        lines.push(String::new());
    }
}
