use once_cell::sync::Lazy;
use regex::Regex;

/// Innermost `{...}` group holding at least one comma.
static ALTERNATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*,[^{}]*)\}").expect("alternation regex"));

/// Expand `{a,b}` alternations into the sub-patterns they stand for.
///
/// Every group is expanded (nested groups innermost first), so
/// `src/{a,b}/*.{rs,md}` yields four patterns. Order follows the
/// alternatives left to right; duplicates are dropped. A leading `./` or
/// `/` is stripped since patterns are always root-relative.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let normalized = strip_root_prefix(pattern.trim());
    let mut expanded = Vec::new();
    expand_into(normalized, &mut expanded);

    let mut seen = std::collections::HashSet::new();
    expanded.retain(|candidate| seen.insert(candidate.clone()));
    expanded
}

fn expand_into(pattern: &str, out: &mut Vec<String>) {
    let Some(group) = ALTERNATION.captures(pattern) else {
        out.push(pattern.to_string());
        return;
    };
    let (Some(whole), Some(body)) = (group.get(0), group.get(1)) else {
        out.push(pattern.to_string());
        return;
    };

    let prefix = &pattern[..whole.start()];
    let suffix = &pattern[whole.end()..];
    for alternative in body.as_str().split(',') {
        expand_into(&format!("{prefix}{alternative}{suffix}"), out);
    }
}

fn strip_root_prefix(pattern: &str) -> &str {
    let mut rest = pattern;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            return rest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::expand_braces;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_pattern_passes_through() {
        assert_eq!(expand_braces("src/**/*.rs"), vec!["src/**/*.rs"]);
    }

    #[test]
    fn expands_every_group() {
        assert_eq!(
            expand_braces("src/{a,b}/*.{rs,md}"),
            vec!["src/a/*.rs", "src/a/*.md", "src/b/*.rs", "src/b/*.md"]
        );
    }

    #[test]
    fn nested_groups_expand_innermost_first() {
        assert_eq!(
            expand_braces("{x,{y,z}}.ts"),
            vec!["x.ts", "y.ts", "z.ts"]
        );
    }

    #[test]
    fn strips_root_prefixes_and_dedupes() {
        assert_eq!(expand_braces("./docs/*.md"), vec!["docs/*.md"]);
        assert_eq!(expand_braces("/{a,a}.md"), vec!["a.md"]);
    }

    #[test]
    fn single_alternative_is_left_alone() {
        assert_eq!(expand_braces("*.{rs}"), vec!["*.{rs}"]);
    }
}
