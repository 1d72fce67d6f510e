use std::path::{Component, Path, PathBuf};

/// Normalize a user- or manifest-supplied relative path: forward slashes, no
/// leading `./`, no surrounding slashes. `"."` becomes the empty string.
pub fn normalize_relative(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while let Some(rest) = value.strip_prefix("./") {
        value = rest.to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

/// `path` relative to `root`, rendered with forward slashes (`"."` for root).
pub fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => join_components(rel),
        Err(_) => path.display().to_string(),
    }
}

/// Root-relative path with forward slashes; empty for root itself.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(join_components)
}

/// Segment-wise containment: `ancestor` is `path` or one of its parents.
pub fn is_within(path: &Path, ancestor: &Path) -> bool {
    path.starts_with(ancestor)
}

/// Number of normal segments between `root` and `path`.
pub fn depth_below(root: &Path, path: &Path) -> Option<usize> {
    path.strip_prefix(root).ok().map(|rel| {
        rel.components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count()
    })
}

/// Join a normalized relative path onto `root`.
pub fn join_relative(root: &Path, relative: &str) -> PathBuf {
    let normalized = normalize_relative(relative);
    if normalized.is_empty() {
        return root.to_path_buf();
    }
    normalized
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

fn join_components(rel: &Path) -> String {
    rel.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize_relative("./src/lib/"), "src/lib");
        assert_eq!(normalize_relative("src\\lib"), "src/lib");
        assert_eq!(normalize_relative("."), "");
        assert_eq!(normalize_relative("./"), "");
        assert_eq!(normalize_relative("////"), "");
    }

    #[test]
    fn containment_is_segment_wise() {
        let root = Path::new("/repo/src");
        assert!(is_within(Path::new("/repo/src/lib"), root));
        assert!(is_within(Path::new("/repo/src"), root));
        assert!(!is_within(Path::new("/repo/src2/lib"), root));
        assert!(!is_within(Path::new("/repo"), root));
    }

    #[test]
    fn relative_rendering() {
        let root = Path::new("/repo");
        assert_eq!(relative_display(root, Path::new("/repo")), ".");
        assert_eq!(relative_display(root, Path::new("/repo/a/b")), "a/b");
        assert_eq!(relative_key(root, Path::new("/repo")), Some(String::new()));
        assert_eq!(relative_key(root, Path::new("/elsewhere")), None);
    }

    #[test]
    fn depth_counts_segments() {
        let root = Path::new("/repo");
        assert_eq!(depth_below(root, Path::new("/repo")), Some(0));
        assert_eq!(depth_below(root, Path::new("/repo/a/b/c")), Some(3));
        assert_eq!(depth_below(root, Path::new("/other")), None);
    }

    #[test]
    fn join_relative_handles_root() {
        let root = Path::new("/repo");
        assert_eq!(join_relative(root, "."), PathBuf::from("/repo"));
        assert_eq!(join_relative(root, "./a/b/"), PathBuf::from("/repo/a/b"));
    }
}
