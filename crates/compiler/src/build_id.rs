use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Header line replaced by the content hash once the file is final
pub const BUILD_ID_PLACEHOLDER: &str = "<!-- Build ID: __BUILD_ID__ -->";

const BUILD_ID_LEN: usize = 12;

/// Content hash of `content` with the placeholder line left out.
///
/// The hash never covers itself, so finalizing the same content twice gives
/// the same id.
pub fn compute(content: &str) -> String {
    let mut hasher = Sha256::new();
    let mut first = true;
    for line in content.split('\n').filter(|line| !is_placeholder(line)) {
        if !first {
            hasher.update(b"\n");
        }
        hasher.update(line.as_bytes());
        first = false;
    }

    let digest = hasher.finalize();
    let mut id = String::with_capacity(BUILD_ID_LEN);
    for byte in digest.iter().take(BUILD_ID_LEN / 2) {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// Replace the placeholder line with the computed build id.
///
/// Content without a placeholder is returned unchanged.
pub fn finalize(content: &str) -> String {
    if !content.split('\n').any(is_placeholder) {
        return content.to_string();
    }

    let id = compute(content);
    content
        .split('\n')
        .map(|line| {
            if is_placeholder(line) {
                format!("<!-- Build ID: {id} -->")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_placeholder(line: &str) -> bool {
    line.trim() == BUILD_ID_PLACEHOLDER
}
