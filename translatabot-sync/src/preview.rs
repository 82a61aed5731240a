//! Unified diff of what a publication would change. Nothing is written.

use similar::TextDiff;

use crate::publish::normalize;

/// A single file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub unified_diff: String,
}

/// Diff `rendered` against the committed `existing` content of `path`.
///
/// `None` when the contents are identical after line-ending normalization;
/// an absent file diffs against the empty string.
pub fn preview(existing: Option<&str>, rendered: &str, path: &str) -> Option<FileDiff> {
    let existing = normalize(existing.unwrap_or_default());
    let rendered = normalize(rendered);
    if existing == rendered {
        return None;
    }

    let old_header = format!("a/{path}");
    let new_header = format!("b/{path}");
    let unified_diff = TextDiff::from_lines(&existing, &rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Some(FileDiff {
        path: path.to_string(),
        unified_diff,
    })
}
