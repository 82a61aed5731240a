//! Merge engine: fold fresh translations into an existing target mapping.
//!
//! Rules, per source classification:
//! - `added` / `modified` — take the fresh translation; a missing one is a
//!   [`MergeError::MissingTranslation`].
//! - `unchanged` — keep the target value as found, even if a re-translation
//!   was supplied. A target that lacks the path takes the fresh translation
//!   when one exists (see [`pending_paths`]).
//! - `removed` — dropped.
//!
//! Output order is the current source order; target-only paths the source
//! never knew about are kept and appended in their target order.

use crate::changes::{Change, ChangeSet};
use crate::document::FlatMap;
use crate::error::MergeError;
use crate::path::FlatPath;

/// Paths a target needs translated: every added or modified path, plus
/// unchanged paths the target file does not have yet.
pub fn pending_paths(changes: &ChangeSet, target: &FlatMap) -> Vec<FlatPath> {
    changes
        .iter()
        .filter(|(path, change)| match change {
            Change::Added | Change::Modified => true,
            Change::Unchanged => !target.contains(path),
            Change::Removed => false,
        })
        .map(|(path, _)| path.clone())
        .collect()
}

/// Produce the new target mapping.
pub fn merge(
    target: &FlatMap,
    changes: &ChangeSet,
    translations: &FlatMap,
) -> Result<FlatMap, MergeError> {
    let mut out = FlatMap::new();

    for (path, change) in changes.iter() {
        match change {
            Change::Added | Change::Modified => {
                let value = translations
                    .get(path)
                    .ok_or_else(|| MergeError::MissingTranslation {
                        path: path.to_string(),
                    })?;
                out.insert(path.clone(), value.clone());
            }
            Change::Unchanged => {
                if let Some(value) = target.get(path).or_else(|| translations.get(path)) {
                    out.insert(path.clone(), value.clone());
                }
            }
            Change::Removed => {}
        }
    }

    for (path, value) in target {
        if changes.get(path).is_none() {
            out.insert(path.clone(), value.clone());
        }
    }

    Ok(out)
}
