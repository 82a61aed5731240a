//! Change detection between two revisions of the source document.

use std::fmt;

use indexmap::IndexMap;

use crate::document::FlatMap;
use crate::path::FlatPath;

/// Classification of one path between two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Added,
    Modified,
    Removed,
    Unchanged,
}

impl Change {
    /// `true` for paths whose current value must be (re)translated.
    pub fn needs_translation(self) -> bool {
        matches!(self, Change::Added | Change::Modified)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added => write!(f, "added"),
            Change::Modified => write!(f, "modified"),
            Change::Removed => write!(f, "removed"),
            Change::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Per-path classification covering every path of both revisions exactly once.
///
/// Ordering: paths of the current revision in document order, followed by
/// removed paths in their previous-revision order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    entries: IndexMap<FlatPath, Change>,
}

/// Counts per classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSummary {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl ChangeSet {
    pub fn get(&self, path: &FlatPath) -> Option<Change> {
        self.entries.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlatPath, Change)> {
        self.entries.iter().map(|(p, c)| (p, *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Added and modified paths, in current document order.
    pub fn to_translate(&self) -> impl Iterator<Item = &FlatPath> {
        self.entries
            .iter()
            .filter(|(_, c)| c.needs_translation())
            .map(|(p, _)| p)
    }

    pub fn removed(&self) -> impl Iterator<Item = &FlatPath> {
        self.entries
            .iter()
            .filter(|(_, c)| **c == Change::Removed)
            .map(|(p, _)| p)
    }

    /// `true` when no path was added, modified or removed.
    pub fn is_noop(&self) -> bool {
        self.entries.values().all(|c| *c == Change::Unchanged)
    }

    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for change in self.entries.values() {
            match change {
                Change::Added => summary.added += 1,
                Change::Modified => summary.modified += 1,
                Change::Removed => summary.removed += 1,
                Change::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} modified, {} removed, {} unchanged",
            self.added, self.modified, self.removed, self.unchanged
        )
    }
}

/// Classify every path of `previous` ∪ `current`.
///
/// Values are compared with exact string equality.
pub fn diff(previous: &FlatMap, current: &FlatMap) -> ChangeSet {
    let mut entries = IndexMap::with_capacity(current.len());
    for (path, value) in current {
        let change = match previous.get(path) {
            None => Change::Added,
            Some(old) if old == value => Change::Unchanged,
            Some(_) => Change::Modified,
        };
        entries.insert(path.clone(), change);
    }
    for path in previous.paths() {
        if !current.contains(path) {
            entries.insert(path.clone(), Change::Removed);
        }
    }
    ChangeSet { entries }
}
