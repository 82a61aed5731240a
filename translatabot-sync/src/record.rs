//! Pull-request record store.
//!
//! One [`PullRequestRecord`] per opened pull request. The file-backed store
//! keeps every record of a repository in one JSON array at
//! `<root>/<owner>/<name>.json`, written with the `.tmp` + rename pattern.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use translatabot_core::{ContentPerFile, PullRequestRecord};

use crate::error::{io_err, SyncError};

/// Longest content kept per file in a record.
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Persistence for pull-request records.
pub trait RecordStore: Send + Sync {
    fn save(&self, record: &PullRequestRecord) -> Result<(), SyncError>;

    fn find(&self, repository: &str, pr_number: u64)
        -> Result<Option<PullRequestRecord>, SyncError>;
}

/// Truncate every file content to [`MAX_CONTENT_LENGTH`] characters.
///
/// Returns the truncated contents and whether anything was cut.
pub fn truncate_contents(files: Vec<ContentPerFile>) -> (Vec<ContentPerFile>, bool) {
    let mut exceeded = false;
    let files = files
        .into_iter()
        .map(|mut file| {
            if let Some((cut, _)) = file.content.char_indices().nth(MAX_CONTENT_LENGTH) {
                file.content.truncate(cut);
                exceeded = true;
            }
            file
        })
        .collect();
    (files, exceeded)
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileRecordStore {
    root: PathBuf,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<repository>.json`; `owner/name` becomes a subdirectory.
    pub fn store_path(&self, repository: &str) -> PathBuf {
        let mut parts: Vec<&str> = repository
            .split('/')
            .filter(|p| !p.is_empty() && *p != "..")
            .collect();
        let file = format!("{}.json", parts.pop().unwrap_or("_"));
        let mut path = self.root.clone();
        path.extend(parts);
        path.push(file);
        path
    }

    fn load(&self, path: &Path) -> Result<Vec<PullRequestRecord>, SyncError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl RecordStore for FileRecordStore {
    fn save(&self, record: &PullRequestRecord) -> Result<(), SyncError> {
        let path = self.store_path(&record.repository);
        let Some(dir) = path.parent() else {
            return Err(io_err(
                path,
                std::io::Error::other("invalid record store path"),
            ));
        };
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let mut records = self.load(&path)?;
        records.retain(|r| r.pr_number != record.pr_number);
        records.push(record.clone());

        let json = serde_json::to_string_pretty(&records)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        tracing::debug!(path = %path.display(), pr = record.pr_number, "saved record");
        Ok(())
    }

    fn find(
        &self,
        repository: &str,
        pr_number: u64,
    ) -> Result<Option<PullRequestRecord>, SyncError> {
        let path = self.store_path(repository);
        Ok(self
            .load(&path)?
            .into_iter()
            .find(|r| r.pr_number == pr_number))
    }
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<(String, u64), PullRequestRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record, ordered by repository then pull request number.
    pub fn all(&self) -> Vec<PullRequestRecord> {
        let mut out: Vec<PullRequestRecord> = self
            .records
            .lock()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default();
        out.sort_by(|a, b| (&a.repository, a.pr_number).cmp(&(&b.repository, b.pr_number)));
        out
    }
}

impl RecordStore for MemoryRecordStore {
    fn save(&self, record: &PullRequestRecord) -> Result<(), SyncError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| SyncError::Host("record store poisoned".to_string()))?;
        records.insert(
            (record.repository.clone(), record.pr_number),
            record.clone(),
        );
        Ok(())
    }

    fn find(
        &self,
        repository: &str,
        pr_number: u64,
    ) -> Result<Option<PullRequestRecord>, SyncError> {
        let records = self
            .records
            .lock()
            .map_err(|_| SyncError::Host("record store poisoned".to_string()))?;
        Ok(records.get(&(repository.to_string(), pr_number)).cloned())
    }
}
