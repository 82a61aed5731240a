//! Hosting-platform collaborators.
//!
//! The engine never talks to a hosting API directly; it goes through these
//! traits. A repository host implements all three and gets [`RepositoryHost`]
//! for free.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use translatabot_core::RevisionId;

use crate::error::SyncError;

/// Reads repository content at a revision.
#[async_trait]
pub trait ContentReader: Send + Sync {
    /// `Ok(None)` when the file does not exist at `revision`; transport
    /// failures are errors.
    async fn file_content(&self, path: &str, revision: &RevisionId)
        -> Result<Option<String>, SyncError>;

    /// Head revision of `branch`, `Ok(None)` if the branch does not exist.
    async fn branch_head(&self, branch: &str) -> Result<Option<RevisionId>, SyncError>;
}

/// Answers whether a branch name is taken.
#[async_trait]
pub trait BranchNamespace: Send + Sync {
    async fn branch_exists(&self, branch: &str) -> Result<bool, SyncError>;
}

/// Everything needed to publish one change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Branch the pull request targets.
    pub base_branch: String,
    /// Revision the new branch starts from.
    pub base_revision: RevisionId,
    /// New branch to create; must not exist yet.
    pub branch: String,
    /// `(path, content)` pairs written by the single commit.
    pub files: Vec<(String, String)>,
    pub commit_message: String,
    pub title: String,
    pub body: String,
}

/// Handle to an opened pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub branch: String,
    pub commit: RevisionId,
}

/// Creates a branch, a single commit with every file, and a pull request.
///
/// Must be atomic: either all files land in one commit referenced by an open
/// pull request, or nothing is left referenced. Creating a branch that
/// already exists must fail rather than overwrite it.
#[async_trait]
pub trait AtomicPublisher: Send + Sync {
    async fn commit_and_open(&self, request: &CommitRequest) -> Result<PullRequestRef, SyncError>;
}

/// A full hosting backend.
pub trait RepositoryHost: ContentReader + BranchNamespace + AtomicPublisher {}

impl<T: ContentReader + BranchNamespace + AtomicPublisher> RepositoryHost for T {}

/// Input signal for incremental runs: which files an event touched.
///
/// Only a fast "did this file change" test. The authoritative diff is always
/// recomputed from full content, never from `source_patch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFeed {
    pub changed_files: Vec<String>,
    /// Textual patch of the source file, when the platform provides one.
    pub source_patch: Option<String>,
}

impl ChangeFeed {
    pub fn new<I, S>(changed_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            changed_files: changed_files.into_iter().map(Into::into).collect(),
            source_patch: None,
        }
    }

    pub fn touches(&self, path: &str) -> bool {
        let wanted = path.trim_start_matches('/');
        self.changed_files
            .iter()
            .any(|f| f.trim_start_matches('/') == wanted)
    }
}
