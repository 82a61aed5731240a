//! In-memory repository host.
//!
//! Models branches, immutable revisions (full file snapshots) and opened pull
//! requests. Used by the test suites and the CLI; it implements every
//! hosting collaborator with the same atomicity rules a real backend must
//! honour.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use translatabot_core::RevisionId;

use crate::error::SyncError;
use crate::host::{AtomicPublisher, BranchNamespace, CommitRequest, ContentReader, PullRequestRef};

type Snapshot = BTreeMap<String, String>;

/// A pull request opened against a [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedPullRequest {
    pub reference: PullRequestRef,
    pub request: CommitRequest,
}

#[derive(Debug, Default)]
struct State {
    branches: HashMap<String, RevisionId>,
    revisions: HashMap<RevisionId, Snapshot>,
    pull_requests: Vec<OpenedPullRequest>,
    commits: u64,
    reject_commits: Option<String>,
}

impl State {
    fn new_revision(&mut self, snapshot: Snapshot) -> RevisionId {
        self.commits += 1;
        let mut hasher = Sha256::new();
        hasher.update(self.commits.to_be_bytes());
        for (path, content) in &snapshot {
            hasher.update(path.as_bytes());
            hasher.update([0]);
            hasher.update(content.as_bytes());
            hasher.update([0]);
        }
        let id = RevisionId(hex::encode(hasher.finalize())[..40].to_string());
        self.revisions.insert(id.clone(), snapshot);
        id
    }
}

/// Thread-safe in-memory host.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

impl MemoryHost {
    /// A repository with one branch holding `files`.
    pub fn new<I, P, C>(default_branch: &str, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let mut state = State::default();
        let snapshot: Snapshot = files
            .into_iter()
            .map(|(p, c)| (p.into(), c.into()))
            .collect();
        let head = state.new_revision(snapshot);
        state.branches.insert(default_branch.to_string(), head);
        Self {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, SyncError> {
        self.state
            .lock()
            .map_err(|_| SyncError::Host("memory host state poisoned".to_string()))
    }

    /// Commit `files` directly onto `branch` (as a merged pull request would)
    /// and return the new head. `None` content deletes the file.
    pub fn push<I, P>(&self, branch: &str, files: I) -> Result<RevisionId, SyncError>
    where
        I: IntoIterator<Item = (P, Option<String>)>,
        P: Into<String>,
    {
        let mut state = self.state()?;
        let head = state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| SyncError::BaseBranchMissing(branch.to_string()))?;
        let mut snapshot = state.revisions.get(&head).cloned().unwrap_or_default();
        for (path, content) in files {
            match content {
                Some(content) => snapshot.insert(path.into(), content),
                None => snapshot.remove(&path.into()),
            };
        }
        let id = state.new_revision(snapshot);
        state.branches.insert(branch.to_string(), id.clone());
        Ok(id)
    }

    /// Create `branch` pointing at the head of `from`.
    pub fn create_branch(&self, branch: &str, from: &str) -> Result<(), SyncError> {
        let mut state = self.state()?;
        let head = state
            .branches
            .get(from)
            .cloned()
            .ok_or_else(|| SyncError::BaseBranchMissing(from.to_string()))?;
        state.branches.insert(branch.to_string(), head);
        Ok(())
    }

    /// Make every subsequent `commit_and_open` fail with `message`.
    pub fn reject_commits(&self, message: impl Into<String>) -> Result<(), SyncError> {
        self.state()?.reject_commits = Some(message.into());
        Ok(())
    }

    pub fn pull_requests(&self) -> Vec<OpenedPullRequest> {
        self.state()
            .map(|s| s.pull_requests.clone())
            .unwrap_or_default()
    }

    pub fn branch_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state()
            .map(|s| s.branches.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Content of `path` at the head of `branch`.
    pub fn read(&self, branch: &str, path: &str) -> Option<String> {
        let state = self.state().ok()?;
        let head = state.branches.get(branch)?;
        state.revisions.get(head)?.get(path).cloned()
    }
}

#[async_trait]
impl ContentReader for MemoryHost {
    async fn file_content(
        &self,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Option<String>, SyncError> {
        let state = self.state()?;
        let snapshot = state
            .revisions
            .get(revision)
            .ok_or_else(|| SyncError::Host(format!("unknown revision {revision}")))?;
        Ok(snapshot.get(path).cloned())
    }

    async fn branch_head(&self, branch: &str) -> Result<Option<RevisionId>, SyncError> {
        Ok(self.state()?.branches.get(branch).cloned())
    }
}

#[async_trait]
impl BranchNamespace for MemoryHost {
    async fn branch_exists(&self, branch: &str) -> Result<bool, SyncError> {
        Ok(self.state()?.branches.contains_key(branch))
    }
}

#[async_trait]
impl AtomicPublisher for MemoryHost {
    async fn commit_and_open(&self, request: &CommitRequest) -> Result<PullRequestRef, SyncError> {
        let mut state = self.state()?;
        if let Some(message) = &state.reject_commits {
            return Err(SyncError::Host(message.clone()));
        }
        if state.branches.contains_key(&request.branch) {
            return Err(SyncError::PublicationConflict {
                branch: request.branch.clone(),
                message: "branch already exists".to_string(),
            });
        }
        let mut snapshot = state
            .revisions
            .get(&request.base_revision)
            .cloned()
            .ok_or_else(|| SyncError::Host(format!("unknown revision {}", request.base_revision)))?;
        for (path, content) in &request.files {
            snapshot.insert(path.clone(), content.clone());
        }

        let commit = state.new_revision(snapshot);
        state.branches.insert(request.branch.clone(), commit.clone());
        let reference = PullRequestRef {
            number: state.pull_requests.len() as u64 + 1,
            branch: request.branch.clone(),
            commit,
        };
        state.pull_requests.push(OpenedPullRequest {
            reference: reference.clone(),
            request: request.clone(),
        });
        Ok(reference)
    }
}
