//! Publication builder.
//!
//! Turns finalized file contents into exactly one branch, one commit and one
//! pull request:
//!
//! 1. Normalize line endings to LF.
//! 2. SHA-256 each file and compare with the committed content at the base
//!    revision; drop identical files.
//! 3. No files left: no branch, no commit, no pull request.
//! 4. Choose a free branch name (suffix on collision).
//! 5. Hand every remaining file to the atomic publisher in one request.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use translatabot_core::{LanguageName, RevisionId};

use crate::branch::choose_branch;
use crate::error::SyncError;
use crate::host::{CommitRequest, PullRequestRef, RepositoryHost};

// ---------------------------------------------------------------------------
// Inputs and outcome
// ---------------------------------------------------------------------------

/// One file a publication writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationUnit {
    pub path: String,
    pub content: String,
    pub language: Option<LanguageName>,
}

impl PublicationUnit {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language: None,
        }
    }

    pub fn for_language(mut self, language: LanguageName) -> Self {
        self.language = Some(language);
        self
    }
}

/// Everything one pull request needs.
#[derive(Debug, Clone)]
pub struct Publication {
    pub files: Vec<PublicationUnit>,
    /// Deterministic branch name; renamed on collision.
    pub branch: String,
    pub base_branch: String,
    pub base_revision: RevisionId,
    pub commit_message: String,
    pub title: String,
    pub body: String,
}

/// Result of [`Publisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Every file matched its committed content.
    NoOp,
    Published {
        pull_request: PullRequestRef,
        /// Files actually committed, after dropping unchanged ones.
        files: Vec<PublicationUnit>,
    },
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Line-ending normalization applied before hashing and committing.
pub fn normalize(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// Hex SHA-256 of normalized content.
pub fn content_digest(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(normalize(content).as_bytes());
    hex::encode(h.finalize())
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Builds and submits publications. The clock only feeds branch suffixes.
#[derive(Debug, Clone, Copy)]
pub struct Publisher {
    clock: fn() -> DateTime<Utc>,
}

impl Default for Publisher {
    fn default() -> Self {
        Self { clock: Utc::now }
    }
}

impl Publisher {
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }

    /// Files whose content differs from what is committed at `base`.
    pub async fn changed_files<H: RepositoryHost + ?Sized>(
        &self,
        host: &H,
        files: Vec<PublicationUnit>,
        base: &RevisionId,
    ) -> Result<Vec<PublicationUnit>, SyncError> {
        let mut changed = Vec::with_capacity(files.len());
        for mut file in files {
            file.content = normalize(&file.content);
            let current = host.file_content(&file.path, base).await?;
            let unchanged = current
                .as_deref()
                .is_some_and(|c| content_digest(c) == content_digest(&file.content));
            if unchanged {
                tracing::debug!(path = %file.path, "unchanged, not publishing");
            } else {
                changed.push(file);
            }
        }
        Ok(changed)
    }

    pub async fn publish<H: RepositoryHost + ?Sized>(
        &self,
        host: &H,
        publication: Publication,
    ) -> Result<PublishOutcome, SyncError> {
        let files = self
            .changed_files(host, publication.files, &publication.base_revision)
            .await?;
        if files.is_empty() {
            tracing::info!(branch = %publication.branch, "nothing changed, no pull request");
            return Ok(PublishOutcome::NoOp);
        }

        let handle = choose_branch(host, publication.branch, (self.clock)()).await?;
        let request = CommitRequest {
            base_branch: publication.base_branch,
            base_revision: publication.base_revision,
            branch: handle.name.clone(),
            files: files
                .iter()
                .map(|f| (f.path.clone(), f.content.clone()))
                .collect(),
            commit_message: publication.commit_message,
            title: publication.title,
            body: publication.body,
        };

        let pull_request = host
            .commit_and_open(&request)
            .await
            .map_err(|e| match e {
                SyncError::PublicationConflict { .. } => e,
                other => SyncError::PublicationConflict {
                    branch: handle.name.clone(),
                    message: other.to_string(),
                },
            })?;

        tracing::info!(
            branch = %pull_request.branch,
            pr = pull_request.number,
            files = files.len(),
            "opened pull request"
        );
        Ok(PublishOutcome::Published {
            pull_request,
            files,
        })
    }
}
