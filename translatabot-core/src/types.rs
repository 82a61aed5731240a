//! Domain types shared by the synchronization engine.
//!
//! Repository paths inside the hosted repository are plain `/`-separated
//! strings, never `PathBuf`: they are interpreted by the hosting platform, not
//! by the local filesystem.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Human-readable name of a target language as written in the config
/// (e.g. `"German"`, `"fr"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageName(pub String);

impl LanguageName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LanguageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LanguageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A commit identifier on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub String);

impl RevisionId {
    /// The first seven characters, as used in branch names and titles.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RevisionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One configured target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetLanguage {
    /// Output file, relative to the directory of the source file.
    pub relative_path: String,
    pub language: LanguageName,
}

/// The repository configuration file (`.github/translatabot.yml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Repository path of the source-of-truth localization file.
    #[serde(default)]
    pub default_path: String,
    #[serde(default)]
    pub languages: Vec<TargetLanguage>,
}

fn default_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Pull request records
// ---------------------------------------------------------------------------

/// Why a pull request was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestType {
    /// Adds the starter configuration file.
    Initial,
    /// Complete translation of the source file into one new language.
    FullTranslation,
    /// Delta update of every existing language after a source edit.
    PartialTranslation,
}

impl fmt::Display for PullRequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullRequestType::Initial => write!(f, "initial"),
            PullRequestType::FullTranslation => write!(f, "full_translation"),
            PullRequestType::PartialTranslation => write!(f, "partial_translation"),
        }
    }
}

/// Content of one file committed by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPerFile {
    pub path: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageName>,
}

/// Audit record for one published pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// `owner/name` of the hosted repository.
    pub repository: String,
    pub pr_number: u64,
    pub title: String,
    pub body: String,
    pub branch_name: String,
    pub base_branch: String,
    #[serde(rename = "type")]
    pub kind: PullRequestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<LanguageName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_pr_number: Option<u64>,
    pub content_per_file: Vec<ContentPerFile>,
    #[serde(default)]
    pub content_size_limit_exceeded: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
