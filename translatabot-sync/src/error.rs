//! Error types for translatabot-sync.

use std::path::PathBuf;

use thiserror::Error;

use translatabot_core::{CodecError, ConfigError, LanguageName, MergeError};

/// All errors that can arise from a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A document could not be parsed, flattened or rebuilt.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The merge engine found a changed path without a translation.
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A batch response did not contain exactly one value per submitted unit.
    #[error(
        "translation alignment error for {language} (batch {batch}): expected {expected} values, got {actual}"
    )]
    TranslationAlignment {
        language: LanguageName,
        batch: usize,
        expected: usize,
        actual: usize,
    },

    /// The translation capability itself failed.
    #[error("translation into {language} failed: {message}")]
    Translation {
        language: LanguageName,
        message: String,
    },

    /// Branch collision that survived renaming, or a failed atomic commit.
    #[error("publication conflict on branch '{branch}': {message}")]
    PublicationConflict { branch: String, message: String },

    /// The source file does not exist at the revision being synchronized.
    #[error("source file {path} not found at {revision}")]
    SourceMissing { path: String, revision: String },

    /// The base branch could not be resolved.
    #[error("base branch '{0}' not found")]
    BaseBranchMissing(String),

    /// Transport or API failure reported by the hosting platform.
    #[error("hosting error: {0}")]
    Host(String),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (record store).
    #[error("record store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stable failure category, for callers deciding on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedLeafType,
    InvalidDocument,
    MissingTranslation,
    TranslationAlignment,
    Translation,
    PublicationConflict,
    SourceMissing,
    BaseBranchMissing,
    Config,
    Host,
    Storage,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Codec(CodecError::UnsupportedLeafType { .. }) => {
                ErrorKind::UnsupportedLeafType
            }
            SyncError::Codec(_) => ErrorKind::InvalidDocument,
            SyncError::Merge(_) => ErrorKind::MissingTranslation,
            SyncError::Config(_) => ErrorKind::Config,
            SyncError::TranslationAlignment { .. } => ErrorKind::TranslationAlignment,
            SyncError::Translation { .. } => ErrorKind::Translation,
            SyncError::PublicationConflict { .. } => ErrorKind::PublicationConflict,
            SyncError::SourceMissing { .. } => ErrorKind::SourceMissing,
            SyncError::BaseBranchMissing(_) => ErrorKind::BaseBranchMissing,
            SyncError::Host(_) => ErrorKind::Host,
            SyncError::Io { .. } | SyncError::Json(_) => ErrorKind::Storage,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
