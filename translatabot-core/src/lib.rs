//! Translatabot core library: domain types, configuration and the
//! flatten / diff / merge algebra for localization documents.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`error`] — [`CodecError`], [`MergeError`], [`ConfigError`]
//! - [`config`] — parse / load / verify the repository configuration
//! - [`path`] — [`FlatPath`] segments and their string form
//! - [`document`] — [`LocalizationDocument`], [`flatten`], [`unflatten`]
//! - [`changes`] — [`diff`] and [`ChangeSet`]
//! - [`merge`] — [`merge()`](merge::merge) and the pending-path selection

pub mod changes;
pub mod config;
pub mod document;
pub mod error;
pub mod merge;
pub mod path;
pub mod types;

pub use changes::{diff, Change, ChangeSet, ChangeSummary};
pub use config::CONFIG_FILE_PATH;
pub use document::{flatten, unflatten, FlatMap, LocalizationDocument, Node};
pub use error::{CodecError, ConfigError, MergeError};
pub use merge::{merge, pending_paths};
pub use path::{FlatPath, Segment};
pub use types::{
    ContentPerFile, LanguageName, PullRequestRecord, PullRequestType, RevisionId, SyncConfig,
    TargetLanguage,
};
