//! # translatabot-sync
//!
//! Translation batching, atomic publication and the synchronization
//! coordinator.
//!
//! Build a [`Coordinator`] from a [`RepositoryHost`], a [`Translator`] and a
//! [`RecordStore`], then call [`Coordinator::run`] once per push event.
//! [`MemoryHost`] and [`MockTranslator`] implement the collaborators without
//! any network access.

pub mod batch;
pub mod branch;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod memory;
pub mod mock;
pub mod preview;
pub mod publish;
pub mod record;
pub mod translator;

pub use batch::{BatchOrchestrator, TranslationUnit, DEFAULT_BATCH_SIZE};
pub use branch::{BranchHandle, BranchScope};
pub use coordinator::{
    update_language, Coordinator, LanguageOutcome, LanguageStatus, LanguageUpdate, RunReport,
    RunState, SourcePullRequest, SyncEvent, SyncOptions,
};
pub use error::{ErrorKind, SyncError};
pub use host::{
    AtomicPublisher, BranchNamespace, ChangeFeed, CommitRequest, ContentReader, PullRequestRef,
    RepositoryHost,
};
pub use memory::MemoryHost;
pub use mock::{MockMode, MockTranslator};
pub use preview::{preview, FileDiff};
pub use publish::{Publication, PublicationUnit, PublishOutcome, Publisher};
pub use record::{FileRecordStore, MemoryRecordStore, RecordStore};
pub use translator::{LineTranslator, TextCompletion, Translator};
