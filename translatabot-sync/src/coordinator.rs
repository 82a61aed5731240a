//! Synchronization coordinator.
//!
//! Drives one run per (revision, event):
//!
//! ```text
//! Idle → DetectingChanges → NoOp
//!                         → TranslatingNewLanguage / TranslatingDelta → Publishing → Done
//! any state → Failed
//! ```
//!
//! Whole-run failures (base branch or source file missing, unreadable source)
//! return `Err` before any translation starts. Per-language failures are
//! recorded in the [`RunReport`] and never block sibling languages.
//!
//! Newly configured languages without a file each get their own
//! `full_translation` pull request. Existing languages touched by a source
//! edit share one `partial_translation` pull request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use translatabot_core::{
    config, diff, flatten, merge, pending_paths, unflatten, ChangeSet, ContentPerFile, FlatMap,
    LanguageName, LocalizationDocument, PullRequestRecord, PullRequestType, RevisionId, SyncConfig,
    TargetLanguage, CONFIG_FILE_PATH,
};

use crate::batch::{BatchOrchestrator, TranslationUnit, DEFAULT_BATCH_SIZE};
use crate::branch::{config_branch, proposed_name, BranchScope};
use crate::error::{ErrorKind, SyncError};
use crate::host::{ChangeFeed, PullRequestRef, RepositoryHost};
use crate::publish::{Publication, PublicationUnit, PublishOutcome, Publisher};
use crate::record::{truncate_contents, RecordStore};
use crate::translator::Translator;

// ---------------------------------------------------------------------------
// Options and inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum units per translation request.
    pub batch_size: usize,
    /// Prefix of branch names and pull request titles.
    pub app_name: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            app_name: "translatabot".to_string(),
        }
    }
}

/// The merged pull request that triggered a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePullRequest {
    pub number: u64,
    pub title: String,
}

/// One trigger: a push to the base branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    /// `owner/name`.
    pub repository: String,
    pub base_branch: String,
    pub change_feed: ChangeFeed,
    /// Revision before the push. `None` when the history is unknown, in
    /// which case every source path counts as added.
    pub previous_revision: Option<RevisionId>,
    pub source_pr: Option<SourcePullRequest>,
}

// ---------------------------------------------------------------------------
// Run state and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    DetectingChanges,
    NoOp,
    TranslatingNewLanguage,
    TranslatingDelta,
    Publishing,
    Done,
    Failed,
}

/// What happened to one configured language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageStatus {
    Published {
        pull_request: u64,
        branch: String,
        kind: PullRequestType,
    },
    /// Translated, but the result matched the committed file.
    Unchanged,
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOutcome {
    pub language: LanguageName,
    pub path: String,
    /// Entries sent to the translator.
    pub translated: usize,
    pub status: LanguageStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    /// Every state entered, in order, starting with `Idle`.
    pub trace: Vec<RunState>,
    pub languages: Vec<LanguageOutcome>,
    pub pull_requests: Vec<PullRequestRef>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
            trace: vec![RunState::Idle],
            languages: Vec::new(),
            pull_requests: Vec::new(),
        }
    }

    fn enter(&mut self, state: RunState) {
        tracing::debug!(from = ?self.state, to = ?state, "run state");
        self.state = state;
        self.trace.push(state);
    }

    pub fn outcome(&self, language: &str) -> Option<&LanguageOutcome> {
        self.languages
            .iter()
            .find(|o| o.language.as_str().eq_ignore_ascii_case(language))
    }

    pub fn failed(&self) -> impl Iterator<Item = &LanguageOutcome> {
        self.languages
            .iter()
            .filter(|o| matches!(o.status, LanguageStatus::Failed { .. }))
    }
}

// ---------------------------------------------------------------------------
// Per-language translation
// ---------------------------------------------------------------------------

/// Result of translating and merging one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageUpdate {
    pub merged: FlatMap,
    pub document: LocalizationDocument,
    /// Rendered file content.
    pub content: String,
    pub translated: usize,
}

/// Translate whatever `target` is missing or outdated and merge it in.
///
/// For a full translation pass an empty `target` and the change set of the
/// whole document against nothing.
pub async fn update_language(
    orchestrator: &BatchOrchestrator,
    translator: &dyn Translator,
    language: &LanguageName,
    current: &FlatMap,
    changes: &ChangeSet,
    target: &FlatMap,
) -> Result<LanguageUpdate, SyncError> {
    let pending = pending_paths(changes, target);
    let units = TranslationUnit::for_paths(&pending, current, language);
    let translations = orchestrator.translate(translator, &units, language).await?;
    let merged = merge(target, changes, &translations)?;
    let document = unflatten(&merged)?;
    let content = document.render()?;
    Ok(LanguageUpdate {
        merged,
        document,
        content,
        translated: units.len(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Full,
    Delta,
}

#[derive(Debug)]
struct Job {
    target: TargetLanguage,
    path: String,
    kind: JobKind,
    existing: FlatMap,
}

struct Finished {
    job: Job,
    update: LanguageUpdate,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Wires the engine to its collaborators. All handles are explicit.
pub struct Coordinator {
    host: Arc<dyn RepositoryHost>,
    translator: Arc<dyn Translator>,
    store: Arc<dyn RecordStore>,
    options: SyncOptions,
    clock: fn() -> DateTime<Utc>,
}

impl Coordinator {
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        translator: Arc<dyn Translator>,
        store: Arc<dyn RecordStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            host,
            translator,
            store,
            options,
            clock: Utc::now,
        }
    }

    /// Fixed clock for branch suffixes and record timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run one synchronization for `event` under `config`.
    pub async fn run(&self, event: &SyncEvent, config: &SyncConfig) -> Result<RunReport, SyncError> {
        let mut report = RunReport::new();
        report.enter(RunState::DetectingChanges);

        let source_touched = event.change_feed.touches(&config.default_path);
        let config_touched = event.change_feed.touches(CONFIG_FILE_PATH);
        if !source_touched && !config_touched {
            tracing::info!(repository = %event.repository, "source and config untouched");
            report.enter(RunState::NoOp);
            return Ok(report);
        }

        let host = self.host.as_ref();
        let base = host
            .branch_head(&event.base_branch)
            .await?
            .ok_or_else(|| SyncError::BaseBranchMissing(event.base_branch.clone()))?;
        let current = self
            .read_document(&config.default_path, &base)
            .await?
            .ok_or_else(|| SyncError::SourceMissing {
                path: config.default_path.clone(),
                revision: base.to_string(),
            })?;
        let current = flatten(&current);

        let new_languages = if config_touched {
            self.newly_configured(event, config).await
        } else {
            Vec::new()
        };

        let mut jobs = Vec::new();
        for target in &config.languages {
            let path = config.target_path(target);
            let existing = match self.read_document(&path, &base).await {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(language = %target.language, error = %e, "target unreadable");
                    report.languages.push(failed(target, path, &e));
                    continue;
                }
            };
            let kind = match (&existing, new_languages.contains(&target.language)) {
                (None, true) => JobKind::Full,
                _ if source_touched => JobKind::Delta,
                _ => continue,
            };
            jobs.push(Job {
                target: target.clone(),
                path,
                kind,
                existing: existing.as_ref().map(flatten).unwrap_or_default(),
            });
        }

        if jobs.is_empty() {
            if report.languages.is_empty() {
                report.enter(RunState::NoOp);
            } else {
                report.enter(RunState::Failed);
            }
            return Ok(report);
        }

        let full_changes = diff(&FlatMap::new(), &current);
        let delta_changes = if jobs.iter().any(|j| j.kind == JobKind::Delta) {
            let previous = self.previous_source(event, config).await?;
            diff(&previous, &current)
        } else {
            ChangeSet::default()
        };
        tracing::info!(
            repository = %event.repository,
            changes = %delta_changes.summary(),
            languages = jobs.len(),
            "changes detected"
        );

        if jobs.iter().any(|j| j.kind == JobKind::Full) {
            report.enter(RunState::TranslatingNewLanguage);
        }
        if jobs.iter().any(|j| j.kind == JobKind::Delta) {
            report.enter(RunState::TranslatingDelta);
        }

        let orchestrator = BatchOrchestrator::new(self.options.batch_size);
        let orchestrator = &orchestrator;
        let translator = self.translator.as_ref();
        let current = &current;
        let full_changes = &full_changes;
        let delta_changes = &delta_changes;
        let results = join_all(jobs.into_iter().map(|job| async move {
            let changes = match job.kind {
                JobKind::Full => full_changes,
                JobKind::Delta => delta_changes,
            };
            let result = update_language(
                orchestrator,
                translator,
                &job.target.language,
                current,
                changes,
                &job.existing,
            )
            .await;
            (job, result)
        }))
        .await;

        let mut full = Vec::new();
        let mut delta = Vec::new();
        for (job, result) in results {
            match result {
                Ok(update) => {
                    let kind = job.kind;
                    let finished = Finished { job, update };
                    match kind {
                        JobKind::Full => full.push(finished),
                        JobKind::Delta => delta.push(finished),
                    }
                }
                Err(e) => {
                    tracing::error!(language = %job.target.language, error = %e, "language failed");
                    report.languages.push(failed(&job.target, job.path, &e));
                }
            }
        }

        report.enter(RunState::Publishing);
        for finished in full {
            self.publish_full(event, config, &base, finished, &mut report)
                .await;
        }
        if !delta.is_empty() {
            self.publish_delta(event, &base, delta, &mut report).await;
        }

        let all_failed = report
            .languages
            .iter()
            .all(|o| matches!(o.status, LanguageStatus::Failed { .. }));
        report.enter(if all_failed {
            RunState::Failed
        } else {
            RunState::Done
        });
        Ok(report)
    }

    /// Open a pull request adding the starter configuration, unless the
    /// repository already has one.
    pub async fn propose_config(
        &self,
        repository: &str,
        base_branch: &str,
        default_path: Option<&str>,
    ) -> Result<PublishOutcome, SyncError> {
        let host = self.host.as_ref();
        let base = host
            .branch_head(base_branch)
            .await?
            .ok_or_else(|| SyncError::BaseBranchMissing(base_branch.to_string()))?;
        if host.file_content(CONFIG_FILE_PATH, &base).await?.is_some() {
            tracing::info!(repository, "configuration already present");
            return Ok(PublishOutcome::NoOp);
        }

        let app = &self.options.app_name;
        let publication = Publication {
            files: vec![PublicationUnit::new(
                CONFIG_FILE_PATH,
                config::default_config_yaml(default_path)?,
            )],
            branch: config_branch(app),
            base_branch: base_branch.to_string(),
            base_revision: base,
            commit_message: format!("Add {app} configuration"),
            title: format!("[{app}] Add configuration"),
            body: format!(
                "This PR adds the {app} configuration file `{CONFIG_FILE_PATH}`.\n\
                 Adjust the source path and languages, then merge it to start translating."
            ),
        };
        let outcome = self.publisher().publish(host, publication.clone()).await?;
        if let PublishOutcome::Published {
            pull_request,
            files,
        } = &outcome
        {
            self.save_record(
                repository,
                &publication,
                pull_request,
                files,
                PullRequestType::Initial,
                None,
                None,
            );
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    async fn read_document(
        &self,
        path: &str,
        revision: &RevisionId,
    ) -> Result<Option<LocalizationDocument>, SyncError> {
        match self.host.file_content(path, revision).await? {
            Some(text) => Ok(Some(LocalizationDocument::parse(&text)?)),
            None => Ok(None),
        }
    }

    /// Flattened source at the previous revision; empty when unknown or
    /// absent.
    async fn previous_source(
        &self,
        event: &SyncEvent,
        config: &SyncConfig,
    ) -> Result<FlatMap, SyncError> {
        let Some(previous) = &event.previous_revision else {
            return Ok(FlatMap::new());
        };
        Ok(self
            .read_document(&config.default_path, previous)
            .await?
            .as_ref()
            .map(flatten)
            .unwrap_or_default())
    }

    /// Languages in `config` that the previous revision's config lacked.
    async fn newly_configured(&self, event: &SyncEvent, config: &SyncConfig) -> Vec<LanguageName> {
        let previous = match &event.previous_revision {
            Some(rev) => match self.host.file_content(CONFIG_FILE_PATH, rev).await {
                Ok(Some(text)) => config::parse(&text).ok(),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "previous configuration unreadable");
                    None
                }
            },
            None => None,
        };
        config
            .languages
            .iter()
            .filter(|t| {
                previous
                    .as_ref()
                    .and_then(|p| p.language(t.language.as_str()))
                    .is_none()
            })
            .map(|t| t.language.clone())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Publishing
    // -----------------------------------------------------------------------

    fn publisher(&self) -> Publisher {
        Publisher::with_clock(self.clock)
    }

    async fn publish_full(
        &self,
        event: &SyncEvent,
        config: &SyncConfig,
        base: &RevisionId,
        finished: Finished,
        report: &mut RunReport,
    ) {
        let Finished { job, update } = finished;
        let app = &self.options.app_name;
        let language = &job.target.language;
        let source_pr = event.source_pr.as_ref().map(|p| p.number);
        let publication = Publication {
            files: vec![
                PublicationUnit::new(&job.path, update.content).for_language(language.clone()),
            ],
            // Language branches always carry the revision, even for a source PR.
            branch: proposed_name(app, &BranchScope::Language(language.clone()), None, base),
            base_branch: event.base_branch.clone(),
            base_revision: base.clone(),
            commit_message: format!(
                "Initial translation of {} into {language}",
                config.default_path
            ),
            title: format!("[{app}] Translation to {language}"),
            body: format!(
                "This PR contains the initial translation of {} into {language}.",
                config.default_path
            ),
        };

        let status = match self.publisher().publish(self.host.as_ref(), publication.clone()).await {
            Ok(PublishOutcome::NoOp) => LanguageStatus::Unchanged,
            Ok(PublishOutcome::Published {
                pull_request,
                files,
            }) => {
                self.save_record(
                    &event.repository,
                    &publication,
                    &pull_request,
                    &files,
                    PullRequestType::FullTranslation,
                    Some(language.clone()),
                    source_pr,
                );
                let status = LanguageStatus::Published {
                    pull_request: pull_request.number,
                    branch: pull_request.branch.clone(),
                    kind: PullRequestType::FullTranslation,
                };
                report.pull_requests.push(pull_request);
                status
            }
            Err(e) => {
                tracing::error!(language = %language, error = %e, "publication failed");
                failed_status(&e)
            }
        };
        report.languages.push(LanguageOutcome {
            language: language.clone(),
            path: job.path,
            translated: update.translated,
            status,
        });
    }

    async fn publish_delta(
        &self,
        event: &SyncEvent,
        base: &RevisionId,
        finished: Vec<Finished>,
        report: &mut RunReport,
    ) {
        let app = &self.options.app_name;
        let source_pr = event.source_pr.as_ref().map(|p| p.number);
        let count = finished.len();
        let reference = match &event.source_pr {
            Some(pr) if !pr.title.is_empty() => pr.title.clone(),
            _ => base.short().to_string(),
        };
        let origin = match source_pr {
            Some(number) => format!("#{number}"),
            None => base.short().to_string(),
        };
        let publication = Publication {
            files: finished
                .iter()
                .map(|f| {
                    PublicationUnit::new(&f.job.path, f.update.content.clone())
                        .for_language(f.job.target.language.clone())
                })
                .collect(),
            branch: proposed_name(app, &BranchScope::Partial, source_pr, base),
            base_branch: event.base_branch.clone(),
            base_revision: base.clone(),
            commit_message: format!("Partial translation of {origin} in {count} languages"),
            title: format!("[{app}] Translations for {reference} in {count} languages"),
            body: format!(
                "This PR contains updates to all translation files based on the changes of {origin}"
            ),
        };

        let result = self
            .publisher()
            .publish(self.host.as_ref(), publication.clone())
            .await;
        let published = match &result {
            Ok(PublishOutcome::Published {
                pull_request,
                files,
            }) => {
                self.save_record(
                    &event.repository,
                    &publication,
                    pull_request,
                    files,
                    PullRequestType::PartialTranslation,
                    None,
                    source_pr,
                );
                report.pull_requests.push(pull_request.clone());
                Some((pull_request, files))
            }
            Ok(PublishOutcome::NoOp) => None,
            Err(e) => {
                tracing::error!(error = %e, "partial publication failed");
                None
            }
        };

        for Finished { job, update } in finished {
            let status = match (&result, published) {
                (Err(e), _) => failed_status(e),
                (_, Some((pr, files))) if files.iter().any(|f| f.path == job.path) => {
                    LanguageStatus::Published {
                        pull_request: pr.number,
                        branch: pr.branch.clone(),
                        kind: PullRequestType::PartialTranslation,
                    }
                }
                _ => LanguageStatus::Unchanged,
            };
            report.languages.push(LanguageOutcome {
                language: job.target.language,
                path: job.path,
                translated: update.translated,
                status,
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn save_record(
        &self,
        repository: &str,
        publication: &Publication,
        pull_request: &PullRequestRef,
        files: &[PublicationUnit],
        kind: PullRequestType,
        target_language: Option<LanguageName>,
        source_pr_number: Option<u64>,
    ) {
        let (content_per_file, exceeded) = truncate_contents(
            files
                .iter()
                .map(|f| ContentPerFile {
                    path: f.path.clone(),
                    content: f.content.clone(),
                    language: f.language.clone(),
                })
                .collect(),
        );
        let record = PullRequestRecord {
            repository: repository.to_string(),
            pr_number: pull_request.number,
            title: publication.title.clone(),
            body: publication.body.clone(),
            branch_name: pull_request.branch.clone(),
            base_branch: publication.base_branch.clone(),
            kind,
            target_language,
            source_pr_number,
            content_per_file,
            content_size_limit_exceeded: exceeded,
            created_at: (self.clock)(),
        };
        if let Err(e) = self.store.save(&record) {
            tracing::warn!(pr = pull_request.number, error = %e, "record not saved");
        }
    }
}

fn failed_status(error: &SyncError) -> LanguageStatus {
    LanguageStatus::Failed {
        kind: error.kind(),
        message: error.to_string(),
    }
}

fn failed(target: &TargetLanguage, path: String, error: &SyncError) -> LanguageOutcome {
    LanguageOutcome {
        language: target.language.clone(),
        path,
        translated: 0,
        status: failed_status(error),
    }
}
