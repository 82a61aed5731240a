//! End-to-end runs of the coordinator against the in-memory host.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use translatabot_core::{config, PullRequestType, RevisionId, SyncConfig, CONFIG_FILE_PATH};
use translatabot_sync::{
    ChangeFeed, ContentReader, Coordinator, ErrorKind, FileRecordStore, LanguageStatus,
    MemoryHost, MemoryRecordStore, MockMode, MockTranslator, PublishOutcome, RecordStore,
    RunState, SourcePullRequest, SyncEvent, SyncOptions,
};

const REPO: &str = "acme/app";
const SOURCE: &str = "locales/en.json";

fn fixed() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 0).unwrap()
}

fn config_yaml(languages: &[&str]) -> String {
    let mut yaml = format!("version: 1\ndefaultPath: {SOURCE}\nlanguages:\n");
    for language in languages {
        yaml.push_str(&format!(
            "  - relativePath: {language}.json\n    language: {language}\n"
        ));
    }
    yaml
}

fn json(value: &str) -> String {
    let parsed: serde_json::Value = serde_json::from_str(value).unwrap();
    let mut out = serde_json::to_string_pretty(&parsed).unwrap();
    out.push('\n');
    out
}

struct Harness {
    host: Arc<MemoryHost>,
    translator: Arc<MockTranslator>,
    store: Arc<MemoryRecordStore>,
    coordinator: Coordinator,
}

impl Harness {
    fn new(files: &[(&str, String)], translator: MockTranslator) -> Self {
        Self::with_options(files, translator, SyncOptions::default())
    }

    fn with_options(files: &[(&str, String)], translator: MockTranslator, options: SyncOptions) -> Self {
        let host = Arc::new(MemoryHost::new(
            "main",
            files.iter().map(|(p, c)| (p.to_string(), c.clone())),
        ));
        let translator = Arc::new(translator);
        let store = Arc::new(MemoryRecordStore::new());
        let coordinator = Coordinator::new(host.clone(), translator.clone(), store.clone(), options)
            .with_clock(fixed);
        Self {
            host,
            translator,
            store,
            coordinator,
        }
    }

    async fn head(&self) -> RevisionId {
        self.host.branch_head("main").await.unwrap().unwrap()
    }

    fn push(&self, files: &[(&str, String)]) {
        self.host
            .push("main", files.iter().map(|(p, c)| (p.to_string(), Some(c.clone()))))
            .unwrap();
    }

    fn config(&self) -> SyncConfig {
        config::parse(&self.host.read("main", CONFIG_FILE_PATH).unwrap()).unwrap()
    }
}

fn event(changed: &[&str], previous: Option<RevisionId>, source_pr: Option<(u64, &str)>) -> SyncEvent {
    SyncEvent {
        repository: REPO.to_string(),
        base_branch: "main".to_string(),
        change_feed: ChangeFeed::new(changed.iter().copied()),
        previous_revision: previous,
        source_pr: source_pr.map(|(number, title)| SourcePullRequest {
            number,
            title: title.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// New language
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_language_gets_full_translation_in_its_own_pr() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"greeting":"hi"}"#)),
            ("locales/de.json", json(r#"{"greeting":"hallo"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["de"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let previous = h.head().await;
    h.push(&[(CONFIG_FILE_PATH, config_yaml(&["de", "fr"]))]);

    let report = h
        .coordinator
        .run(&event(&[CONFIG_FILE_PATH], Some(previous), None), &h.config())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Done);
    assert!(report.trace.contains(&RunState::TranslatingNewLanguage));
    assert!(!report.trace.contains(&RunState::TranslatingDelta));

    let prs = h.host.pull_requests();
    assert_eq!(prs.len(), 1);
    let pr = &prs[0];
    assert_eq!(pr.request.files.len(), 1);
    assert_eq!(pr.request.files[0].0, "locales/fr.json");
    assert_eq!(pr.request.files[0].1, json(r#"{"greeting":"<fr(hi)>"}"#));
    assert_eq!(pr.request.title, "[translatabot] Translation to fr");
    assert!(pr.reference.branch.starts_with("translatabot/fr/"));

    let record = h.store.find(REPO, pr.reference.number).unwrap().unwrap();
    assert_eq!(record.kind, PullRequestType::FullTranslation);
    assert_eq!(record.target_language.as_ref().map(|l| l.as_str()), Some("fr"));
    assert!(h.translator.calls_for("de").is_empty());
}

#[tokio::test]
async fn unknown_history_treats_every_language_as_new() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr", "es"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let report = h
        .coordinator
        .run(&event(&[CONFIG_FILE_PATH], None, None), &h.config())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(h.host.pull_requests().len(), 2);
    for outcome in &report.languages {
        assert!(matches!(
            outcome.status,
            LanguageStatus::Published {
                kind: PullRequestType::FullTranslation,
                ..
            }
        ));
    }
}

// ---------------------------------------------------------------------------
// Incremental edits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn incremental_edit_translates_only_changed_paths() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x","b":"y"}"#)),
            ("locales/fr.json", json(r#"{"a":"X","b":"Y"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let previous = h.head().await;
    h.push(&[(SOURCE, json(r#"{"a":"x2","b":"y","c":"z"}"#))]);

    let report = h
        .coordinator
        .run(
            &event(&[SOURCE], Some(previous), Some((12, "Copy tweaks"))),
            &h.config(),
        )
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Done);
    let calls = h.translator.calls_for("fr");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].texts, vec!["x2".to_string(), "z".to_string()]);

    let prs = h.host.pull_requests();
    assert_eq!(prs.len(), 1);
    let pr = &prs[0];
    assert_eq!(pr.reference.branch, "translatabot/partial/#12");
    assert_eq!(
        pr.request.title,
        "[translatabot] Translations for Copy tweaks in 1 languages"
    );
    assert_eq!(
        h.host.read(&pr.reference.branch, "locales/fr.json").unwrap(),
        json(r#"{"a":"<fr(x2)>","b":"Y","c":"<fr(z)>"}"#)
    );

    let record = h.store.find(REPO, pr.reference.number).unwrap().unwrap();
    assert_eq!(record.kind, PullRequestType::PartialTranslation);
    assert_eq!(record.source_pr_number, Some(12));
    assert_eq!(record.content_per_file.len(), 1);
}

#[tokio::test]
async fn removed_key_disappears_from_target() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x","d":"w"}"#)),
            ("locales/fr.json", json(r#"{"a":"X","d":"W"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let previous = h.head().await;
    h.push(&[(SOURCE, json(r#"{"a":"x"}"#))]);

    h.coordinator
        .run(&event(&[SOURCE], Some(previous), None), &h.config())
        .await
        .unwrap();

    assert!(h.translator.calls().is_empty());
    let pr = &h.host.pull_requests()[0];
    assert_eq!(
        h.host.read(&pr.reference.branch, "locales/fr.json").unwrap(),
        json(r#"{"a":"X"}"#)
    );
}

#[tokio::test]
async fn existing_languages_share_one_partial_pr() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x"}"#)),
            ("locales/fr.json", json(r#"{"a":"X"}"#)),
            ("locales/de.json", json(r#"{"a":"Ix"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr", "de"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let previous = h.head().await;
    h.push(&[(SOURCE, json(r#"{"a":"x","b":"new"}"#))]);

    let report = h
        .coordinator
        .run(&event(&[SOURCE], Some(previous), None), &h.config())
        .await
        .unwrap();

    let prs = h.host.pull_requests();
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].request.files.len(), 2);
    assert_eq!(report.pull_requests.len(), 1);
    assert!(prs[0].request.title.ends_with("in 2 languages"));
}

#[tokio::test]
async fn existing_language_without_file_joins_delta_with_whole_document() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x","b":"y"}"#)),
            ("locales/fr.json", json(r#"{"a":"X","b":"Y"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr", "de"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let previous = h.head().await;
    h.push(&[(SOURCE, json(r#"{"a":"x","b":"y2"}"#))]);

    h.coordinator
        .run(&event(&[SOURCE], Some(previous), None), &h.config())
        .await
        .unwrap();

    let prs = h.host.pull_requests();
    assert_eq!(prs.len(), 1);
    let branch = &prs[0].reference.branch;
    assert_eq!(
        h.host.read(branch, "locales/de.json").unwrap(),
        json(r#"{"a":"<de(x)>","b":"<de(y2)>"}"#)
    );
    assert_eq!(
        h.host.read(branch, "locales/fr.json").unwrap(),
        json(r#"{"a":"X","b":"<fr(y2)>"}"#)
    );
}

#[tokio::test]
async fn config_and_source_edit_in_one_push() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x"}"#)),
            ("locales/fr.json", json(r#"{"a":"X"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let previous = h.head().await;
    h.push(&[
        (SOURCE, json(r#"{"a":"x","b":"y"}"#)),
        (CONFIG_FILE_PATH, config_yaml(&["fr", "es"])),
    ]);

    let report = h
        .coordinator
        .run(
            &event(&[SOURCE, CONFIG_FILE_PATH], Some(previous), Some((9, "Add es"))),
            &h.config(),
        )
        .await
        .unwrap();

    assert!(report.trace.contains(&RunState::TranslatingNewLanguage));
    assert!(report.trace.contains(&RunState::TranslatingDelta));
    let kinds: Vec<_> = report
        .languages
        .iter()
        .map(|o| (o.language.to_string(), o.status.clone()))
        .collect();
    assert_eq!(kinds.len(), 2);
    assert_eq!(h.host.pull_requests().len(), 2);

    let es_branch = format!("translatabot/es/{}", h.head().await.short());
    let mut branches: Vec<&str> = report.pull_requests.iter().map(|p| p.branch.as_str()).collect();
    branches.sort();
    assert_eq!(
        branches,
        vec![es_branch.as_str(), "translatabot/partial/#9"]
    );

    let mut record_kinds: Vec<PullRequestType> =
        h.store.all().iter().map(|r| r.kind).collect();
    record_kinds.sort_by_key(|k| k.to_string());
    assert_eq!(
        record_kinds,
        vec![
            PullRequestType::FullTranslation,
            PullRequestType::PartialTranslation
        ]
    );
}

// ---------------------------------------------------------------------------
// Failures and no-ops
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alignment_failure_excludes_only_that_language() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x"}"#)),
            ("locales/fr.json", json(r#"{"a":"X"}"#)),
            ("locales/de.json", json(r#"{"a":"Ix"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["de", "fr"])),
        ],
        MockTranslator::new(MockMode::Wrap).with_language_mode("de", MockMode::DropLast),
    );
    let previous = h.head().await;
    h.push(&[(SOURCE, json(r#"{"a":"x","b":"one","c":"two","d":"three"}"#))]);

    let report = h
        .coordinator
        .run(&event(&[SOURCE], Some(previous), None), &h.config())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Done);
    let de = report.outcome("de").unwrap();
    assert!(matches!(
        de.status,
        LanguageStatus::Failed {
            kind: ErrorKind::TranslationAlignment,
            ..
        }
    ));
    let fr = report.outcome("fr").unwrap();
    assert!(matches!(fr.status, LanguageStatus::Published { .. }));
    assert_eq!(fr.translated, 3);

    let prs = h.host.pull_requests();
    assert_eq!(prs.len(), 1);
    let paths: Vec<&str> = prs[0].request.files.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["locales/fr.json"]);
}

#[tokio::test]
async fn every_language_failing_fails_the_run() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x"}"#)),
            ("locales/fr.json", json(r#"{"a":"X"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr"])),
        ],
        MockTranslator::new(MockMode::Error("quota exceeded".to_string())),
    );
    let previous = h.head().await;
    h.push(&[(SOURCE, json(r#"{"a":"x","b":"y"}"#))]);

    let report = h
        .coordinator
        .run(&event(&[SOURCE], Some(previous), None), &h.config())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Failed);
    assert_eq!(report.failed().count(), 1);
    assert!(h.host.pull_requests().is_empty());
    assert_eq!(h.host.branch_names(), vec!["main".to_string()]);
}

#[tokio::test]
async fn identical_output_publishes_nothing() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x"}"#)),
            ("locales/fr.json", json(r#"{"a":"X"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    let previous = h.head().await;
    h.push(&[(SOURCE, "{ \"a\" : \"x\" }".to_string())]);

    let report = h
        .coordinator
        .run(&event(&[SOURCE], Some(previous), None), &h.config())
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.outcome("fr").unwrap().status, LanguageStatus::Unchanged);
    assert!(h.host.pull_requests().is_empty());
    assert!(h.store.all().is_empty());
    assert!(h.translator.calls().is_empty());
}

#[tokio::test]
async fn taken_branch_name_gets_timestamp_suffix() {
    let h = Harness::new(
        &[
            (SOURCE, json(r#"{"a":"x"}"#)),
            ("locales/fr.json", json(r#"{"a":"X"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr"])),
        ],
        MockTranslator::new(MockMode::Wrap),
    );
    h.host.create_branch("translatabot/partial/#3", "main").unwrap();
    let previous = h.head().await;
    h.push(&[(SOURCE, json(r#"{"a":"y"}"#))]);

    let report = h
        .coordinator
        .run(&event(&[SOURCE], Some(previous), Some((3, ""))), &h.config())
        .await
        .unwrap();

    assert_eq!(report.pull_requests[0].branch, "translatabot/partial/#3-202405060708");
}

#[tokio::test]
async fn large_documents_are_batched_with_context() {
    let body: Vec<String> = (0..5).map(|i| format!("\"k{i}\":\"v{i}\"")).collect();
    let h = Harness::with_options(
        &[
            (SOURCE, json(&format!("{{{}}}", body.join(",")))),
            (CONFIG_FILE_PATH, config_yaml(&["fr"])),
        ],
        MockTranslator::new(MockMode::Wrap),
        SyncOptions {
            batch_size: 2,
            ..SyncOptions::default()
        },
    );

    h.coordinator
        .run(&event(&[CONFIG_FILE_PATH], None, None), &h.config())
        .await
        .unwrap();

    let calls = h.translator.calls_for("fr");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].context, None);
    assert_eq!(calls[2].context.as_deref(), Some("<fr(v2)>\n<fr(v3)>"));
}

#[tokio::test]
async fn languages_are_translated_concurrently() {
    let h = Harness::with_options(
        &[
            (SOURCE, json(r#"{"a":"x","b":"y"}"#)),
            (CONFIG_FILE_PATH, config_yaml(&["fr", "de"])),
        ],
        MockTranslator::new(MockMode::Wrap).with_delay(20),
        SyncOptions {
            batch_size: 1,
            ..SyncOptions::default()
        },
    );

    let report = h
        .coordinator
        .run(&event(&[CONFIG_FILE_PATH], None, None), &h.config())
        .await
        .unwrap();
    assert_eq!(report.state, RunState::Done);

    // Each language sends two batches. Run one after the other, the first two
    // calls would belong to the same language.
    let calls = h.translator.calls();
    assert_eq!(calls.len(), 4);
    assert_ne!(calls[0].language, calls[1].language);
    assert_ne!(calls[2].language, calls[3].language);
}

// ---------------------------------------------------------------------------
// Configuration proposal and records on disk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn propose_config_opens_initial_pr_once() {
    let h = Harness::new(&[(SOURCE, json("{}"))], MockTranslator::new(MockMode::Wrap));

    let outcome = h
        .coordinator
        .propose_config(REPO, "main", Some(SOURCE))
        .await
        .unwrap();
    let PublishOutcome::Published { pull_request, .. } = outcome else {
        panic!("expected a pull request");
    };
    assert_eq!(pull_request.branch, "translatabot/config");
    let yaml = h.host.read("translatabot/config", CONFIG_FILE_PATH).unwrap();
    assert_eq!(config::parse(&yaml).unwrap().default_path, SOURCE);
    assert_eq!(
        h.store.find(REPO, pull_request.number).unwrap().unwrap().kind,
        PullRequestType::Initial
    );

    h.push(&[(CONFIG_FILE_PATH, yaml)]);
    let again = h
        .coordinator
        .propose_config(REPO, "main", Some(SOURCE))
        .await
        .unwrap();
    assert_eq!(again, PublishOutcome::NoOp);
}

#[tokio::test]
async fn records_persist_to_json_files() {
    let tmp = TempDir::new().unwrap();
    let host = Arc::new(MemoryHost::new(
        "main",
        [
            (SOURCE.to_string(), json(r#"{"a":"x"}"#)),
            (CONFIG_FILE_PATH.to_string(), config_yaml(&["fr"])),
        ],
    ));
    let store = Arc::new(FileRecordStore::new(tmp.path()));
    let coordinator = Coordinator::new(
        host.clone(),
        Arc::new(MockTranslator::new(MockMode::Wrap)),
        store.clone(),
        SyncOptions::default(),
    );
    let config = config::parse(&config_yaml(&["fr"])).unwrap();

    coordinator
        .run(&event(&[CONFIG_FILE_PATH], None, None), &config)
        .await
        .unwrap();

    let record = store.find(REPO, 1).unwrap().unwrap();
    assert_eq!(record.content_per_file[0].path, "locales/fr.json");
    assert!(!record.content_size_limit_exceeded);
    assert!(store.store_path(REPO).exists());
}
