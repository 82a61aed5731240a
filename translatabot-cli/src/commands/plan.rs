//! `translatabot plan` — what a sync run would translate, per language.
//!
//! Reads the configuration, the current source file under `--root`, every
//! target file next to it and, optionally, the previous source revision.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use translatabot_core::{config, diff, pending_paths, FlatMap, SyncConfig};
use translatabot_sync::{BatchOrchestrator, DEFAULT_BATCH_SIZE};

use super::read_flat_or_empty;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Configuration file (`.github/translatabot.yml`).
    #[arg(long)]
    pub config: PathBuf,

    /// Source file at the previous revision; omitted means every entry is new.
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Repository root the configured paths are relative to.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct PlanRow {
    #[tabled(rename = "language")]
    language: String,
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "mode")]
    mode: &'static str,
    #[tabled(rename = "entries")]
    entries: usize,
    #[tabled(rename = "batches")]
    batches: usize,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let config = config::load_at(&self.config)
            .with_context(|| format!("invalid configuration {}", self.config.display()))?;
        let source = self.root.join(&config.default_path);
        if !source.exists() {
            anyhow::bail!("source file {} not found", source.display());
        }
        let current = read_flat_or_empty(Some(&source))?;
        let previous = read_flat_or_empty(self.previous.as_deref())?;

        let rows = plan(
            &config,
            &self,
            &current,
            &previous,
            BatchOrchestrator::new(self.batch_size),
        )?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize plan")?
            );
            return Ok(());
        }

        let mut table = Table::new(rows.iter().cloned());
        table.with(Style::rounded());
        println!("{table}");
        let total: usize = rows.iter().map(|r| r.entries).sum();
        println!("{total} entries to translate across {} languages", rows.len());
        Ok(())
    }
}

fn plan(
    config: &SyncConfig,
    args: &PlanArgs,
    current: &FlatMap,
    previous: &FlatMap,
    orchestrator: BatchOrchestrator,
) -> Result<Vec<PlanRow>> {
    let changes = diff(previous, current);
    let mut rows = Vec::with_capacity(config.languages.len());
    for target in &config.languages {
        let file = config.target_path(target);
        let path = args.root.join(&file);
        let exists = path.exists();
        let existing = read_flat_or_empty(Some(&path))?;

        let (mode, entries) = if exists {
            let pending = pending_paths(&changes, &existing).len();
            let unchanged = pending == 0 && changes.removed().next().is_none();
            (if unchanged { "up to date" } else { "delta" }, pending)
        } else {
            ("full", current.len())
        };
        rows.push(PlanRow {
            language: target.language.to_string(),
            file,
            mode,
            entries,
            batches: orchestrator.batch_count(entries),
        });
    }
    Ok(rows)
}
