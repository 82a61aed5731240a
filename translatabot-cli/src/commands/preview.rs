//! `translatabot preview` — run the merge with a mock translator and show the
//! unified diff against the existing target file. Nothing is written.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use translatabot_core::{diff, LanguageName};
use translatabot_sync::{
    preview, update_language, BatchOrchestrator, MockMode, MockTranslator, DEFAULT_BATCH_SIZE,
};

use super::read_flat_or_empty;

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Source file at the current revision.
    #[arg(long)]
    pub current: PathBuf,

    /// Existing translated file; may not exist yet.
    #[arg(long)]
    pub target: PathBuf,

    /// Source file at the previous revision; omitted means every entry is new.
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Language name the mock translator tags values with.
    #[arg(long, default_value = "fr")]
    pub language: String,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl PreviewArgs {
    pub fn run(self) -> Result<()> {
        if !self.current.exists() {
            anyhow::bail!("source file {} not found", self.current.display());
        }
        let current = read_flat_or_empty(Some(&self.current))?;
        let previous = read_flat_or_empty(self.previous.as_deref())?;
        let existing = read_flat_or_empty(Some(&self.target))?;
        let existing_text = if self.target.exists() {
            Some(
                std::fs::read_to_string(&self.target)
                    .with_context(|| format!("failed to read {}", self.target.display()))?,
            )
        } else {
            None
        };

        let changes = diff(&previous, &current);
        let language = LanguageName::from(self.language.as_str());
        let translator = MockTranslator::new(MockMode::Wrap);
        let orchestrator = BatchOrchestrator::new(self.batch_size);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let update = runtime
            .block_on(update_language(
                &orchestrator,
                &translator,
                &language,
                &current,
                &changes,
                &existing,
            ))
            .context("merge failed")?;

        let label = self.target.display().to_string();
        match preview(existing_text.as_deref(), &update.content, &label) {
            None => println!("No differences for {label}."),
            Some(diff) => {
                print!("{}", diff.unified_diff);
                if !diff.unified_diff.ends_with('\n') {
                    println!();
                }
                tracing::info!(translated = update.translated, "entries would be translated");
            }
        }
        Ok(())
    }
}
