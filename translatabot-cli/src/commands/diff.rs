//! `translatabot diff <previous> <current>` — classify source entries.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use translatabot_core::{diff, flatten, Change};

use super::read_document;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Source file at the previous revision.
    pub previous: PathBuf,

    /// Source file at the current revision.
    pub current: PathBuf,

    /// Also list unchanged entries.
    #[arg(long)]
    pub all: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let previous = flatten(&read_document(&self.previous)?);
        let current = flatten(&read_document(&self.current)?);
        let changes = diff(&previous, &current);

        for (path, change) in changes.iter() {
            if change == Change::Unchanged && !self.all {
                continue;
            }
            let value = match change {
                Change::Removed => previous.get(path),
                _ => current.get(path),
            };
            let value = value.map(String::as_str).unwrap_or_default();
            println!("{} {path} = {value:?}", marker(change));
        }

        let summary = changes.summary();
        if changes.is_noop() {
            println!("No changes ({} entries).", summary.unchanged);
        } else {
            println!("{summary}");
        }
        Ok(())
    }
}

fn marker(change: Change) -> String {
    match change {
        Change::Added => "+".green().bold().to_string(),
        Change::Modified => "~".yellow().bold().to_string(),
        Change::Removed => "-".red().bold().to_string(),
        Change::Unchanged => "·".bright_black().to_string(),
    }
}
