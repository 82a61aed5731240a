//! `translatabot flatten <file>` — print the flattened mapping.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use translatabot_core::flatten;

use super::read_document;

#[derive(Args, Debug)]
pub struct FlattenArgs {
    /// Localization JSON file.
    pub file: PathBuf,
}

impl FlattenArgs {
    pub fn run(self) -> Result<()> {
        let document = read_document(&self.file)?;
        for (path, value) in &flatten(&document) {
            let quoted = serde_json::to_string(value).context("failed to quote value")?;
            println!("{path} = {quoted}");
        }
        Ok(())
    }
}
