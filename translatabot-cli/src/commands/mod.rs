pub mod diff;
pub mod flatten;
pub mod init_config;
pub mod plan;
pub mod preview;

use std::path::Path;

use anyhow::{Context, Result};

use translatabot_core::{flatten, FlatMap, LocalizationDocument};

/// Parse a localization file from disk.
pub(crate) fn read_document(path: &Path) -> Result<LocalizationDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    LocalizationDocument::parse(&text)
        .with_context(|| format!("{} is not a valid localization file", path.display()))
}

/// Flattened file, or an empty mapping when `path` is `None` or missing.
pub(crate) fn read_flat_or_empty(path: Option<&Path>) -> Result<FlatMap> {
    match path {
        Some(path) if path.exists() => Ok(flatten(&read_document(path)?)),
        _ => Ok(FlatMap::new()),
    }
}
