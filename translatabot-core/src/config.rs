//! Repository configuration (`.github/translatabot.yml`).
//!
//! # File shape
//!
//! ```text
//! version: 1
//! defaultPath: locales/en.json   # source-of-truth file
//! languages:
//!   - relativePath: de.json      # resolved against dirname(defaultPath)
//!     language: German
//! ```
//!
//! # API pattern
//!
//! - [`parse`] — YAML text → verified [`SyncConfig`]
//! - [`load_at`] — read a local file, then [`parse`]
//! - [`default_config_yaml`] — starter file proposed to new repositories

use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::{LanguageName, SyncConfig, TargetLanguage};

/// Location of the configuration file inside a hosted repository.
pub const CONFIG_FILE_PATH: &str = ".github/translatabot.yml";

const FALLBACK_DEFAULT_PATH: &str = "path/to/translation_file.json";

const DEFAULT_PATH_COMMENT: &str = "Path to the default translation file";
const RELATIVE_PATH_COMMENT: &str = "Relative path to the auto-translated file";
const LANGUAGE_COMMENT: &str = "English name of the language to be translated to";

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Parse and verify configuration text.
pub fn parse(contents: &str) -> Result<SyncConfig, ConfigError> {
    let config: SyncConfig = serde_yaml::from_str(contents)?;
    verify(config)
}

/// Load and verify the configuration file at `path`.
///
/// Returns `ConfigError::Parse` (with the file path) if the YAML is malformed.
pub fn load_at(path: &Path) -> Result<SyncConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: SyncConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    verify(config)
}

/// Reject configurations the engine cannot act on.
pub fn verify(config: SyncConfig) -> Result<SyncConfig, ConfigError> {
    if config.default_path.trim().is_empty() {
        return Err(ConfigError::MissingDefaultPath);
    }
    if config.languages.is_empty() {
        return Err(ConfigError::NoLanguages);
    }

    let mut names = HashSet::new();
    let mut outputs = HashSet::new();
    for target in &config.languages {
        if !names.insert(target.language.0.to_lowercase()) {
            return Err(ConfigError::DuplicateLanguage(target.language.0.clone()));
        }
        if !outputs.insert(config.target_path(target)) {
            return Err(ConfigError::DuplicateLanguage(target.relative_path.clone()));
        }
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// 2. Paths
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Repository path of the translated file for `target`:
    /// `dirname(defaultPath)/relativePath`, normalised lexically.
    pub fn target_path(&self, target: &TargetLanguage) -> String {
        let dir = match self.default_path.rfind('/') {
            Some(idx) => &self.default_path[..idx],
            None => "",
        };
        normalize_repo_path(&format!("{dir}/{}", target.relative_path))
    }

    /// Find a configured language by name, case-insensitively.
    pub fn language(&self, name: &str) -> Option<&TargetLanguage> {
        self.languages
            .iter()
            .find(|t| t.language.0.eq_ignore_ascii_case(name))
    }
}

/// Collapse `.`, `..` and empty segments of a `/`-separated repository path.
/// Leading `..` segments that would escape the repository root are dropped.
pub fn normalize_repo_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

// ---------------------------------------------------------------------------
// 3. Template
// ---------------------------------------------------------------------------

/// Starter configuration proposed to a repository without one: a single
/// German target next to the source file, annotated with comments.
pub fn default_config_yaml(default_path: Option<&str>) -> Result<String, ConfigError> {
    let config = SyncConfig {
        version: 1,
        default_path: default_path.unwrap_or(FALLBACK_DEFAULT_PATH).to_string(),
        languages: vec![TargetLanguage {
            relative_path: "de.json".to_string(),
            language: LanguageName::from("German"),
        }],
    };
    let yaml = serde_yaml::to_string(&config)?;

    let mut out = String::with_capacity(yaml.len() + 160);
    let mut seen_relative = false;
    let mut seen_language = false;
    for line in yaml.lines() {
        let trimmed = line.trim_start().trim_start_matches("- ");
        let comment = if trimmed.starts_with("defaultPath:") {
            Some(DEFAULT_PATH_COMMENT)
        } else if trimmed.starts_with("relativePath:") && !seen_relative {
            seen_relative = true;
            Some(RELATIVE_PATH_COMMENT)
        } else if trimmed.starts_with("language:") && !seen_language {
            seen_language = true;
            Some(LANGUAGE_COMMENT)
        } else {
            None
        };
        out.push_str(line);
        if let Some(comment) = comment {
            out.push_str(" # ");
            out.push_str(comment);
        }
        out.push('\n');
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
