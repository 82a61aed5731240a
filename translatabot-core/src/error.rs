//! Error types for translatabot-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while converting between documents and flattened mappings.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A leaf that is neither a string, an object, nor an array.
    #[error("unsupported {kind} value at '{path}'; only strings, objects and arrays are allowed")]
    UnsupportedLeafType { path: String, kind: &'static str },

    /// The document root must be an object.
    #[error("localization document root must be an object, found {kind}")]
    RootNotObject { kind: &'static str },

    /// A flat path that cannot be parsed or placed into a document.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Malformed JSON input.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the merge engine.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A path classified as added or modified has no translated value.
    #[error("no translation provided for changed path '{path}'")]
    MissingTranslation { path: String },
}

/// Errors raised while loading or validating the repository configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (template rendering path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no default path found in config")]
    MissingDefaultPath,

    #[error("no languages found in config")]
    NoLanguages,

    /// Two target languages share a name or an output path.
    #[error("duplicate target language entry '{0}'")]
    DuplicateLanguage(String),
}
