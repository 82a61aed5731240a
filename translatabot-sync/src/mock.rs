//! Deterministic, network-free translator.
//!
//! Used by the test suites and by the CLI `preview` command.
//!
//! ```ignore
//! let mock = MockTranslator::new(MockMode::Wrap);
//! let out = mock.translate_batch(&["hi".into()], &"fr".into(), None).await?;
//! assert_eq!(out, vec!["<fr(hi)>"]);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use translatabot_core::LanguageName;

use crate::error::SyncError;
use crate::translator::Translator;

/// Behaviour of a [`MockTranslator`] for one language.
#[derive(Debug, Clone)]
pub enum MockMode {
    /// `"hi"` → `"<fr(hi)>"` for language `fr`.
    Wrap,
    /// Drop the last value of every response, simulating a model that merged
    /// two lines.
    DropLast,
    /// Fail every call.
    Error(String),
}

/// One recorded `translate_batch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub language: LanguageName,
    pub texts: Vec<String>,
    pub context: Option<String>,
}

/// Mock translator with per-language modes and call recording.
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    overrides: HashMap<LanguageName, MockMode>,
    delay_ms: u64,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            overrides: HashMap::new(),
            delay_ms: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Use `mode` for `language` instead of the default mode.
    pub fn with_language_mode(mut self, language: impl Into<LanguageName>, mode: MockMode) -> Self {
        self.overrides.insert(language.into(), mode);
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Calls made so far, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls made so far for one language.
    pub fn calls_for(&self, language: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.language.as_str() == language)
            .collect()
    }

    fn mode_for(&self, language: &LanguageName) -> &MockMode {
        self.overrides.get(language).unwrap_or(&self.mode)
    }
}

/// The value [`MockMode::Wrap`] produces.
pub fn wrap(text: &str, language: &LanguageName) -> String {
    format!("<{language}({text})>")
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        language: &LanguageName,
        context: Option<&str>,
    ) -> Result<Vec<String>, SyncError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                language: language.clone(),
                texts: texts.to_vec(),
                context: context.map(str::to_string),
            });
        }

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        match self.mode_for(language) {
            MockMode::Wrap => Ok(texts.iter().map(|t| wrap(t, language)).collect()),
            MockMode::DropLast => {
                let mut out: Vec<String> = texts.iter().map(|t| wrap(t, language)).collect();
                out.pop();
                Ok(out)
            }
            MockMode::Error(message) => Err(SyncError::Translation {
                language: language.clone(),
                message: message.clone(),
            }),
        }
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
