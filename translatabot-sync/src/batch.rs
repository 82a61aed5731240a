//! Translation batch orchestration.
//!
//! Units are split into consecutive batches of at most `batch_size` and
//! submitted strictly in order. The output of batch *n* is handed to batch
//! *n + 1* as context, so one language's batches form a fold:
//!
//! ```text
//! (context₀ = None, {}) ─batch 0→ (context₁, map₁) ─batch 1→ … → map
//! ```
//!
//! A response whose length differs from its batch aborts the whole language:
//! paths cannot be re-associated with a misaligned response.

use translatabot_core::{FlatMap, FlatPath, LanguageName};

use crate::error::SyncError;
use crate::translator::Translator;

/// Batch size used when the caller does not configure one.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// One entry awaiting translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub path: FlatPath,
    pub source: String,
    pub language: LanguageName,
}

impl TranslationUnit {
    /// Units for `paths`, taking source values from `source`. Paths absent
    /// from `source` are skipped.
    pub fn for_paths<'a, I>(paths: I, source: &FlatMap, language: &LanguageName) -> Vec<Self>
    where
        I: IntoIterator<Item = &'a FlatPath>,
    {
        paths
            .into_iter()
            .filter_map(|path| {
                source.get(path).map(|value| Self {
                    path: path.clone(),
                    source: value.clone(),
                    language: language.clone(),
                })
            })
            .collect()
    }

    /// Units for every entry of a document, for full translations.
    pub fn for_document(source: &FlatMap, language: &LanguageName) -> Vec<Self> {
        Self::for_paths(source.paths(), source, language)
    }
}

/// Accumulator threaded through the batches of one language.
#[derive(Debug, Default)]
struct BatchFold {
    context: Option<String>,
    translated: FlatMap,
}

impl BatchFold {
    async fn step(
        mut self,
        translator: &dyn Translator,
        index: usize,
        batch: &[TranslationUnit],
        language: &LanguageName,
    ) -> Result<Self, SyncError> {
        let texts: Vec<String> = batch.iter().map(|u| u.source.clone()).collect();
        tracing::debug!(
            language = %language,
            batch = index,
            units = texts.len(),
            provider = translator.provider_name(),
            "submitting translation batch"
        );

        let response = translator
            .translate_batch(&texts, language, self.context.as_deref())
            .await?;

        if response.len() != batch.len() {
            tracing::warn!(
                language = %language,
                batch = index,
                expected = batch.len(),
                actual = response.len(),
                "translation response misaligned"
            );
            return Err(SyncError::TranslationAlignment {
                language: language.clone(),
                batch: index,
                expected: batch.len(),
                actual: response.len(),
            });
        }

        let context = response.join("\n");
        for (unit, value) in batch.iter().zip(response) {
            self.translated.insert(unit.path.clone(), value);
        }
        self.context = Some(context);
        Ok(self)
    }
}

/// Splits units into bounded batches and runs them through a [`Translator`].
#[derive(Debug, Clone, Copy)]
pub struct BatchOrchestrator {
    batch_size: usize,
}

impl Default for BatchOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchOrchestrator {
    /// A zero batch size is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of requests `translate` will make for `units` entries.
    pub fn batch_count(&self, units: usize) -> usize {
        units.div_ceil(self.batch_size)
    }

    /// Translate `units` into `language`, returning `path → translation` in
    /// unit order.
    pub async fn translate(
        &self,
        translator: &dyn Translator,
        units: &[TranslationUnit],
        language: &LanguageName,
    ) -> Result<FlatMap, SyncError> {
        if let Some(stray) = units.iter().find(|u| &u.language != language) {
            return Err(SyncError::Translation {
                language: language.clone(),
                message: format!(
                    "unit '{}' targets {} but the batch targets {}",
                    stray.path, stray.language, language
                ),
            });
        }

        if units.len() > self.batch_size {
            tracing::info!(
                language = %language,
                units = units.len(),
                batches = self.batch_count(units.len()),
                "large translation split into batches"
            );
        }

        let mut fold = BatchFold::default();
        for (index, batch) in units.chunks(self.batch_size).enumerate() {
            fold = fold.step(translator, index, batch, language).await?;
        }
        Ok(fold.translated)
    }
}
