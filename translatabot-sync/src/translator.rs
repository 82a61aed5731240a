//! Translation capability.
//!
//! [`Translator`] is the contract the batch orchestrator depends on: a batch
//! of source texts plus a target language in, one translated text per input
//! out, order preserved. Implementations that do not keep the count are caught
//! by the orchestrator, not here.
//!
//! [`LineTranslator`] adapts a plain text-completion model (prompt in, text
//! out) to that contract using a one-value-per-line protocol.

use async_trait::async_trait;

use translatabot_core::LanguageName;

use crate::error::SyncError;

/// Batch translation provider.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` into `language`.
    ///
    /// `context` is the output of the previous batch of the same file, given
    /// to keep terminology and tone consistent across batches.
    async fn translate_batch(
        &self,
        texts: &[String],
        language: &LanguageName,
        context: Option<&str>,
    ) -> Result<Vec<String>, SyncError>;

    /// Name of the provider, for logs.
    fn provider_name(&self) -> &str;
}

/// A generative text model: one prompt, one response.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, SyncError>;

    fn model_name(&self) -> &str;
}

const INSTRUCTIONS: &str = "You are a translator of web and mobile applications.\n\
You translate localization files into different languages.\n\
Make sure to only ever translate the translation values, never the keys.\n";

/// Prompt for translating one batch of labels, one label per line.
pub fn labels_prompt(lines: &str, language: &LanguageName, context: Option<&str>) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + lines.len() + 256);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(&format!(
        "Translate each of the following lines into {language}.\n\
         Answer with exactly one translated line per input line, in the same order.\n\
         Keep the escape sequences \\n and \\\\ unchanged.\n"
    ));
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        prompt.push_str("Lines translated just before these, for consistent terminology:\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Lines:\n");
    prompt.push_str(lines);
    prompt
}

/// Strip a surrounding Markdown code fence and one terminating newline from a
/// model response. Other whitespace is part of the translated values.
pub fn clean_response(response: &str) -> String {
    let mut text = strip_newline(response);
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(idx) => &text[idx + 1..],
            None => "",
        };
        if let Some(stripped) = text.trim_end_matches([' ', '\t']).strip_suffix("```") {
            text = strip_newline(stripped);
        }
    }
    text.to_string()
}

fn strip_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Encode a value so it occupies exactly one line.
pub fn encode_line(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Inverse of [`encode_line`].
pub fn decode_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// [`Translator`] over a [`TextCompletion`] model using one value per line.
pub struct LineTranslator<C> {
    completion: C,
}

impl<C: TextCompletion> LineTranslator<C> {
    pub fn new(completion: C) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl<C: TextCompletion> Translator for LineTranslator<C> {
    async fn translate_batch(
        &self,
        texts: &[String],
        language: &LanguageName,
        context: Option<&str>,
    ) -> Result<Vec<String>, SyncError> {
        let lines = texts
            .iter()
            .map(|t| encode_line(t))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = labels_prompt(&lines, language, context);
        let response = self.completion.complete(&prompt).await?;
        let cleaned = clean_response(&response);
        let mut values: Vec<String> = cleaned
            .split('\n')
            .map(|line| decode_line(line.trim_end_matches('\r')))
            .collect();
        // An empty last value and the response's terminating newline look the
        // same once the newline is stripped.
        if values.len() + 1 == texts.len() && texts.last().is_some_and(|t| t.is_empty()) {
            values.push(String::new());
        }
        Ok(values)
    }

    fn provider_name(&self) -> &str {
        self.completion.model_name()
    }
}
