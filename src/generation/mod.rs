// Generation module
// Chat-completion translation grounded on retrieved official card texts


pub mod openai;
pub mod prompt;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::database::ContextResult;
use crate::languages::Language;
use crate::markup;

pub use openai::OpenAiChatClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("chat completion timed out after {0:?}")]
    Timeout(Duration),
    #[error("chat API error: HTTP {status} - {body}")]
    Status { status: u16, body: String },
    #[error("chat request failed: {0}")]
    Transport(String),
    #[error("failed to decode chat response: {0}")]
    Decode(String),
    #[error("no translation returned")]
    NoChoices,
    #[error("translation is empty")]
    EmptyContent,
    #[error("translation dropped game symbols: {}", missing.join(", "))]
    MarkupLost { missing: Vec<String> },
    #[error("generation task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait ChatGenerator: Send + Sync {
    /// Translate `english_text` into `language` using `context` as reference.
    ///
    /// The returned text is trimmed. Symbol preservation is checked by the
    /// caller with [`verify_markup`].
    async fn generate(
        &self,
        english_text: &str,
        context: &[ContextResult],
        language: Language,
    ) -> Result<String, GenerationError>;
}

/// Fails with [`GenerationError::MarkupLost`] when `translation` is missing
/// any single-bracket symbol of `source`.
#[inline]
pub fn verify_markup(source: &str, translation: &str) -> Result<(), GenerationError> {
    let missing = markup::missing_symbols(source, translation);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GenerationError::MarkupLost {
            missing: missing.into_iter().map(str::to_string).collect(),
        })
    }
}
