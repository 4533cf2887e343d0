// Request orchestration
// embed -> retrieve -> generate for one translation request


use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::database::{CardStore, ContextResult};
use crate::embeddings::{Embedder, EmbeddingError, OpenAiEmbedder};
use crate::generation::{ChatGenerator, GenerationError, OpenAiChatClient, verify_markup};
use crate::languages::{Language, UnsupportedLanguage};
use crate::retrieval::{RetrievalError, RetrievalService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translation: String,
    pub language: Language,
    pub context: Vec<ContextResult>,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("text field is required")]
    EmptyText,
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
    #[error("failed to generate embedding: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("failed to retrieve context: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("failed to generate translation: {0}")]
    Generation(#[from] GenerationError),
}

impl TranslateError {
    /// Whether the request itself was at fault, as opposed to an upstream
    /// service or the store.
    #[inline]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyText
                | Self::UnsupportedLanguage(_)
                | Self::Retrieval(
                    RetrievalError::InvalidQuery(_) | RetrievalError::UnsupportedLanguage(_)
                )
        )
    }
}

fn default_language() -> String {
    Language::It.code().to_string()
}

impl TranslationRequest {
    #[inline]
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language: language.code().to_string(),
        }
    }
}

/// Shared, read-only translation pipeline.
pub struct Translator {
    embedder: Arc<dyn Embedder>,
    retrieval: RetrievalService,
    generator: Arc<dyn ChatGenerator>,
    context_size: usize,
}

impl Translator {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retrieval: RetrievalService,
        generator: Arc<dyn ChatGenerator>,
        context_size: usize,
    ) -> Self {
        Self {
            embedder,
            retrieval,
            generator,
            context_size: context_size.max(1),
        }
    }

    /// Build the OpenAI-backed pipeline over `store`.
    #[inline]
    pub fn from_config(config: &Config, store: Arc<dyn CardStore>) -> Result<Self, ConfigError> {
        let embedder = OpenAiEmbedder::new(&config.openai)?;
        let generator = OpenAiChatClient::new(&config.openai)?;
        let retrieval = RetrievalService::new(store, config.server.max_context_size as usize);

        Ok(Self::new(
            Arc::new(embedder),
            retrieval,
            Arc::new(generator),
            config.server.context_size as usize,
        ))
    }

    #[inline]
    pub fn context_size(&self) -> usize {
        self.context_size
    }

    /// Translate one request. Input is validated before any network call and
    /// a failure at any step fails the whole request.
    #[inline]
    pub async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResponse, TranslateError> {
        if request.text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }
        let language: Language = request.language.parse()?;

        info!("Translating {} chars into {}", request.text.len(), language);

        let query = self.embedder.embed(&request.text).await?;
        let context = self
            .retrieval
            .retrieve_for(&query, self.context_size, language)
            .await?;
        debug!("Using {} context cards", context.len());

        let translation = self
            .generator
            .generate(&request.text, &context, language)
            .await?;
        if let Err(error) = verify_markup(&request.text, &translation) {
            warn!("Rejecting {} translation: {}", language, error);
            return Err(error.into());
        }

        Ok(TranslationResponse {
            translation,
            language,
            context,
        })
    }
}
