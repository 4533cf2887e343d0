
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, EmbeddingError};
use crate::config::{ConfigError, OpenAiConfig};
use crate::openai::{OpenAiHttp, RequestFailure};

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    http: OpenAiHttp,
    model: String,
    dimension: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl From<RequestFailure> for EmbeddingError {
    #[inline]
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Timeout(after) => Self::Timeout(after),
            RequestFailure::Status { status, body } => Self::Status { status, body },
            RequestFailure::Transport(message) => Self::Transport(message),
        }
    }
}

impl OpenAiEmbedder {
    /// Build a client from the OpenAI section of the configuration.
    ///
    /// Fails when the base URL is invalid or no API key is configured.
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self, ConfigError> {
        let http = OpenAiHttp::new(config, config.embedding_timeout())?;

        Ok(Self {
            http,
            model: config.embedding_model.clone(),
            dimension: usize::try_from(config.embedding_dimension).ok(),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Accept vectors of any length.
    #[inline]
    pub fn without_dimension_check(mut self) -> Self {
        self.dimension = None;
        self
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.http.timeout()
    }

    /// Blocking variant of [`Embedder::embed`].
    #[inline]
    pub fn embed_blocking(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        let response_text = self.http.post_json("embeddings", &request)?;

        let response: EmbeddingResponse = serde_json::from_str(&response_text)
            .map_err(|e| EmbeddingError::Decode(e.to_string()))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or(EmbeddingError::Empty)?;

        if embedding.is_empty() {
            return Err(EmbeddingError::Empty);
        }

        match self.dimension {
            Some(expected) if embedding.len() != expected => {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            _ => {}
        }

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[inline]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let client = self.clone();
        let text = text.to_string();

        tokio::task::spawn_blocking(move || client.embed_blocking(&text))
            .await
            .map_err(|e| EmbeddingError::Task(e.to_string()))?
    }

    #[inline]
    fn model(&self) -> &str {
        &self.model
    }
}
