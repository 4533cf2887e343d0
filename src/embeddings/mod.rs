// Embeddings module
// Text to vector, used identically for corpus texts and user queries

pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiEmbedder;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    #[error("embedding request timed out after {0:?}")]
    Timeout(Duration),
    #[error("embedding API error: HTTP {status} - {body}")]
    Status { status: u16, body: String },
    #[error("embedding request failed: {0}")]
    Transport(String),
    #[error("failed to decode embedding response: {0}")]
    Decode(String),
    #[error("no embedding returned")]
    Empty,
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding task failed: {0}")]
    Task(String),
}

/// Produces a fixed-length vector for a text.
///
/// Implementations never return an empty vector: a missing result is an
/// error.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Identifier of the embedding model, for logs and reports.
    fn model(&self) -> &str;
}
