use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocalizeError>;

#[derive(Error, Debug)]
pub enum LocalizeError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] database::StoreError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] embeddings::EmbeddingError),

    #[error("Generation error: {0}")]
    Generation(#[from] generation::GenerationError),

    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("Translation error: {0}")]
    Translate(#[from] translator::TranslateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod cards;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod generation;
pub mod ingest;
pub mod languages;
pub mod markup;
mod openai;
pub mod retrieval;
pub mod server;
pub mod translator;
