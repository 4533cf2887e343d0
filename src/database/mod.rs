// Database module
// Card faces with their embeddings, searchable by cosine distance

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::languages::Language;

pub use memory::MemoryCardStore;
pub use models::{ContextResult, Coverage, EmbeddedCardText};
pub use postgres::{PgCardStore, TABLE_NAME};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("vector has {actual} dimensions, store expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("card {code} has no translations and cannot be stored")]
    Untranslated { code: String },
}

/// Storage of embedded card faces.
///
/// `nearest` only returns rows that carry the requested language, ordered by
/// cosine distance to the query, closest first.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn nearest(
        &self,
        query: &[f32],
        k: usize,
        language: Language,
    ) -> Result<Vec<ContextResult>, StoreError>;

    /// Insert all rows or none of them. Returns the number of rows written.
    async fn insert_batch(&self, rows: &[EmbeddedCardText]) -> Result<u64, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    async fn coverage(&self) -> Result<Coverage, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

fn ensure_translated(rows: &[EmbeddedCardText]) -> Result<(), StoreError> {
    match rows.iter().find(|row| row.card.translations.is_empty()) {
        Some(row) => Err(StoreError::Untranslated {
            code: row.card.code.clone(),
        }),
        None => Ok(()),
    }
}
