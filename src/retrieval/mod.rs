// Retrieval service
// Validates a query before it reaches the store and bounds the result size


use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::database::{CardStore, StoreError};
use crate::languages::{Language, UnsupportedLanguage};

pub use crate::database::ContextResult;

pub const DEFAULT_MAX_K: usize = 12;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid query: {0}")]
    InvalidQuery(&'static str),
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
    #[error("vector store query failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct RetrievalService {
    store: Arc<dyn CardStore>,
    max_k: usize,
}

impl std::fmt::Debug for RetrievalService {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService")
            .field("max_k", &self.max_k)
            .finish_non_exhaustive()
    }
}

impl RetrievalService {
    #[inline]
    pub fn new(store: Arc<dyn CardStore>, max_k: usize) -> Self {
        Self {
            store,
            max_k: max_k.max(1),
        }
    }

    #[inline]
    pub fn max_k(&self) -> usize {
        self.max_k
    }

    #[inline]
    pub fn store(&self) -> &Arc<dyn CardStore> {
        &self.store
    }

    /// Up to `k` official card faces closest to `query` that carry a
    /// translation in `language_code`.
    ///
    /// The language and the query are checked before the store is touched.
    /// Fewer than `k` results, including none, is not an error.
    #[inline]
    pub async fn retrieve(
        &self,
        query: &[f32],
        k: usize,
        language_code: &str,
    ) -> Result<Vec<ContextResult>, RetrievalError> {
        let language: Language = language_code.parse()?;
        self.retrieve_for(query, k, language).await
    }

    #[inline]
    pub async fn retrieve_for(
        &self,
        query: &[f32],
        k: usize,
        language: Language,
    ) -> Result<Vec<ContextResult>, RetrievalError> {
        if query.is_empty() {
            return Err(RetrievalError::InvalidQuery("query vector is empty"));
        }
        if k == 0 {
            return Err(RetrievalError::InvalidQuery("k must be at least 1"));
        }

        let limit = k.min(self.max_k);
        if limit < k {
            debug!("Clamping k from {} to {}", k, limit);
        }

        let results = self.store.nearest(query, limit, language).await?;
        debug!("Retrieved {} context cards for {}", results.len(), language);
        Ok(results)
    }
}
