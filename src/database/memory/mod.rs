
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{CardStore, ContextResult, Coverage, EmbeddedCardText, StoreError, ensure_translated};
use crate::languages::Language;

/// Brute-force card store kept in memory.
///
/// Ranks with the same cosine distance as the pgvector index. Ties keep
/// insertion order.
#[derive(Debug, Default)]
pub struct MemoryCardStore {
    rows: RwLock<Vec<EmbeddedCardText>>,
    last_inserted_at: RwLock<Option<DateTime<Utc>>>,
    dimension: Option<usize>,
}

impl MemoryCardStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject vectors whose length differs from `dimension`.
    #[inline]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            rows: RwLock::default(),
            last_inserted_at: RwLock::default(),
            dimension: Some(dimension),
        }
    }

    /// Snapshot of the stored rows in insertion order.
    #[inline]
    pub fn rows(&self) -> Vec<EmbeddedCardText> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn expected_dimension(&self, rows: &[EmbeddedCardText]) -> Option<usize> {
        self.dimension
            .or_else(|| rows.first().map(|row| row.embedding.len()))
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    #[inline]
    async fn nearest(
        &self,
        query: &[f32],
        k: usize,
        language: Language,
    ) -> Result<Vec<ContextResult>, StoreError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(expected) = self.expected_dimension(&rows) {
            if query.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut ranked: Vec<(f32, &EmbeddedCardText, &String)> = rows
            .iter()
            .filter_map(|row| {
                let translated = row.card.translations.get(&language)?;
                Some((cosine_distance(query, &row.embedding), row, translated))
            })
            .collect();
        // Stable sort: equal distances stay in insertion order.
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(_, row, translated)| ContextResult {
                card_code: row.card.code.clone(),
                card_name: row.card.name.clone(),
                is_back: row.card.side.is_back(),
                english_text: row.card.english_text.clone(),
                translated_text: translated.clone(),
                language,
            })
            .collect())
    }

    #[inline]
    async fn insert_batch(&self, batch: &[EmbeddedCardText]) -> Result<u64, StoreError> {
        ensure_translated(batch)?;

        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let expected = self
            .expected_dimension(&rows)
            .or_else(|| batch.first().map(|row| row.embedding.len()));

        if let Some(expected) = expected {
            if let Some(row) = batch.iter().find(|row| row.embedding.len() != expected) {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: row.embedding.len(),
                });
            }
        }

        rows.extend_from_slice(batch);
        if !batch.is_empty() {
            *self
                .last_inserted_at
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
        }
        debug!("Stored {} rows in memory", batch.len());
        Ok(batch.len() as u64)
    }

    #[inline]
    async fn clear(&self) -> Result<(), StoreError> {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self
            .last_inserted_at
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    #[inline]
    async fn count(&self) -> Result<i64, StoreError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(i64::try_from(rows.len()).unwrap_or(i64::MAX))
    }

    #[inline]
    async fn coverage(&self) -> Result<Coverage, StoreError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);

        let mut coverage = Coverage {
            total: i64::try_from(rows.len()).unwrap_or(i64::MAX),
            last_inserted_at: *self
                .last_inserted_at
                .read()
                .unwrap_or_else(PoisonError::into_inner),
            ..Coverage::default()
        };
        for language in Language::ALL {
            let translated = rows
                .iter()
                .filter(|row| row.card.translations.contains_key(&language))
                .count();
            coverage
                .per_language
                .insert(language, i64::try_from(translated).unwrap_or(i64::MAX));
        }

        Ok(coverage)
    }

    #[inline]
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Cosine distance in `[0, 2]`. A zero vector is treated as maximally distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0_f64, 0.0_f64, 0.0_f64), |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (x.mul_add(y, dot), x.mul_add(x, na), y.mul_add(y, nb))
        });

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 2.0;
    }

    (1.0 - dot / denominator) as f32
}
