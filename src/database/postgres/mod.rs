#[cfg(test)]
mod tests;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use itertools::Itertools;
use pgvector::Vector;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Row};
use tracing::{debug, info};

use super::{CardStore, ContextResult, Coverage, EmbeddedCardText, StoreError, ensure_translated};
use crate::config::DatabaseConfig;
use crate::languages::Language;

pub const TABLE_NAME: &str = "card_embeddings";

const ACQUIRE_TIMEOUT_SECONDS: u64 = 10;
const IVFFLAT_LISTS: u32 = 100;

/// Card store backed by Postgres with the pgvector extension.
#[derive(Debug, Clone)]
pub struct PgCardStore {
    pool: PgPool,
    dimension: usize,
}

#[derive(Debug, FromRow)]
struct NearestRow {
    card_code: String,
    card_name: String,
    is_back: bool,
    english_text: String,
    translated_text: String,
}

impl PgCardStore {
    #[inline]
    pub async fn connect(config: &DatabaseConfig, dimension: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECONDS))
            .connect(&config.connection_url())
            .await
            .with_context(|| format!("Failed to connect to database at {}", config.redacted_url()))?;

        info!("Connected to {}", config.redacted_url());
        Ok(Self::from_pool(pool, dimension))
    }

    #[inline]
    pub fn from_pool(pool: PgPool, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Create the extension, table and indexes when missing.
    #[inline]
    pub async fn setup_schema(&self) -> Result<(), StoreError> {
        info!("Ensuring {} schema ({} dims)", TABLE_NAME, self.dimension);

        for statement in schema_statements(self.dimension) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }

        debug!("Schema ready");
        Ok(())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }
}

#[async_trait]
impl CardStore for PgCardStore {
    #[inline]
    async fn nearest(
        &self,
        query: &[f32],
        k: usize,
        language: Language,
    ) -> Result<Vec<ContextResult>, StoreError> {
        self.check_dimension(query)?;

        let sql = nearest_sql(language);
        let limit = i64::try_from(k).unwrap_or(i64::MAX);

        let rows: Vec<NearestRow> = sqlx::query_as(&sql)
            .bind(Vector::from(query.to_vec()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!("{} context rows for {}", rows.len(), language);

        Ok(rows
            .into_iter()
            .map(|row| ContextResult {
                card_code: row.card_code,
                card_name: row.card_name,
                is_back: row.is_back,
                english_text: row.english_text,
                translated_text: row.translated_text,
                language,
            })
            .collect())
    }

    #[inline]
    async fn insert_batch(&self, rows: &[EmbeddedCardText]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        ensure_translated(rows)?;
        for row in rows {
            self.check_dimension(&row.embedding)?;
        }

        let sql = insert_sql();
        let mut transaction = self.pool.begin().await?;
        let mut inserted = 0;

        for row in rows {
            let mut query = sqlx::query(&sql)
                .bind(&row.card.code)
                .bind(&row.card.name)
                .bind(row.card.side.is_back())
                .bind(&row.card.english_text);
            for language in Language::ALL {
                query = query.bind(row.card.translations.get(&language).map(String::as_str));
            }
            let result = query
                .bind(Vector::from(row.embedding.clone()))
                .execute(&mut *transaction)
                .await?;
            inserted += result.rows_affected();
        }

        // Dropping an uncommitted transaction rolls it back.
        transaction.commit().await?;

        debug!("Inserted {} rows", inserted);
        Ok(inserted)
    }

    #[inline]
    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("TRUNCATE TABLE {TABLE_NAME} RESTART IDENTITY"))
            .execute(&self.pool)
            .await?;
        info!("Cleared {}", TABLE_NAME);
        Ok(())
    }

    #[inline]
    async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[inline]
    async fn coverage(&self) -> Result<Coverage, StoreError> {
        let row = sqlx::query(&coverage_sql()).fetch_one(&self.pool).await?;

        let mut coverage = Coverage {
            total: row.try_get("total")?,
            last_inserted_at: row.try_get("last_inserted_at")?,
            ..Coverage::default()
        };
        for language in Language::ALL {
            coverage
                .per_language
                .insert(language, row.try_get(language.column())?);
        }

        Ok(coverage)
    }

    #[inline]
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn schema_statements(dimension: usize) -> Vec<String> {
    let language_columns = Language::ALL
        .iter()
        .map(|language| format!("{} TEXT,", language.column()))
        .join("\n            ");

    vec![
        "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
            id SERIAL PRIMARY KEY,
            card_code TEXT NOT NULL,
            card_name TEXT NOT NULL,
            is_back BOOLEAN NOT NULL DEFAULT FALSE,
            english_text TEXT NOT NULL,
            {language_columns}
            embedding vector({dimension}),
            created_at TIMESTAMPTZ DEFAULT NOW()
        )"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {TABLE_NAME}_embedding_idx ON {TABLE_NAME} \
             USING ivfflat (embedding vector_cosine_ops) WITH (lists = {IVFFLAT_LISTS})"
        ),
        format!("CREATE INDEX IF NOT EXISTS {TABLE_NAME}_card_code_idx ON {TABLE_NAME} (card_code)"),
        format!("CREATE INDEX IF NOT EXISTS {TABLE_NAME}_card_name_idx ON {TABLE_NAME} (card_name)"),
        format!("CREATE INDEX IF NOT EXISTS {TABLE_NAME}_is_back_idx ON {TABLE_NAME} (is_back)"),
    ]
}

fn nearest_sql(language: Language) -> String {
    let column = language.column();
    format!(
        "SELECT card_code, card_name, is_back, english_text, {column} AS translated_text \
         FROM {TABLE_NAME} \
         WHERE embedding IS NOT NULL AND card_code IS NOT NULL AND {column} IS NOT NULL \
         ORDER BY embedding <=> $1 \
         LIMIT $2"
    )
}

fn insert_sql() -> String {
    let language_columns = Language::ALL.iter().map(|l| l.column()).join(", ");
    let placeholders = (1..=Language::ALL.len() + 5)
        .map(|i| format!("${i}"))
        .join(", ");

    format!(
        "INSERT INTO {TABLE_NAME} \
         (card_code, card_name, is_back, english_text, {language_columns}, embedding) \
         VALUES ({placeholders})"
    )
}

fn coverage_sql() -> String {
    let counts = Language::ALL
        .iter()
        .map(|l| format!("COUNT({0}) AS {0}", l.column()))
        .join(", ");

    format!(
        "SELECT COUNT(*) AS total, {counts}, MAX(created_at) AS last_inserted_at FROM {TABLE_NAME}"
    )
}
