// Ingestion pipeline
// Corpus files -> reconciled card faces -> embeddings -> vector store


use std::sync::Arc;

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cards::{CardText, CorpusLoader, reconcile};
use crate::database::{CardStore, EmbeddedCardText};
use crate::embeddings::Embedder;
use crate::{LocalizeError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    pub batch_size: usize,
    /// Empty the table before inserting.
    pub clear: bool,
    /// Keep only the first `n` reconciled entries.
    pub limit: Option<usize>,
}

impl Default for IngestOptions {
    #[inline]
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            clear: false,
            limit: None,
        }
    }
}

/// Reconciled corpus ready for embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedCorpus {
    pub entries: Vec<CardText>,
    pub cards_read: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub cards_read: usize,
    pub entries_extracted: usize,
    pub skipped: usize,
    pub embedding_failures: usize,
    pub rows_inserted: u64,
    pub batches: usize,
    pub total_rows: i64,
}

/// Load and reconcile the corpus under `loader`'s root without touching the
/// network or the store.
#[inline]
pub fn prepare(loader: &CorpusLoader, limit: Option<usize>) -> anyhow::Result<PreparedCorpus> {
    let canonical = loader.load_canonical()?;
    let translations = loader.load_all_translations()?;
    let reconciliation = reconcile(&canonical.sides, &translations);

    let skipped = canonical.skipped + reconciliation.skipped();
    let mut entries = reconciliation.entries;
    if let Some(limit) = limit.filter(|&limit| limit > 0) {
        if entries.len() > limit {
            info!("Limiting ingestion to {} of {} entries", limit, entries.len());
            entries.truncate(limit);
        }
    }

    Ok(PreparedCorpus {
        entries,
        cards_read: canonical.cards_read,
        skipped,
    })
}

pub struct Ingester {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn CardStore>,
    options: IngestOptions,
    progress: ProgressBar,
}

impl Ingester {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn CardStore>, options: IngestOptions) -> Self {
        Self {
            embedder,
            store,
            options: IngestOptions {
                batch_size: options.batch_size.max(1),
                ..options
            },
            progress: ProgressBar::hidden(),
        }
    }

    /// Show a progress bar over embedded entries when stderr is a terminal.
    #[inline]
    #[must_use]
    pub fn with_progress(mut self) -> Self {
        if console::user_attended_stderr() {
            self.progress = ProgressBar::new(0).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] batch {msg}")
                    .expect("style template is valid"),
            );
        }
        self
    }

    #[inline]
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Run the whole pipeline: load, reconcile, optional clear, embed, insert.
    ///
    /// The store is only cleared once the corpus has loaded and yielded at
    /// least one entry. Entries whose embedding fails are logged and left out.
    /// A batch that fails to insert aborts the run.
    #[inline]
    pub async fn run(&self, loader: &CorpusLoader) -> Result<IngestReport> {
        let prepared = prepare(loader, self.options.limit)?;
        info!(
            "Prepared {} entries from {} cards ({} skipped)",
            prepared.entries.len(),
            prepared.cards_read,
            prepared.skipped
        );

        if prepared.entries.is_empty() {
            return Err(LocalizeError::Ingest(
                "no card entries found to ingest".to_string(),
            ));
        }

        if self.options.clear {
            info!("Clearing existing card rows");
            self.store.clear().await?;
        }

        let mut report = IngestReport {
            cards_read: prepared.cards_read,
            entries_extracted: prepared.entries.len(),
            skipped: prepared.skipped,
            ..IngestReport::default()
        };

        self.ingest_entries(&prepared.entries, &mut report).await?;
        report.total_rows = self.store.count().await?;

        info!(
            "Ingestion finished: {} rows inserted, {} embedding failures, {} rows total",
            report.rows_inserted, report.embedding_failures, report.total_rows
        );
        Ok(report)
    }

    /// Embed and insert already reconciled entries, batch after batch.
    #[inline]
    pub async fn ingest_entries(&self, entries: &[CardText], report: &mut IngestReport) -> Result<()> {
        let batch_count = entries.len().div_ceil(self.options.batch_size);
        self.progress.set_length(entries.len() as u64);

        for (index, batch) in entries.chunks(self.options.batch_size).enumerate() {
            let number = index + 1;
            self.progress.set_message(format!("{number}/{batch_count}"));
            debug!("Processing batch {}/{} ({} entries)", number, batch_count, batch.len());

            let rows = self.embed_batch(batch).await;
            report.embedding_failures += batch.len() - rows.len();

            if !rows.is_empty() {
                let inserted = self.store.insert_batch(&rows).await.map_err(|e| {
                    LocalizeError::Ingest(format!("batch {number}/{batch_count} failed to insert: {e}"))
                })?;
                report.rows_inserted += inserted;
            }

            report.batches += 1;
            self.progress.inc(batch.len() as u64);
        }

        self.progress.finish_and_clear();
        Ok(())
    }

    /// Embed every entry of `batch` concurrently and wait for all of them.
    /// The returned rows keep the batch order.
    async fn embed_batch(&self, batch: &[CardText]) -> Vec<EmbeddedCardText> {
        let results = join_all(
            batch
                .iter()
                .map(|card| self.embedder.embed(&card.english_text)),
        )
        .await;

        batch
            .iter()
            .zip(results)
            .filter_map(|(card, result)| match result {
                Ok(embedding) => Some(EmbeddedCardText {
                    card: card.clone(),
                    embedding,
                }),
                Err(e) => {
                    warn!("Failed to embed {} side of card {}: {}", card.side, card.code, e);
                    None
                }
            })
            .collect()
    }
}
