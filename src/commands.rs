use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use crate::cards::CorpusLoader;
use crate::config::Config;
use crate::database::{CardStore, PgCardStore};
use crate::embeddings::OpenAiEmbedder;
use crate::ingest::{IngestOptions, IngestReport, Ingester, prepare};
use crate::languages::Language;
use crate::server;
use crate::translator::{TranslationRequest, Translator};

/// Arguments of the `ingest` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestArgs {
    pub data: PathBuf,
    pub batch_size: Option<u32>,
    pub clear: bool,
    pub limit: Option<usize>,
    pub dry_run: bool,
    pub openai_key: Option<String>,
}

/// Load, reconcile, embed and store the card corpus under `args.data`
#[inline]
pub async fn run_ingest(mut config: Config, args: IngestArgs) -> Result<()> {
    anyhow::ensure!(
        args.data.is_dir(),
        "Data directory not found: {}",
        args.data.display()
    );

    if let Some(key) = args.openai_key {
        config.openai.api_key = Some(key);
    }
    if let Some(batch_size) = args.batch_size {
        config.ingest.set_batch_size(batch_size)?;
    }

    let loader = CorpusLoader::new(&args.data);

    if args.dry_run {
        let prepared = prepare(&loader, args.limit)?;
        println!("{}", style("🔎 Dry run (no embeddings, no database)").bold().cyan());
        println!("   Cards read: {}", prepared.cards_read);
        println!("   Entries to ingest: {}", prepared.entries.len());
        println!("   Skipped: {}", prepared.skipped);
        for language in Language::ALL {
            let covered = prepared
                .entries
                .iter()
                .filter(|entry| entry.translations.contains_key(&language))
                .count();
            println!("   {}: {}", language.display_name(), covered);
        }
        return Ok(());
    }

    let embedder = OpenAiEmbedder::new(&config.openai).context("Failed to create embedding client")?;
    let store = connect_store(&config).await?;
    store
        .setup_schema()
        .await
        .context("Failed to initialize database schema")?;
    println!("{}", style("✓ Database schema initialized").green());

    let options = IngestOptions {
        batch_size: config.ingest.batch_size as usize,
        clear: args.clear,
        limit: args.limit,
    };
    let ingester = Ingester::new(Arc::new(embedder), Arc::new(store), options).with_progress();
    let report = ingester.run(&loader).await?;

    print_report(&report);
    Ok(())
}

/// Start the HTTP API
#[inline]
pub async fn serve_api(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let addr = config.server.bind_address()?;

    let store = connect_store(&config).await?;
    let translator = Translator::from_config(&config, Arc::new(store))
        .context("Failed to create translator")?;

    server::serve(Arc::new(translator), addr).await
}

/// Translate one text and print the result with its reference cards
#[inline]
pub async fn translate_text(config: &Config, text: String, language: Language) -> Result<()> {
    let store = connect_store(config).await?;
    let translator = Translator::from_config(config, Arc::new(store))
        .context("Failed to create translator")?;

    let response = translator
        .translate(&TranslationRequest::new(text, language))
        .await?;

    println!("{}", response.translation);
    println!();
    println!(
        "{}",
        style(format!("Reference cards ({}):", response.context.len())).dim()
    );
    for (index, card) in response.context.iter().enumerate() {
        let side = if card.is_back { " (back)" } else { "" };
        println!(
            "  {}. {} [{}]{}",
            index + 1,
            style(&card.card_name).cyan(),
            card.card_code,
            side
        );
        println!("     {}", style(&card.translated_text).dim());
    }

    Ok(())
}

/// Show row counts and per-language coverage of the vector store
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 Arkham Localize Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 OpenAI:");
    println!("   Base URL: {}", config.openai.base_url);
    println!(
        "   API Key: {}",
        if config.openai.require_api_key().is_ok() {
            "✅ set"
        } else {
            "❌ missing"
        }
    );
    println!(
        "   Models: {} ({} dims), {}",
        config.openai.embedding_model, config.openai.embedding_dimension, config.openai.chat_model
    );
    println!();

    println!("🗄️  Database: {}", config.database.redacted_url());
    let store = match connect_store(config).await {
        Ok(store) => store,
        Err(e) => {
            println!("   ❌ Failed to connect - {:#}", e);
            return Ok(());
        }
    };

    match store.coverage().await {
        Ok(coverage) => {
            println!("   ✅ Connected");
            println!("   Total rows: {}", coverage.total);
            if let Some(last) = coverage.last_inserted_at {
                println!("   Last ingested: {}", last.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            for language in Language::ALL {
                let translated = coverage.translated(language);
                println!(
                    "   {:<8} {:>6} {}",
                    language.display_name(),
                    translated,
                    percentage(translated, coverage.total)
                );
            }
        }
        Err(e) => {
            println!("   ⚠️  Connected but the card table is unavailable - {}", e);
            println!("   Run `arkham-localize ingest` to create it.");
        }
    }

    Ok(())
}

async fn connect_store(config: &Config) -> Result<PgCardStore> {
    let dimension = config.openai.embedding_dimension as usize;
    let store = PgCardStore::connect(&config.database, dimension).await?;
    store
        .ping()
        .await
        .with_context(|| format!("Database at {} is unreachable", config.database.redacted_url()))?;
    info!("Database reachable");
    Ok(store)
}

fn print_report(report: &IngestReport) {
    println!();
    println!("{}", style("✓ Ingestion complete").bold().green());
    println!("   Cards read: {}", report.cards_read);
    println!("   Entries extracted: {}", report.entries_extracted);
    println!("   Skipped: {}", report.skipped);
    println!("   Embedding failures: {}", report.embedding_failures);
    println!("   Batches: {}", report.batches);
    println!("   Rows inserted: {}", report.rows_inserted);
    println!("   Total rows in database: {}", report.total_rows);
}

fn percentage(part: i64, total: i64) -> String {
    if total <= 0 {
        return String::new();
    }
    let ratio = part as f64 / total as f64;
    format!("({:.1}%)", ratio * 100.0)
}
