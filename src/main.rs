use std::path::PathBuf;

use arkham_localize::Result;
use arkham_localize::commands::{IngestArgs, run_ingest, serve_api, show_status, translate_text};
use arkham_localize::config::{Config, run_interactive_config, show_config};
use arkham_localize::languages::Language;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arkham-localize")]
#[command(about = "Translate Arkham Horror LCG card text using official translations as reference")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure OpenAI, database and server settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Embed the card corpus and load it into the vector store
    Ingest {
        /// Root of the card data checkout (contains `pack/` and `translations/`)
        #[arg(long, default_value = "arkhamdb-json-data")]
        data: PathBuf,
        /// Texts embedded concurrently per batch
        #[arg(long)]
        batch_size: Option<u32>,
        /// Truncate the card table before inserting
        #[arg(long)]
        clear: bool,
        /// Only ingest the first N reconciled entries
        #[arg(long)]
        limit: Option<usize>,
        /// Load and reconcile the corpus without embedding or storing anything
        #[arg(long)]
        dry_run: bool,
        /// OpenAI API key, overriding the configured one
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_key: Option<String>,
    },
    /// Start the HTTP translation API
    Serve {
        /// Address to listen on, e.g. "0.0.0.0:3001"
        #[arg(long)]
        bind: Option<String>,
    },
    /// Translate a single text from the command line
    Translate {
        /// English card text
        text: String,
        /// Target language code
        #[arg(long, short, default_value = "it")]
        language: Language,
    },
    /// Show database coverage per language
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest {
            data,
            batch_size,
            clear,
            limit,
            dry_run,
            openai_key,
        } => {
            let args = IngestArgs {
                data,
                batch_size,
                clear,
                limit,
                dry_run,
                openai_key,
            };
            run_ingest(Config::from_environment()?, args).await?;
        }
        Commands::Serve { bind } => {
            serve_api(Config::from_environment()?, bind).await?;
        }
        Commands::Translate { text, language } => {
            translate_text(&Config::from_environment()?, text, language).await?;
        }
        Commands::Status => {
            show_status(&Config::from_environment()?).await?;
        }
    }

    Ok(())
}
