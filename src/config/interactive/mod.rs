
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};

use super::{Config, ConfigError, DatabaseConfig, OpenAiConfig, get_config_dir};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Arkham Localize Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("OpenAI Configuration").bold().yellow());
    eprintln!("The API key is read from OPENAI_API_KEY and is not stored here.");
    eprintln!();
    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Database Configuration").bold().yellow());
    eprintln!("PostgreSQL with the pgvector extension.");
    eprintln!();
    configure_database(&mut config.database)?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for ingestion")
        .default(config.ingest.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    config.ingest.set_batch_size(batch_size)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_openai_connection(&config.openai) {
        eprintln!("{}", style("✓ OpenAI endpoint reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the OpenAI endpoint").yellow()
        );
        eprintln!("You can continue, but translation and ingestion will fail until it is reachable.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::from_environment().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("OpenAI Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.openai.base_url).cyan());
    eprintln!(
        "  API Key: {}",
        if config.openai.require_api_key().is_ok() {
            style("set").green()
        } else {
            style("missing").red()
        }
    );
    eprintln!(
        "  Embedding Model: {} ({} dims)",
        style(&config.openai.embedding_model).cyan(),
        config.openai.embedding_dimension
    );
    eprintln!("  Chat Model: {}", style(&config.openai.chat_model).cyan());
    eprintln!("  Temperature: {}", style(config.openai.temperature).cyan());

    eprintln!();
    eprintln!("{}", style("Database Settings:").bold().yellow());
    eprintln!("  URL: {}", style(config.database.redacted_url()).cyan());

    eprintln!();
    eprintln!("{}", style("Ingestion & Server:").bold().yellow());
    eprintln!("  Batch Size: {}", style(config.ingest.batch_size).cyan());
    eprintln!("  Bind Address: {}", style(&config.server.bind).cyan());
    eprintln!(
        "  Context Cards: {}",
        style(config.server.context_size).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    Config::load(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("OpenAI-compatible base URL")
        .default(openai.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OpenAiConfig {
                base_url: input.clone(),
                ..OpenAiConfig::default()
            };
            temp_config.endpoint_url().map(|_| ())
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let embedding_dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(openai.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    openai.set_base_url(base_url)?;
    openai.set_embedding_model(embedding_model)?;
    openai.set_embedding_dimension(embedding_dimension)?;
    openai.set_chat_model(chat_model)?;

    Ok(())
}

fn configure_database(database: &mut DatabaseConfig) -> Result<()> {
    let host: String = Input::new()
        .with_prompt("Database host")
        .default(database.host.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Database port")
        .default(database.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let user: String = Input::new()
        .with_prompt("Database user")
        .default(database.user.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let password = Password::new()
        .with_prompt("Database password (leave empty to keep current)")
        .allow_empty_password(true)
        .interact()?;

    let name: String = Input::new()
        .with_prompt("Database name")
        .default(database.name.clone())
        .validate_with(non_empty)
        .interact_text()?;

    database.set_host(host)?;
    database.set_port(port)?;
    database.user = user;
    database.name = name;
    if !password.is_empty() {
        database.password = password;
    }

    Ok(())
}

#[expect(
    clippy::ptr_arg,
    reason = "dialoguer validators receive the input type by reference"
)]
fn non_empty(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Value cannot be empty")
    } else {
        Ok(())
    }
}

fn test_openai_connection(openai: &OpenAiConfig) -> bool {
    let Ok(url) = openai.endpoint_url().and_then(|base| {
        base.join("models")
            .map_err(|_| ConfigError::InvalidUrl(openai.base_url.clone()))
    }) else {
        return false;
    };

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    let mut request = agent.get(url.as_str());
    if let Ok(key) = openai.require_api_key() {
        request = request.header("Authorization", &format!("Bearer {key}"));
    }

    match request.call() {
        Ok(_) => true,
        // Reachable but unauthenticated still counts as reachable.
        Err(ureq::Error::StatusCode(code)) => (400..500).contains(&code),
        Err(_) => false,
    }
}
