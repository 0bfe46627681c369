
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;

use super::{Config, ConfigError, EmbeddingProvider, OllamaConfig};
use crate::embeddings::OllamaClient;
use crate::embeddings::chunking::ChunkingConfig;

const CONNECTION_TEST_TIMEOUT_SECS: u64 = 5;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 PDF Q&A Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Embedding Model").bold().yellow());
    eprintln!("Choose how passages and questions are turned into vectors.");
    eprintln!();

    configure_provider(&mut config)?;

    if config.embedding.provider == EmbeddingProvider::Ollama {
        eprintln!();
        configure_ollama(&mut config.ollama)?;

        eprintln!();
        eprintln!("{}", style("Testing configuration...").yellow());

        if test_ollama_connection(&config.ollama) {
            eprintln!("{}", style("✓ Ollama connection successful!").green());
        } else {
            eprintln!(
                "{}",
                style("⚠ Warning: Could not connect to Ollama").yellow()
            );
            eprintln!("You can continue, but make sure Ollama is running before processing a PDF.");
        }
    }

    eprintln!();
    eprintln!("{}", style("Passages").bold().yellow());
    configure_chunking(&mut config.chunking)?;

    let top_k: usize = Input::new()
        .with_prompt("Passages returned per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=50).contains(input) {
                Ok(())
            } else {
                Err("Must be between 1 and 50")
            }
        })
        .interact_text()?;
    config.retrieval.set_top_k(top_k)?;

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
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!(
        "{} {}",
        style("Embedding Provider:").bold().yellow(),
        style(config.embedding.provider).cyan()
    );
    eprintln!();

    match config.embedding.provider {
        EmbeddingProvider::Ollama => {
            eprintln!("{}", style("Ollama Settings:").bold().yellow());
            eprintln!("  Model: {}", style(&config.ollama.model).cyan());
            eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());
            eprintln!("  Timeout: {}s", style(config.ollama.timeout_secs).cyan());
            eprintln!("  Auto Pull: {}", style(config.ollama.auto_pull).cyan());
            match config.ollama_url() {
                Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
                Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
            }
        }
        EmbeddingProvider::FastEmbed => {
            eprintln!("{}", style("Local Model Settings:").bold().yellow());
            eprintln!("  Model: {}", style(&config.fastembed.model).cyan());
            eprintln!(
                "  Cache: {}",
                style(config.model_cache_dir().display()).cyan()
            );
        }
    }

    eprintln!();
    eprintln!("{}", style("Passages:").bold().yellow());
    eprintln!("  Chunk Size: {}", style(config.chunking.chunk_size).cyan());
    eprintln!(
        "  Chunk Overlap: {}",
        style(config.chunking.chunk_overlap).cyan()
    );
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  Display Length: {}",
        style(config.retrieval.display_chars).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Config {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            }
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_provider(config: &mut Config) -> Result<()> {
    let providers = [EmbeddingProvider::Ollama, EmbeddingProvider::FastEmbed];
    let labels = ["ollama (local Ollama server)", "fastembed (built-in ONNX model)"];
    let default_index = providers
        .iter()
        .position(|&p| p == config.embedding.provider)
        .unwrap_or(0);

    let index = Select::new()
        .with_prompt("Embedding provider")
        .default(default_index)
        .items(&labels)
        .interact()?;

    let provider = providers[index];
    if provider == EmbeddingProvider::FastEmbed && !cfg!(feature = "fastembed") {
        return Err(ConfigError::ProviderUnavailable(provider).into());
    }
    config.embedding.provider = provider;
    Ok(())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(ollama.batch_size)
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

    let auto_pull = Confirm::new()
        .with_prompt("Pull the model automatically if the server does not have it?")
        .default(ollama.auto_pull)
        .interact()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;
    ollama.set_batch_size(batch_size)?;
    ollama.auto_pull = auto_pull;

    Ok(())
}

fn configure_chunking(chunking: &mut ChunkingConfig) -> Result<()> {
    let chunk_size: usize = Input::new()
        .with_prompt("Passage size (characters)")
        .default(chunking.chunk_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Passage size must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let chunk_overlap: usize = Input::new()
        .with_prompt("Overlap between passages (characters)")
        .default(chunking.chunk_overlap.min(chunk_size.saturating_sub(1)))
        .validate_with(|input: &usize| -> Result<(), String> {
            if *input >= chunk_size {
                Err(format!("Overlap must be smaller than {chunk_size}"))
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let updated = ChunkingConfig {
        chunk_size,
        chunk_overlap,
    };
    updated.validate()?;
    *chunking = updated;
    Ok(())
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    let quick = OllamaConfig {
        timeout_secs: ollama.timeout_secs.min(CONNECTION_TEST_TIMEOUT_SECS),
        ..ollama.clone()
    };

    match OllamaClient::new(&quick).and_then(|client| client.health_check()) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("  {}", style(format!("{e:#}")).dim());
            false
        }
    }
}
