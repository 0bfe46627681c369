use clap::{Parser, Subcommand};
use pdf_qa::Result;
use pdf_qa::commands::{ask_once, run_chat};
use pdf_qa::config::{resolve_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-qa")]
#[command(about = "Ask questions about a PDF and get back the passages that answer them")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and downloaded models [default: ~/.pdf-qa]
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding backend and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Process a PDF and answer a single question
    Ask {
        /// PDF file to search
        pdf: PathBuf,
        /// Question to answer
        question: String,
        /// Number of passages to return (overrides the configured value)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Process a PDF and ask questions interactively
    Chat {
        /// PDF file to start with
        pdf: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Ask {
            pdf,
            question,
            top_k,
        } => {
            ask_once(&config_dir, &pdf, &question, top_k)?;
        }
        Commands::Chat { pdf } => {
            run_chat(&config_dir, &pdf)?;
        }
    }

    Ok(())
}
