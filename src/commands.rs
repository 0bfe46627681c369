use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::document::source_name;
use crate::embeddings::EmbeddingService;
use crate::index::SearchResult;
use crate::session::{
    AskOutcome, NO_MATCHES_MESSAGE, Pipeline, ProcessSummary, Session, SessionState,
    truncate_chars,
};

/// A line typed into the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Load(PathBuf),
    History,
    Clear,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl ChatCommand {
    #[inline]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return Self::Ask(line.to_string());
        };

        let (name, argument) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, rest)| (name, rest.trim()));

        match name {
            "load" | "l" if !argument.is_empty() => Self::Load(PathBuf::from(argument)),
            "history" | "h" => Self::History,
            "clear" | "c" => Self::Clear,
            "status" | "s" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Build the shared pipeline from the stored configuration
#[inline]
pub fn build_pipeline(config: &Config) -> Result<Pipeline> {
    config.validate().context("Invalid configuration")?;
    let embeddings = Arc::new(EmbeddingService::from_config(config));
    Pipeline::from_config(config, embeddings).context("Failed to set up pipeline")
}

/// Process a PDF from disk into `session`, showing a spinner while it runs
#[inline]
pub fn process_file(
    pipeline: &Pipeline,
    session: &mut Session,
    path: &Path,
) -> Result<ProcessSummary> {
    let source = source_name(path);

    let bar = if console::user_attended_stderr() {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .expect("style template is valid"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(format!("Processing {source}"));

    let result = pipeline.process_file(session, path);
    bar.finish_and_clear();

    Ok(result?)
}

/// Answer a single question about a PDF and print the matching passages
#[inline]
pub fn ask_once(
    config_dir: &Path,
    pdf: &Path,
    question: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let mut config = Config::load(config_dir)?;
    if let Some(top_k) = top_k {
        config.retrieval.set_top_k(top_k)?;
    }

    let pipeline = build_pipeline(&config)?;
    let mut session = Session::new();

    let summary = process_file(&pipeline, &mut session, pdf)?;
    eprintln!("{}", style(&summary.message).green());

    match pipeline.ask(&mut session, question)? {
        AskOutcome::Answered(results) => {
            print_results(&results, pipeline.retrieval().display_chars);
        }
        AskOutcome::NoMatches => {
            eprintln!("{}", style(NO_MATCHES_MESSAGE).yellow());
        }
    }

    Ok(())
}

/// Interactive question loop over one PDF at a time
#[inline]
pub fn run_chat(config_dir: &Path, pdf: &Path) -> Result<()> {
    let config = Config::load(config_dir)?;
    let pipeline = build_pipeline(&config)?;
    let mut session = Session::new();

    eprintln!("{}", style("📄 PDF Q&A").bold().cyan());
    load_into_session(&pipeline, &mut session, pdf);
    eprintln!("Type a question, or {} for commands.", style(":help").cyan());

    loop {
        eprintln!();
        let line: String = match Input::new()
            .with_prompt("Question")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                // EOF or a closed terminal ends the chat
                info!("Leaving chat: {}", e);
                break;
            }
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Ask(question) if question.is_empty() => {}
            ChatCommand::Ask(question) => match pipeline.ask(&mut session, &question) {
                Ok(AskOutcome::Answered(results)) => {
                    print_results(&results, pipeline.retrieval().display_chars);
                }
                Ok(AskOutcome::NoMatches) => {
                    eprintln!("{}", style(NO_MATCHES_MESSAGE).yellow());
                }
                Err(e) => {
                    eprintln!("{} {}", style("✗").red(), e);
                }
            },
            ChatCommand::Load(path) => load_into_session(&pipeline, &mut session, &path),
            ChatCommand::History => print_history(&session),
            ChatCommand::Clear => {
                session.clear_transcript();
                eprintln!("{}", style("History cleared.").green());
            }
            ChatCommand::Status => print_status(&session),
            ChatCommand::Help => print_help(),
            ChatCommand::Quit => break,
            ChatCommand::Unknown(input) => {
                eprintln!(
                    "{} Unknown command {}. Type {} for commands.",
                    style("?").yellow(),
                    style(input).cyan(),
                    style(":help").cyan()
                );
            }
        }
    }

    Ok(())
}

fn load_into_session(pipeline: &Pipeline, session: &mut Session, path: &Path) {
    match process_file(pipeline, session, path) {
        Ok(summary) => eprintln!("{} {}", style("✓").green(), summary.message),
        Err(e) => {
            warn!("Could not process {}: {:#}", path.display(), e);
            eprintln!("{} {:#}", style("✗").red(), e);
            if session.has_index() {
                eprintln!("Still answering from the previously loaded document.");
            }
        }
    }
}

/// Print ranked passages, cut to `display_chars` for readability
#[inline]
pub fn print_results(results: &[SearchResult], display_chars: usize) {
    for (i, result) in results.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format!("Result {}:", i + 1)).bold().yellow(),
            style(format!("page {}", result.passage.page_number)).dim(),
            style(format!("(score {:.3})", result.similarity_score)).dim()
        );
        let text = truncate_chars(&result.passage.text, display_chars);
        if text.len() < result.passage.text.len() {
            println!("{text}...");
        } else {
            println!("{text}");
        }
        println!();
    }
}

fn print_history(session: &Session) {
    if session.transcript().is_empty() {
        eprintln!("{}", style("No questions asked yet.").dim());
        return;
    }

    for turn in session.transcript() {
        eprintln!(
            "{} {}",
            style(turn.timestamp.format("%H:%M:%S")).dim(),
            style(turn.role).bold().cyan()
        );
        eprintln!("{}", turn.content);
        eprintln!();
    }
}

fn print_status(session: &Session) {
    eprintln!("Session: {}", style(session.id()).dim());
    eprintln!("State: {}", style(session.state().name()).cyan());

    match session.state() {
        SessionState::Processing { source, .. } => {
            eprintln!("Processing: {}", style(source).cyan());
        }
        SessionState::Failed { error, .. } => {
            eprintln!("Last error: {}", style(error).red());
        }
        SessionState::Empty | SessionState::Ready(_) => {}
    }

    if let Some(ready) = session.state().index() {
        eprintln!(
            "Document: {} ({} pages, {} passages)",
            style(&ready.source).cyan(),
            ready.page_count,
            ready.passage_count
        );
    }
    eprintln!("Turns: {}", session.transcript().len());
}

fn print_help() {
    eprintln!("{}", style("Commands:").bold().yellow());
    eprintln!("  {}  process another PDF", style(":load <PDF>").cyan());
    eprintln!("  {}      show the conversation", style(":history").cyan());
    eprintln!("  {}        forget the conversation", style(":clear").cyan());
    eprintln!("  {}       show the loaded document", style(":status").cyan());
    eprintln!("  {}         leave", style(":quit").cyan());
    eprintln!("Anything else is asked as a question.");
}
