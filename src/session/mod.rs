// Document session pipeline
// A Pipeline holds the shared settings and embedding service; each conversation
// owns a Session with at most one processed document and its transcript


use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{Config, ConfigError, RetrievalConfig};
use crate::document::{LoaderError, load_pdf, read_pdf_bytes, source_name};
use crate::embeddings::{ChunkError, ChunkingConfig, EmbeddingError, EmbeddingService, chunk_pages};
use crate::index::{IndexError, SearchResult, VectorIndex};

/// Shown when a question matches nothing in the document
pub const NO_MATCHES_MESSAGE: &str = "No relevant information found!";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No document has been processed yet")]
    NoIndex,

    #[error("Question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Load(#[from] LoaderError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// A searchable document
#[derive(Debug, Clone)]
pub struct ReadyIndex {
    pub index: Arc<VectorIndex>,
    pub source: String,
    pub page_count: usize,
    pub passage_count: usize,
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No document yet
    #[default]
    Empty,
    /// A document is being processed; `previous` is whatever was ready before
    Processing {
        source: String,
        previous: Option<ReadyIndex>,
    },
    Ready(ReadyIndex),
    /// The last processing attempt failed. An index built before the failure
    /// stays queryable.
    Failed {
        error: String,
        previous: Option<ReadyIndex>,
    },
}

impl SessionState {
    /// The index questions are answered from, if any
    #[inline]
    pub fn index(&self) -> Option<&ReadyIndex> {
        match self {
            Self::Empty => None,
            Self::Ready(ready) => Some(ready),
            Self::Processing { previous, .. } | Self::Failed { previous, .. } => previous.as_ref(),
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Processing { .. } => "processing",
            Self::Ready(_) => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl QueryTurn {
    #[inline]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One user's conversation: the processed document and the transcript
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    state: SessionState,
    transcript: Vec<QueryTurn>,
}

impl Default for Session {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[inline]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Empty,
            transcript: Vec::new(),
        }
    }

    #[inline]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[inline]
    pub fn transcript(&self) -> &[QueryTurn] {
        &self.transcript
    }

    #[inline]
    pub fn has_index(&self) -> bool {
        self.state.index().is_some()
    }

    /// Forget the conversation. The processed document stays.
    #[inline]
    pub fn clear_transcript(&mut self) {
        debug!(
            "Clearing {} turns from session {}",
            self.transcript.len(),
            self.id
        );
        self.transcript.clear();
    }
}

/// Result of a successful `process`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    pub source: String,
    pub page_count: usize,
    pub passage_count: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// Best matches first, with full passage text
    Answered(Vec<SearchResult>),
    NoMatches,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    chunking: ChunkingConfig,
    retrieval: RetrievalConfig,
    embeddings: Arc<EmbeddingService>,
}

impl Pipeline {
    #[inline]
    pub fn new(
        chunking: ChunkingConfig,
        retrieval: RetrievalConfig,
        embeddings: Arc<EmbeddingService>,
    ) -> Result<Self, ChunkError> {
        chunking.validate()?;
        Ok(Self {
            chunking,
            retrieval,
            embeddings,
        })
    }

    #[inline]
    pub fn from_config(
        config: &Config,
        embeddings: Arc<EmbeddingService>,
    ) -> Result<Self, ConfigError> {
        config.retrieval.validate()?;
        Ok(Self::new(
            config.chunking.clone(),
            config.retrieval.clone(),
            embeddings,
        )?)
    }

    #[inline]
    pub const fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    #[inline]
    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    /// Load, chunk, embed and index a PDF, replacing the session's document on
    /// success. On failure the session moves to `Failed` and keeps the index it
    /// had before.
    #[inline]
    pub fn process(
        &self,
        session: &mut Session,
        bytes: &[u8],
        source: &str,
    ) -> Result<ProcessSummary, SessionError> {
        Self::run(session, source, || self.build_index(bytes, source))
    }

    /// Like [`Pipeline::process`], reading the PDF from disk first. A file that
    /// cannot be read fails the upload the same way an unparsable one does.
    #[inline]
    pub fn process_file(
        &self,
        session: &mut Session,
        path: &Path,
    ) -> Result<ProcessSummary, SessionError> {
        let source = source_name(path);
        Self::run(session, &source, || {
            let bytes = read_pdf_bytes(path, &source)?;
            self.build_index(&bytes, &source)
        })
    }

    fn run(
        session: &mut Session,
        source: &str,
        build: impl FnOnce() -> Result<ReadyIndex, SessionError>,
    ) -> Result<ProcessSummary, SessionError> {
        let previous = session.state.index().cloned();
        session.state = SessionState::Processing {
            source: source.to_string(),
            previous: previous.clone(),
        };

        match build() {
            Ok(ready) => {
                let summary = ProcessSummary {
                    source: ready.source.clone(),
                    page_count: ready.page_count,
                    passage_count: ready.passage_count,
                    message: format!(
                        "Successfully processed {} pages ({} passages)",
                        ready.page_count, ready.passage_count
                    ),
                };
                info!("Session {}: {}", session.id, summary.message);
                session.state = SessionState::Ready(ready);
                Ok(summary)
            }
            Err(err) => {
                error!("Session {}: processing '{}' failed: {}", session.id, source, err);
                session.state = SessionState::Failed {
                    error: err.to_string(),
                    previous,
                };
                Err(err)
            }
        }
    }

    fn build_index(&self, bytes: &[u8], source: &str) -> Result<ReadyIndex, SessionError> {
        let document = load_pdf(bytes, source)?;
        let page_count = document.page_count();

        let passages = chunk_pages(&document.pages, &self.chunking)?;
        debug!("'{}' split into {} passages", source, passages.len());

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts)?;

        let passage_count = passages.len();
        let index = VectorIndex::build(passages, vectors)?;

        Ok(ReadyIndex {
            index: Arc::new(index),
            source: document.source,
            page_count,
            passage_count,
        })
    }

    /// Answer a question from the session's document.
    ///
    /// Matches are recorded in the transcript as a user turn and an assistant
    /// turn. Failures and empty results leave the transcript alone.
    #[inline]
    pub fn ask(&self, session: &mut Session, question: &str) -> Result<AskOutcome, SessionError> {
        let index = match session.state.index() {
            Some(ready) => Arc::clone(&ready.index),
            None => return Err(SessionError::NoIndex),
        };

        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let query = self.embeddings.embed(question)?;
        let results = index.search(&query, self.retrieval.top_k)?;

        if results.is_empty() {
            warn!("{} ({})", NO_MATCHES_MESSAGE, question);
            return Ok(AskOutcome::NoMatches);
        }

        debug!(
            "Top match for '{}' scored {:.3}",
            question, results[0].similarity_score
        );

        session.transcript.push(QueryTurn::new(Role::User, question));
        session.transcript.push(QueryTurn::new(
            Role::Assistant,
            render_answer(&results, self.retrieval.display_chars),
        ));

        Ok(AskOutcome::Answered(results))
    }
}

/// Format matches for the transcript, cutting each passage to `display_chars`
#[inline]
pub fn render_answer(results: &[SearchResult], display_chars: usize) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "**Result {}:**\n{}...",
                i + 1,
                truncate_chars(&result.passage.text, display_chars)
            )
        })
        .join("\n\n")
}

/// The first `max_chars` characters of `text`
#[inline]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(byte_index, _)| text.get(..byte_index).unwrap_or(text))
}
