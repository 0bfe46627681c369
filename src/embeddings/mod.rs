// Embeddings module
// Passage chunking, embedding backends and the shared embedding service

pub mod chunking;
#[cfg(feature = "fastembed")]
pub mod fastembed;
pub mod ollama;
pub mod service;

use thiserror::Error;

pub use chunking::{ChunkError, ChunkingConfig, Passage, chunk_page, chunk_pages};
pub use ollama::OllamaClient;
pub use service::{EmbedderFactory, EmbeddingService};

/// Fixed-length vector produced by an embedding model
pub type EmbeddingVector = Vec<f32>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding failed: {0}")]
    Failed(String),
}

/// A loaded embedding model.
///
/// Implementations must be deterministic: embedding the same text twice within
/// one process yields the same vector. Text is passed through unmodified; any
/// truncation to the model's input limit is the model's business.
pub trait Embedder: Send + Sync {
    /// Name of the underlying model, for logging
    fn model_name(&self) -> &str;

    fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError>;

    /// Embed several texts, returning one vector per input in the same order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
