use thiserror::Error;

pub type Result<T> = std::result::Result<T, PdfQaError>;

#[derive(Error, Debug)]
pub enum PdfQaError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] document::LoaderError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] embeddings::EmbeddingError),

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod index;
pub mod session;
