// In-process embedding backend built on fastembed's ONNX models

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::info;

use super::{Embedder, EmbeddingError, EmbeddingVector};

/// A fastembed text model. The model needs `&mut self` to embed, so it sits
/// behind a mutex.
pub struct FastEmbedModel {
    model: Mutex<TextEmbedding>,
    name: String,
}

impl FastEmbedModel {
    /// Load (downloading on first use) the named model into `cache_dir`
    #[inline]
    pub fn new(name: &str, cache_dir: &Path) -> Result<Self, EmbeddingError> {
        let model = parse_model_name(name)?;

        info!(
            "Loading fastembed model {} (cache: {})",
            name,
            cache_dir.display()
        );

        let text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir.to_path_buf())
                .with_show_download_progress(false),
        )
        .map_err(|e| EmbeddingError::Unavailable(format!("Failed to load {name}: {e}")))?;

        Ok(Self {
            model: Mutex::new(text_model),
            name: name.to_string(),
        })
    }
}

impl Embedder for FastEmbedModel {
    #[inline]
    fn model_name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EmbeddingError::Failed("model returned no embedding".to_string()))
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Failed(e.to_string()))
    }
}

/// Map a configured model name onto the fastembed model it refers to
#[inline]
pub fn parse_model_name(name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    match name {
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        other => Err(EmbeddingError::Unavailable(format!(
            "Unknown fastembed model '{other}'"
        ))),
    }
}
