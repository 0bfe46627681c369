
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

use super::{Embedder, EmbeddingError, EmbeddingVector, OllamaClient};
use crate::config::{Config, EmbeddingProvider};

/// Builds the embedding model the first time it is needed
pub type EmbedderFactory = Box<dyn Fn() -> anyhow::Result<Arc<dyn Embedder>> + Send + Sync>;

/// Process-wide access point to the embedding model.
///
/// The model is loaded on first use and then shared by every caller. Concurrent
/// first callers wait for a single load. A failed load is not remembered: the
/// next call tries again.
pub struct EmbeddingService {
    factory: EmbedderFactory,
    embedder: OnceLock<Arc<dyn Embedder>>,
    init_lock: Mutex<()>,
    load_attempts: AtomicUsize,
}

impl EmbeddingService {
    #[inline]
    pub fn new(factory: EmbedderFactory) -> Self {
        Self {
            factory,
            embedder: OnceLock::new(),
            init_lock: Mutex::new(()),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Service that loads the backend selected in `config`
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        match config.embedding.provider {
            EmbeddingProvider::Ollama => {
                let ollama = config.ollama.clone();
                Self::new(Box::new(move || {
                    let client = OllamaClient::new(&ollama)?;
                    client.ensure_model(ollama.auto_pull)?;
                    Ok(Arc::new(client) as Arc<dyn Embedder>)
                }))
            }
            EmbeddingProvider::FastEmbed => Self::fastembed_service(config),
        }
    }

    #[cfg(feature = "fastembed")]
    fn fastembed_service(config: &Config) -> Self {
        let model = config.fastembed.model.clone();
        let cache_dir = config.model_cache_dir();
        Self::new(Box::new(move || {
            let embedder = super::fastembed::FastEmbedModel::new(&model, &cache_dir)?;
            Ok(Arc::new(embedder) as Arc<dyn Embedder>)
        }))
    }

    #[cfg(not(feature = "fastembed"))]
    fn fastembed_service(_config: &Config) -> Self {
        Self::new(Box::new(|| {
            Err(anyhow::anyhow!(
                "this build does not include the fastembed backend"
            ))
        }))
    }

    /// The loaded model, loading it if this is the first use
    #[inline]
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        if let Some(embedder) = self.embedder.get() {
            return Ok(Arc::clone(embedder));
        }

        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished loading while we waited
        if let Some(embedder) = self.embedder.get() {
            return Ok(Arc::clone(embedder));
        }

        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Loading embedding model (attempt {})", attempt);

        match (self.factory)() {
            Ok(embedder) => {
                info!("Embedding model {} ready", embedder.model_name());
                Ok(Arc::clone(self.embedder.get_or_init(|| embedder)))
            }
            Err(err) => {
                warn!("Embedding model failed to load: {:#}", err);
                Err(EmbeddingError::Unavailable(format!("{err:#}")))
            }
        }
    }

    #[inline]
    pub fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError> {
        self.embedder()?.embed(text)
    }

    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        self.embedder()?.embed_batch(texts)
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.embedder.get().is_some()
    }

    /// Number of times a load has been started, successful or not
    #[inline]
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EmbeddingService {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("loaded", &self.is_loaded())
            .field("load_attempts", &self.load_attempts())
            .finish_non_exhaustive()
    }
}
