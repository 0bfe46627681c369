// In-memory vector index
// Brute-force cosine search over the passages of a single document


use thiserror::Error;
use tracing::debug;

use crate::embeddings::{EmbeddingVector, Passage};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Vector dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Got {vectors} vectors for {passages} passages")]
    CountMismatch { passages: usize, vectors: usize },
}

/// A stored passage matched by a query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub passage: Passage,
    /// Cosine similarity to the query, in [-1, 1]
    pub similarity_score: f32,
    /// `1 - similarity_score`; lower is closer
    pub distance: f32,
}

/// Immutable set of (vector, passage) pairs for one document
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<(EmbeddingVector, Passage)>,
    dimension: usize,
}

impl VectorIndex {
    /// Pair passages with their vectors by position
    #[inline]
    pub fn build(
        passages: Vec<Passage>,
        vectors: Vec<EmbeddingVector>,
    ) -> Result<Self, IndexError> {
        if passages.len() != vectors.len() {
            return Err(IndexError::CountMismatch {
                passages: passages.len(),
                vectors: vectors.len(),
            });
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                found: bad.len(),
            });
        }

        debug!(
            "Built vector index with {} entries of dimension {}",
            vectors.len(),
            dimension
        );

        Ok(Self {
            entries: vectors.into_iter().zip(passages).collect(),
            dimension,
        })
    }

    /// The `k` stored passages most similar to `query`, best first.
    ///
    /// Equal scores keep passage order. An empty index always returns no
    /// results.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, IndexError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                found: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (vector, _))| (i, cosine_similarity(query, vector)))
            .collect();

        // sort_by is stable, so ties stay in passage order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                passage: self.entries[i].1.clone(),
                similarity_score: score,
                distance: 1.0 - score,
            })
            .collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of every stored vector, 0 for an empty index
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.entries.iter().map(|(_, passage)| passage)
    }
}

/// Cosine similarity of two equal-length vectors. A zero vector, or one whose
/// norm overflows, scores 0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot = x.mul_add(*y, dot);
        norm_a = x.mul_add(*x, norm_a);
        norm_b = y.mul_add(*y, norm_b);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_nan() {
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0)
}
