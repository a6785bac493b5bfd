use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::Id;

/// A bounded text slice with provenance metadata — the unit of embedding
/// and retrieval (GLOSSARY). `metadata` uses `BTreeMap` rather than
/// `HashMap` so two chunks built from the same input serialize identically,
/// which keeps the normalization idempotence property (spec.md §8) easy to
/// assert on in tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Id,
    pub book_id: Id,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    pub embedding: Option<Vec<f32>>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum ChunkError {
    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl Chunk {
    /// Attaches an embedding, enforcing the store-wide dimensional
    /// invariant (spec.md §3/§8). Violations are always an error, never a
    /// silent pad/truncate (spec.md §9 Open Question).
    pub fn with_embedding(mut self, embedding: Vec<f32>, dim: usize) -> Result<Self, ChunkError> {
        if embedding.len() != dim {
            return Err(ChunkError::DimensionMismatch {
                expected: dim,
                actual: embedding.len(),
            });
        }
        self.embedding = Some(embedding);
        Ok(self)
    }
}
