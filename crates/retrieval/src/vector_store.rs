use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use models::Id;

use crate::error::RetrievalError;

/// The vector database this component consumes, never builds (spec.md
/// Non-goals). `search` returns `(chunk_id, distance)` ordered by
/// ascending cosine distance — closest first.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn dimension(&self) -> usize;

    async fn upsert(&self, book_id: Id, vectors: &[(Id, Vec<f32>)]) -> Result<(), RetrievalError>;

    async fn search(&self, book_id: Id, query: &[f32], top_k: usize) -> Result<Vec<(Id, f32)>, RetrievalError>;
}

/// Brute-force cosine search, scoped per book. Sufficient to exercise
/// the dimensional-check and `topK` ordering properties without an
/// external vector database.
pub struct InMemoryVectorStore {
    dim: usize,
    books: Mutex<HashMap<Id, Vec<(Id, Vec<f32>)>>>,
}

impl InMemoryVectorStore {
    pub fn new(dim: usize) -> Self {
        Self { dim, books: Mutex::new(HashMap::new()) }
    }

    fn check_dim(&self, vector: &[f32]) -> Result<(), RetrievalError> {
        if vector.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        Ok(())
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn upsert(&self, book_id: Id, vectors: &[(Id, Vec<f32>)]) -> Result<(), RetrievalError> {
        for (_, v) in vectors {
            self.check_dim(v)?;
        }
        let mut books = self.books.lock().expect("vector store mutex poisoned");
        books.entry(book_id).or_default().extend(vectors.iter().cloned());
        Ok(())
    }

    async fn search(&self, book_id: Id, query: &[f32], top_k: usize) -> Result<Vec<(Id, f32)>, RetrievalError> {
        self.check_dim(query)?;
        let books = self.books.lock().expect("vector store mutex poisoned");
        let Some(entries) = books.get(&book_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(Id, f32)> = entries.iter().map(|(id, v)| (*id, cosine_distance(query, v))).collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
