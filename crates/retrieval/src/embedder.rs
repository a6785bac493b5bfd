use async_trait::async_trait;

use crate::error::RetrievalError;

/// Why a piece of text is being embedded — some embedding APIs tune the
/// vector differently for a stored document versus a live query
/// (spec.md §4.F: "embed question with task hint RETRIEVAL_QUERY").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TaskHint {
    RetrievalDocument,
    RetrievalQuery,
}

/// The out-of-scope embedding HTTP client's interface only (spec.md
/// §1/§9) — this crate calls it, never implements the model serving
/// itself.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;
    async fn embed(&self, text: &str, hint: TaskHint) -> Result<Vec<f32>, RetrievalError>;
}

/// Deterministic, dependency-free stand-in for tests: hashes the input
/// into a fixed-dimension vector so the same text always embeds
/// identically and different text embeds differently, without calling
/// out to a real model.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str, _hint: TaskHint) -> Result<Vec<f32>, RetrievalError> {
        let mut seed: u64 = 1469598103934665603;
        for byte in text.bytes() {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(1099511628211);
        }

        let mut vector = Vec::with_capacity(self.dim);
        let mut state = seed;
        for _ in 0..self.dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let v = ((state >> 33) as u32 as f32 / u32::MAX as f32) * 2.0 - 1.0;
            vector.push(v);
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let embedder = FakeEmbedder::new(16);
        let a = embedder.embed("hello", TaskHint::RetrievalQuery).await.unwrap();
        let b = embedder.embed("hello", TaskHint::RetrievalQuery).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_text_embeds_differently() {
        let embedder = FakeEmbedder::new(16);
        let a = embedder.embed("hello", TaskHint::RetrievalQuery).await.unwrap();
        let b = embedder.embed("goodbye", TaskHint::RetrievalQuery).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn embeds_at_the_configured_dimension() {
        let embedder = FakeEmbedder::new(3072);
        let v = embedder.embed("x", TaskHint::RetrievalDocument).await.unwrap();
        assert_eq!(v.len(), 3072);
    }
}
