use async_trait::async_trait;

use crate::error::RetrievalError;

/// The out-of-scope LLM HTTP client's interface only (spec.md §1/§9).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, RetrievalError>;
}

/// Echoes back a deterministic canned answer referencing the prompt, so
/// the orchestration around it (prompt assembly, persistence) is
/// testable without a real model.
pub struct FakeTextGenerator;

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String, RetrievalError> {
        Ok(format!("Answer based on the provided context.\n\n{user_prompt}"))
    }
}
