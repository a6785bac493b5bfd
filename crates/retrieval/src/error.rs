#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("caller does not own this book")]
    NotOwner,

    #[error("book is not ready for retrieval")]
    BookNotReady,

    #[error("conversation {0} not found")]
    ConversationNotFound(models::Id),

    #[error("conversation does not belong to this book or user")]
    ConversationMismatch,

    #[error("embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Embedder(#[source] anyhow::Error),

    #[error(transparent)]
    Generator(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RetrievalError {
    pub fn code(&self) -> &'static str {
        match self {
            RetrievalError::EmptyQuestion => "CHAT_EMPTY_QUESTION",
            RetrievalError::NotOwner => "BOOK_FORBIDDEN",
            RetrievalError::BookNotReady => "BOOK_NOT_READY",
            RetrievalError::ConversationNotFound(_) => "CONVERSATION_NOT_FOUND",
            RetrievalError::ConversationMismatch => "CONVERSATION_MISMATCH",
            RetrievalError::DimensionMismatch { .. } => "RETRIEVAL_DIMENSION_MISMATCH",
            RetrievalError::Embedder(_) => "SYSTEM_EMBEDDER_FAILED",
            RetrievalError::Generator(_) => "SYSTEM_GENERATOR_FAILED",
            RetrievalError::Other(_) => "SYSTEM_INTERNAL",
        }
    }
}
