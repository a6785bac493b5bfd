pub mod ask;
pub mod embedder;
pub mod error;
pub mod generator;
pub mod repository;
pub mod title;
pub mod vector_store;

pub use ask::{AskQuestion, AskQuestionConfig, Answer};
pub use embedder::{Embedder, FakeEmbedder, TaskHint};
pub use error::RetrievalError;
pub use generator::{FakeTextGenerator, TextGenerator};
pub use repository::{
    BookLookup, ChunkLookup, ConversationRepository, InMemoryBookLookup, InMemoryChunkLookup, InMemoryConversationRepository,
    InMemoryMessageRepository, MessageRepository,
};
pub use title::derive_title;
pub use vector_store::{InMemoryVectorStore, VectorStore};
