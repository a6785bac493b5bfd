use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use models::{Book, Chunk, Conversation, Id, Message};

use crate::error::RetrievalError;

/// Looks up a book's ownership/readiness/title — the slice of the Book
/// service this component depends on without owning it.
#[async_trait]
pub trait BookLookup: Send + Sync {
    async fn get(&self, book_id: Id) -> Result<Option<Book>, RetrievalError>;
}

/// Resolves a chunk's text and provenance metadata by id, so retrieval
/// can turn a vector-search hit back into a citable `Source` (spec.md
/// §4.F). Never builds or owns the chunk store itself (spec.md
/// Non-goals) — just the lookup slice `AskQuestion` depends on.
#[async_trait]
pub trait ChunkLookup: Send + Sync {
    async fn get(&self, chunk_id: Id) -> Result<Option<Chunk>, RetrievalError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn get(&self, id: Id) -> Result<Option<Conversation>, RetrievalError>;
    async fn create(&self, user_id: Id, book_id: Id, title: String) -> Result<Conversation, RetrievalError>;
    async fn touch_last_message_at(&self, id: Id) -> Result<(), RetrievalError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Oldest-first, capped at `limit`, per spec.md §4.F.
    async fn recent(&self, conversation_id: Id, limit: usize) -> Result<Vec<Message>, RetrievalError>;
    async fn append(&self, message: Message) -> Result<(), RetrievalError>;
}

#[derive(Default)]
pub struct InMemoryBookLookup {
    books: Mutex<HashMap<Id, Book>>,
}

impl InMemoryBookLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, book: Book) {
        self.books.lock().expect("book lookup mutex poisoned").insert(book.id, book);
    }
}

#[async_trait]
impl BookLookup for InMemoryBookLookup {
    async fn get(&self, book_id: Id) -> Result<Option<Book>, RetrievalError> {
        Ok(self.books.lock().expect("book lookup mutex poisoned").get(&book_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Mutex<HashMap<Id, Conversation>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn get(&self, id: Id) -> Result<Option<Conversation>, RetrievalError> {
        Ok(self.conversations.lock().expect("conversation mutex poisoned").get(&id).cloned())
    }

    async fn create(&self, user_id: Id, book_id: Id, title: String) -> Result<Conversation, RetrievalError> {
        let now = Utc::now();
        let conversation = Conversation { id: Id::new(), user_id, book_id, title, last_message_at: now, created_at: now, updated_at: now };
        self.conversations
            .lock()
            .expect("conversation mutex poisoned")
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn touch_last_message_at(&self, id: Id) -> Result<(), RetrievalError> {
        if let Some(conversation) = self.conversations.lock().expect("conversation mutex poisoned").get_mut(&id) {
            conversation.last_message_at = Utc::now();
            conversation.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryChunkLookup {
    chunks: Mutex<HashMap<Id, Chunk>>,
}

impl InMemoryChunkLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, chunk: Chunk) {
        self.chunks.lock().expect("chunk lookup mutex poisoned").insert(chunk.id, chunk);
    }
}

#[async_trait]
impl ChunkLookup for InMemoryChunkLookup {
    async fn get(&self, chunk_id: Id) -> Result<Option<Chunk>, RetrievalError> {
        Ok(self.chunks.lock().expect("chunk lookup mutex poisoned").get(&chunk_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn recent(&self, conversation_id: Id, limit: usize) -> Result<Vec<Message>, RetrievalError> {
        let messages = self.messages.lock().expect("message mutex poisoned");
        let mut matching: Vec<Message> = messages.iter().filter(|m| m.conversation_id == conversation_id).cloned().collect();
        matching.sort_by_key(|m| m.created_at);
        if matching.len() > limit {
            let skip = matching.len() - limit;
            matching.drain(0..skip);
        }
        Ok(matching)
    }

    async fn append(&self, message: Message) -> Result<(), RetrievalError> {
        self.messages.lock().expect("message mutex poisoned").push(message);
        Ok(())
    }
}
