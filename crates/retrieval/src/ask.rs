use std::sync::Arc;

use chrono::{DateTime, Utc};
use models::{metadata, BookStatus, Id, Message, MessageRole, Source};

use crate::embedder::{Embedder, TaskHint};
use crate::error::RetrievalError;
use crate::generator::TextGenerator;
use crate::repository::{BookLookup, ChunkLookup, ConversationRepository, MessageRepository};
use crate::title::derive_title;
use crate::vector_store::VectorStore;

const SNIPPET_MAX_CODEPOINTS: usize = 240;

#[derive(Clone, Copy, Debug)]
pub struct AskQuestionConfig {
    pub top_k: usize,
    pub history_limit: usize,
}

impl Default for AskQuestionConfig {
    fn default() -> Self {
        Self { top_k: 6, history_limit: 10 }
    }
}

pub struct Answer {
    pub conversation_id: Id,
    pub book_id: Id,
    pub question: String,
    pub answer: String,
    pub sources: Vec<Source>,
    pub created_at: DateTime<Utc>,
}

/// Orchestrates spec.md §4.F's `AskQuestion`: ownership/readiness
/// guards, conversation binding, retrieval, prompt assembly, generation,
/// and persistence.
pub struct AskQuestion {
    books: Arc<dyn BookLookup>,
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    vectors: Arc<dyn VectorStore>,
    chunks: Arc<dyn ChunkLookup>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    config: AskQuestionConfig,
}

impl AskQuestion {
    pub fn new(
        books: Arc<dyn BookLookup>,
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        vectors: Arc<dyn VectorStore>,
        chunks: Arc<dyn ChunkLookup>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        config: AskQuestionConfig,
    ) -> Self {
        Self { books, conversations, messages, vectors, chunks, embedder, generator, config }
    }

    pub async fn ask(
        &self,
        user_id: Id,
        is_admin: bool,
        book_id: Id,
        question: &str,
        conversation_id: Option<Id>,
    ) -> Result<Answer, RetrievalError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RetrievalError::EmptyQuestion);
        }

        let book = self.books.get(book_id).await?.ok_or(RetrievalError::NotOwner)?;
        if book.owner_id != user_id && !is_admin {
            tracing::warn!(%book_id, %user_id, "rejected ask: caller does not own this book");
            return Err(RetrievalError::NotOwner);
        }
        if book.status != BookStatus::Ready {
            tracing::warn!(%book_id, status = ?book.status, "rejected ask: book not ready");
            return Err(RetrievalError::BookNotReady);
        }

        let conversation = match conversation_id {
            Some(id) => {
                let conversation = self.conversations.get(id).await?.ok_or(RetrievalError::ConversationNotFound(id))?;
                if conversation.user_id != user_id || conversation.book_id != book_id {
                    return Err(RetrievalError::ConversationMismatch);
                }
                conversation
            }
            None => {
                let title = derive_title(question);
                self.conversations.create(user_id, book_id, title).await?
            }
        };

        let query_embedding = self.embedder.embed(question, TaskHint::RetrievalQuery).await?;
        let hits = self.vectors.search(book_id, &query_embedding, self.config.top_k).await?;
        if hits.is_empty() {
            return Err(RetrievalError::BookNotReady);
        }

        let history = self.messages.recent(conversation.id, self.config.history_limit * 2).await?;

        let mut sources = Vec::with_capacity(hits.len());
        for (i, (chunk_id, _distance)) in hits.iter().enumerate() {
            let chunk = self.chunks.get(*chunk_id).await?;
            let (source_ref, snippet) = match chunk {
                Some(chunk) => (chunk.metadata.get(metadata::SOURCE_REF).cloned().unwrap_or_default(), chunk.content),
                None => (String::new(), String::new()),
            };
            sources.push(Source { label: format!("[{}]", i + 1), chunk_id: *chunk_id, source_ref, snippet });
        }

        let user_prompt = build_user_prompt(&book.title, &history, question, &sources);
        let system_prompt = "Answer using only the numbered context provided. Cite sources inline with their [n] label.";

        let generated = self.generator.generate(system_prompt, &user_prompt).await?;

        let now = Utc::now();
        self.messages
            .append(Message {
                id: Id::new(),
                conversation_id: conversation.id,
                user_id,
                book_id,
                role: MessageRole::User,
                content: question.to_string(),
                sources: Vec::new(),
                created_at: now,
            })
            .await?;

        let assistant_message = Message {
            id: Id::new(),
            conversation_id: conversation.id,
            user_id,
            book_id,
            role: MessageRole::Assistant,
            content: generated.clone(),
            sources: sources.clone(),
            created_at: now,
        };
        self.messages.append(assistant_message).await?;
        self.conversations.touch_last_message_at(conversation.id).await?;

        Ok(Answer {
            conversation_id: conversation.id,
            book_id,
            question: question.to_string(),
            answer: generated,
            sources,
            created_at: now,
        })
    }
}

fn build_user_prompt(book_title: &str, history: &[Message], question: &str, sources: &[Source]) -> String {
    let mut prompt = format!("Book: {book_title}\n\n");

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for message in history {
            let speaker = match message.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{speaker}: {}\n", message.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("Question: {question}\n\nContext:\n"));
    for source in sources {
        let snippet = truncate_snippet(&source.snippet, SNIPPET_MAX_CODEPOINTS);
        prompt.push_str(&format!("{} {}\n", source.label, snippet));
    }
    prompt
}

fn truncate_snippet(snippet: &str, max: usize) -> String {
    let chars: Vec<char> = snippet.chars().collect();
    if chars.len() <= max {
        return snippet.to_string();
    }
    chars[..max].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::FakeEmbedder;
    use crate::generator::FakeTextGenerator;
    use crate::repository::{InMemoryBookLookup, InMemoryChunkLookup, InMemoryConversationRepository, InMemoryMessageRepository};
    use crate::vector_store::InMemoryVectorStore;
    use models::{Book, Chunk};
    use std::collections::BTreeMap;

    fn ready_book(owner_id: Id) -> Book {
        let now = Utc::now();
        Book {
            id: Id::new(),
            owner_id,
            title: "Test Book".into(),
            original_filename: "test.pdf".into(),
            storage_key: "key".into(),
            status: BookStatus::Ready,
            error_message: None,
            size_bytes: 100,
            created_at: now,
            updated_at: now,
        }
    }

    async fn setup(dim: usize) -> (AskQuestion, Arc<InMemoryBookLookup>, Arc<InMemoryVectorStore>, Arc<InMemoryChunkLookup>, Id) {
        let books = Arc::new(InMemoryBookLookup::new());
        let conversations = Arc::new(InMemoryConversationRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let vectors = Arc::new(InMemoryVectorStore::new(dim));
        let chunks = Arc::new(InMemoryChunkLookup::new());
        let embedder = Arc::new(FakeEmbedder::new(dim));
        let generator = Arc::new(FakeTextGenerator);

        let ask = AskQuestion::new(
            books.clone(),
            conversations,
            messages,
            vectors.clone(),
            chunks.clone(),
            embedder,
            generator,
            AskQuestionConfig::default(),
        );
        (ask, books, vectors, chunks, Id::new())
    }

    #[tokio::test]
    async fn rejects_empty_question() {
        let (ask, _books, _vectors, _chunks, user_id) = setup(4).await;
        let err = ask.ask(user_id, false, Id::new(), "   ", None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmptyQuestion));
    }

    #[tokio::test]
    async fn rejects_non_owner() {
        let (ask, books, _vectors, _chunks, user_id) = setup(4).await;
        let book = ready_book(Id::new());
        books.insert(book.clone());

        let err = ask.ask(user_id, false, book.id, "What happens?", None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotOwner));
    }

    #[tokio::test]
    async fn admin_can_ask_about_any_book() {
        let (ask, books, vectors, _chunks, _) = setup(4).await;
        let owner_id = Id::new();
        let admin_id = Id::new();
        let book = ready_book(owner_id);
        books.insert(book.clone());
        vectors.upsert(book.id, &[(Id::new(), vec![1.0, 0.0, 0.0, 0.0])]).await.unwrap();

        let answer = ask.ask(admin_id, true, book.id, "What happens?", None).await.unwrap();
        assert_eq!(answer.book_id, book.id);
    }

    #[tokio::test]
    async fn rejects_book_not_ready() {
        let (ask, books, _vectors, _chunks, user_id) = setup(4).await;
        let mut book = ready_book(user_id);
        book.status = BookStatus::Processing;
        books.insert(book.clone());

        let err = ask.ask(user_id, false, book.id, "What happens?", None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::BookNotReady));
    }

    #[tokio::test]
    async fn empty_search_results_is_book_not_ready() {
        let (ask, books, _vectors, _chunks, user_id) = setup(4).await;
        let book = ready_book(user_id);
        books.insert(book.clone());

        let err = ask.ask(user_id, false, book.id, "What happens?", None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::BookNotReady));
    }

    #[tokio::test]
    async fn creates_conversation_when_none_given_and_persists_messages() {
        let (ask, books, vectors, _chunks, user_id) = setup(4).await;
        let book = ready_book(user_id);
        books.insert(book.clone());
        vectors.upsert(book.id, &[(Id::new(), vec![1.0, 0.0, 0.0, 0.0])]).await.unwrap();

        let answer = ask.ask(user_id, false, book.id, "Can you explain the plot?", None).await.unwrap();
        assert!(!answer.answer.is_empty());
        assert_eq!(answer.sources.len(), 1);
    }

    #[tokio::test]
    async fn sources_resolve_snippet_and_source_ref_from_chunk_lookup() {
        let (ask, books, vectors, chunks, user_id) = setup(4).await;
        let book = ready_book(user_id);
        books.insert(book.clone());

        let chunk_id = Id::new();
        vectors.upsert(book.id, &[(chunk_id, vec![1.0, 0.0, 0.0, 0.0])]).await.unwrap();
        chunks.insert(Chunk {
            id: chunk_id,
            book_id: book.id,
            content: "The hero crosses the threshold in chapter three.".to_string(),
            metadata: BTreeMap::from([(metadata::SOURCE_REF.to_string(), "book.pdf#page=12".to_string())]),
            embedding: None,
            created_at: Utc::now(),
        });

        let answer = ask.ask(user_id, false, book.id, "What happens in chapter three?", None).await.unwrap();
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].source_ref, "book.pdf#page=12");
        assert_eq!(answer.sources[0].snippet, "The hero crosses the threshold in chapter three.");
    }

    #[tokio::test]
    async fn source_falls_back_to_empty_when_chunk_is_missing_from_lookup() {
        let (ask, books, vectors, _chunks, user_id) = setup(4).await;
        let book = ready_book(user_id);
        books.insert(book.clone());
        vectors.upsert(book.id, &[(Id::new(), vec![1.0, 0.0, 0.0, 0.0])]).await.unwrap();

        let answer = ask.ask(user_id, false, book.id, "What happens?", None).await.unwrap();
        assert_eq!(answer.sources[0].source_ref, "");
        assert_eq!(answer.sources[0].snippet, "");
    }
}
