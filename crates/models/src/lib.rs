//! Shared domain types for the document-retrieval platform.
//!
//! This crate has no I/O of its own — it is the vocabulary every other
//! crate in the workspace shares, the same role `estuary-flow`'s `models`
//! crate plays for its control plane.

pub mod book;
pub mod chunk;
pub mod conversation;
pub mod id;
pub mod job;
pub mod metadata;
pub mod user;

pub use book::{Book, BookStatus};
pub use chunk::Chunk;
pub use conversation::{Conversation, Message, MessageRole, Source};
pub use id::Id;
pub use job::{Job, JobEnvelope, JobStatus};
pub use user::{Role, Status, User};

pub type JsonObject = serde_json::value::Map<String, serde_json::Value>;
