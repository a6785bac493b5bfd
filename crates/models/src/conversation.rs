use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::Id;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Id,
    pub user_id: Id,
    pub book_id: Id,
    pub title: String,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single cited source reference attached to an assistant message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Source {
    /// The `[n]` citation label shown in the answer, e.g. `"[1]"`.
    pub label: String,
    pub chunk_id: Id,
    pub source_ref: String,
    pub snippet: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: Id,
    pub conversation_id: Id,
    pub user_id: Id,
    pub book_id: Id,
    pub role: MessageRole,
    pub content: String,
    pub sources: Vec<Source>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Every message belonging to a conversation must carry the same
    /// `user_id` as the conversation itself (spec.md §3 invariant); admin
    /// access is a read-time override applied by the caller, never encoded
    /// here.
    pub fn owns(&self, message: &Message) -> bool {
        self.user_id == message.user_id && self.id == message.conversation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_requires_matching_user_and_conversation() {
        let user_id = Id::new();
        let book_id = Id::new();
        let conversation = Conversation {
            id: Id::new(),
            user_id,
            book_id,
            title: "t".into(),
            last_message_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let message = Message {
            id: Id::new(),
            conversation_id: conversation.id,
            user_id,
            book_id,
            role: MessageRole::User,
            content: "hi".into(),
            sources: vec![],
            created_at: Utc::now(),
        };
        assert!(conversation.owns(&message));

        let mut other_user_message = message.clone();
        other_user_message.user_id = Id::new();
        assert!(!conversation.owns(&other_user_message));
    }
}
