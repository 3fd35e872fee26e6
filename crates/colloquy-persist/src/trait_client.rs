use async_trait::async_trait;
use colloquy_llm::Message;

use crate::error::Result;
use crate::models::{Conversation, ConversationSummary};

/// Trait for conversation storage
///
/// Every call is individually atomic. Callers decide how failures
/// surface to users; implementations only report them.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create an empty conversation and return its id
    async fn create_conversation(&self, title: &str) -> Result<String>;

    /// Append a message and return its storage id.
    ///
    /// The message's own `id` and `conversation_id` are ignored. Bumps the
    /// conversation's `updated_at`.
    async fn add_message(&self, conversation_id: &str, message: &Message) -> Result<i64>;

    async fn update_message(&self, message_id: i64, content: &str) -> Result<()>;

    async fn delete_message(&self, message_id: i64) -> Result<()>;

    /// Load a conversation with all of its messages
    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    /// Most recently updated conversations first
    async fn list_recent_conversations(&self, limit: usize) -> Result<Vec<ConversationSummary>>;

    /// Remove a conversation and its messages. Returns `false` if it did
    /// not exist.
    async fn delete_conversation(&self, conversation_id: &str) -> Result<bool>;

    async fn update_conversation_title(&self, conversation_id: &str, title: &str) -> Result<()>;

    async fn count_conversations(&self) -> Result<u64>;

    async fn count_messages(&self) -> Result<u64>;

    /// Cheap health check
    async fn ping(&self) -> Result<()>;

    /// Human-readable backend description, e.g. `sqlite:conversations.db`
    fn describe(&self) -> String;
}
