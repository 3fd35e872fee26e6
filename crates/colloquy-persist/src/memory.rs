use async_trait::async_trait;
use chrono::{DateTime, Utc};
use colloquy_llm::Message;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{Conversation, ConversationSummary};
use crate::trait_client::PersistenceClient;

/// Process-local storage, lost on exit
#[derive(Default)]
pub struct MemoryPersistenceClient {
    store: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    conversations: HashMap<String, Conversation>,
    next_message_id: i64,
}

impl Store {
    fn find_message_mut(&mut self, message_id: i64) -> Option<&mut Message> {
        self.conversations
            .values_mut()
            .flat_map(|c| c.messages.iter_mut())
            .find(|m| m.id == message_id)
    }
}

impl MemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceClient for MemoryPersistenceClient {
    async fn create_conversation(&self, title: &str) -> Result<String> {
        let now = Utc::now();
        let conversation = Conversation {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let id = conversation.id.clone();
        self.store
            .write()
            .await
            .conversations
            .insert(id.clone(), conversation);
        Ok(id)
    }

    async fn add_message(&self, conversation_id: &str, message: &Message) -> Result<i64> {
        let mut store = self.store.write().await;
        store.next_message_id += 1;
        let id = store.next_message_id;

        let conversation = store
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| PersistError::ConversationNotFound(conversation_id.to_string()))?;

        conversation.messages.push(Message {
            id,
            conversation_id: conversation_id.to_string(),
            ..message.clone()
        });
        conversation.updated_at = latest(conversation.updated_at, Utc::now());

        Ok(id)
    }

    async fn update_message(&self, message_id: i64, content: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let message = store
            .find_message_mut(message_id)
            .ok_or(PersistError::MessageNotFound(message_id))?;
        message.content = content.to_string();
        Ok(())
    }

    async fn delete_message(&self, message_id: i64) -> Result<()> {
        let mut store = self.store.write().await;
        for conversation in store.conversations.values_mut() {
            if let Some(pos) = conversation.messages.iter().position(|m| m.id == message_id) {
                conversation.messages.remove(pos);
                return Ok(());
            }
        }
        Err(PersistError::MessageNotFound(message_id))
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let store = self.store.read().await;
        Ok(store.conversations.get(conversation_id).map(|c| {
            let mut conversation = c.clone();
            // Stable: equal timestamps keep insertion order
            conversation.messages.sort_by_key(|m| m.timestamp);
            conversation
        }))
    }

    async fn list_recent_conversations(&self, limit: usize) -> Result<Vec<ConversationSummary>> {
        let store = self.store.read().await;
        let mut summaries: Vec<ConversationSummary> =
            store.conversations.values().map(Conversation::summary).collect();
        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        summaries.truncate(limit);
        Ok(summaries)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<bool> {
        Ok(self
            .store
            .write()
            .await
            .conversations
            .remove(conversation_id)
            .is_some())
    }

    async fn update_conversation_title(&self, conversation_id: &str, title: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let conversation = store
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| PersistError::ConversationNotFound(conversation_id.to_string()))?;
        conversation.title = title.to_string();
        conversation.updated_at = latest(conversation.updated_at, Utc::now());
        Ok(())
    }

    async fn count_conversations(&self) -> Result<u64> {
        Ok(self.store.read().await.conversations.len() as u64)
    }

    async fn count_messages(&self) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store
            .conversations
            .values()
            .map(|c| c.messages.len() as u64)
            .sum())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn latest(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a.max(b)
}
