use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use colloquy_context::{prompt_preset, ContextBuilder};
use colloquy_llm::{
    ChatClient, ClientFactory, CompletionErrorKind, Message, NormalizedResponse, ProviderConfig,
    Transport,
};
use colloquy_persist::{Conversation, ConversationSummary, PersistenceClient};
use colloquy_types::{AssistantConfig, AssistantEvent, AssistantState, EventSink, PromptConfig};

use crate::title::derive_title;

/// Returned for empty input or when no LLM client is configured
pub const NOT_READY_MESSAGE: &str = "Sorry, I'm not ready to process your request.";
/// Returned in place of a failed provider response
pub const PROVIDER_APOLOGY: &str = "I'm sorry, I encountered an error while processing your request.";
/// Returned when the assistant itself fails mid-turn
pub const INTERNAL_APOLOGY: &str = "I'm sorry, I encountered an error processing your request.";

/// The current conversation and its in-memory history
#[derive(Debug, Default)]
struct Session {
    current_id: Option<String>,
    history: Vec<Message>,
}

impl Session {
    fn push(&mut self, message: Message, max_history: usize) {
        self.history.push(message);
        trim_history(&mut self.history, max_history);
    }

    fn is_current(&self, conversation_id: &str) -> bool {
        self.current_id.as_deref() == Some(conversation_id)
    }
}

/// Once the buffer holds more than `2 * max_history` messages, keep only the
/// newest `max_history`.
pub(crate) fn trim_history(history: &mut Vec<Message>, max_history: usize) {
    if history.len() > max_history.saturating_mul(2) {
        let excess = history.len() - max_history;
        history.drain(..excess);
    }
}

/// Conversation orchestrator.
///
/// Owns the current conversation, builds each request from its history,
/// calls the provider and records the exchange. Safe to share between
/// tasks: history mutations are serialized by one lock that is never held
/// across the provider call, and the client is swapped atomically.
pub struct Assistant {
    client: RwLock<Option<Arc<dyn ChatClient>>>,
    transport: Arc<dyn Transport>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    events: Arc<dyn EventSink>,
    config: AssistantConfig,
    prompt: RwLock<PromptConfig>,
    session: Mutex<Session>,
    state: AtomicU8,
}

impl Assistant {
    pub(crate) fn new(
        client: Option<Arc<dyn ChatClient>>,
        transport: Arc<dyn Transport>,
        persistence: Option<Arc<dyn PersistenceClient>>,
        events: Arc<dyn EventSink>,
        config: AssistantConfig,
        prompt: PromptConfig,
    ) -> Self {
        Self {
            client: RwLock::new(client),
            transport,
            persistence,
            events,
            config,
            prompt: RwLock::new(prompt),
            session: Mutex::new(Session::default()),
            state: AtomicU8::new(AssistantState::Idle.as_u8()),
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::AssistantBuilder {
        crate::builder::AssistantBuilder::new()
    }

    pub fn state(&self) -> AssistantState {
        AssistantState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Whether an LLM client is configured
    pub async fn is_ready(&self) -> bool {
        self.client.read().await.is_some()
    }

    fn set_state(&self, state: AssistantState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
        self.events.emit(AssistantEvent::StateChanged { state });
    }

    // ------------------------------------------------------------------
    // Turn processing
    // ------------------------------------------------------------------

    /// Send one user utterance and return the reply text.
    ///
    /// Never fails: provider problems yield [`PROVIDER_APOLOGY`], internal
    /// ones [`INTERNAL_APOLOGY`], and the details go to the log and the
    /// event sink only.
    pub async fn process(&self, input: &str) -> String {
        if input.trim().is_empty() {
            tracing::warn!("Rejected empty input");
            return NOT_READY_MESSAGE.to_string();
        }
        let Some(client) = self.client.read().await.clone() else {
            tracing::warn!("No LLM client configured");
            return NOT_READY_MESSAGE.to_string();
        };

        self.set_state(AssistantState::Processing);

        match self.run_turn(client, input).await {
            Ok((conversation_id, reply)) => {
                self.set_state(AssistantState::Idle);
                self.events.emit(AssistantEvent::ResponseGenerated {
                    conversation_id: Some(conversation_id),
                    content: reply.clone(),
                });
                reply
            }
            Err(e) => {
                let message = format!("Error processing input: {:#}", e);
                tracing::error!("{}", message);
                self.set_state(AssistantState::Error);
                self.events.emit(AssistantEvent::ErrorOccurred { message });
                INTERNAL_APOLOGY.to_string()
            }
        }
    }

    /// Like [`process`](Self::process), then hands the finished reply to
    /// `callback`.
    pub async fn process_with_callback<F>(&self, input: &str, callback: F) -> String
    where
        F: FnOnce(&str),
    {
        let reply = self.process(input).await;
        callback(&reply);
        reply
    }

    async fn run_turn(&self, client: Arc<dyn ChatClient>, input: &str) -> Result<(String, String)> {
        let max_history = self.config.max_conversation_history;

        // 1. Record the user turn, keeping the history that preceded it
        let (conversation_id, snapshot) = {
            let mut session = self.session.lock().await;
            let conversation_id = match session.current_id.clone() {
                Some(id) => id,
                None => {
                    let id = self.open_conversation().await?;
                    session.current_id = Some(id.clone());
                    self.events.emit(AssistantEvent::ConversationStarted {
                        conversation_id: id.clone(),
                    });
                    id
                }
            };

            let snapshot = session.history.clone();
            let message = self
                .record(&conversation_id, Message::user(input))
                .await?;
            session.push(message, max_history);
            (conversation_id, snapshot)
        };

        // 2. Build the request without holding the lock
        let prompt = self.prompt.read().await.clone();
        let context = ContextBuilder::new(prompt, max_history);
        let messages = context.build(&snapshot, input);
        tracing::debug!(
            conversation_id = %conversation_id,
            messages = messages.len(),
            prompt = %context.render(&snapshot, input),
            "Built request context"
        );

        // 3. Provider round trip
        let response = match tokio::time::timeout(
            self.config.response_timeout,
            client.complete(&messages),
        )
        .await
        {
            Ok(response) => response,
            Err(_) => NormalizedResponse::failure(
                CompletionErrorKind::Transport,
                format!("Request timed out after {:?}", self.config.response_timeout),
            ),
        };

        let reply = if response.success {
            response.content
        } else {
            tracing::error!(
                kind = ?response.error_kind,
                status = response.http_status,
                error = %response.error_message,
                "LLM request failed"
            );
            PROVIDER_APOLOGY.to_string()
        };

        // 4. Record the assistant turn in the conversation it belongs to
        {
            let mut session = self.session.lock().await;
            let message = Message::assistant(reply.clone());
            if session.is_current(&conversation_id) {
                let message = self.record(&conversation_id, message).await?;
                session.push(message, max_history);
            } else {
                tracing::debug!(
                    conversation_id = %conversation_id,
                    "Conversation changed during request; reply stored only"
                );
                if let Err(e) = self.record(&conversation_id, message).await {
                    tracing::warn!(error = %e, "Failed to store reply for previous conversation");
                }
            }
        }

        Ok((conversation_id, reply))
    }

    /// Stamp a message with its conversation and mirror it to storage when
    /// auto-persist is on.
    async fn record(&self, conversation_id: &str, message: Message) -> Result<Message> {
        let message = message.with_conversation(conversation_id);
        match (&self.persistence, self.config.auto_persist) {
            (Some(store), true) => {
                let id = store
                    .add_message(conversation_id, &message)
                    .await
                    .context("Failed to persist message")?;
                Ok(message.with_id(id))
            }
            _ => Ok(message),
        }
    }

    /// New conversation id: durable when storage exists, local otherwise
    async fn open_conversation(&self) -> Result<String> {
        match &self.persistence {
            Some(store) => store
                .create_conversation("")
                .await
                .context("Failed to create conversation"),
            None => Ok(uuid::Uuid::new_v4().to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Conversation management
    // ------------------------------------------------------------------

    /// Start a fresh conversation, saving the outgoing one first when
    /// auto-persist is on. Returns `None` if storage refuses.
    pub async fn start_conversation(&self, title: Option<&str>) -> Option<String> {
        let mut session = self.session.lock().await;

        if self.config.auto_persist && session.current_id.is_some() {
            self.save_session(&session).await;
        }

        let id = match &self.persistence {
            Some(store) => match store.create_conversation(title.unwrap_or("")).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create conversation");
                    return None;
                }
            },
            None => uuid::Uuid::new_v4().to_string(),
        };

        session.current_id = Some(id.clone());
        session.history.clear();
        drop(session);

        tracing::info!(conversation_id = %id, "Started new conversation");
        self.events.emit(AssistantEvent::ConversationStarted {
            conversation_id: id.clone(),
        });
        Some(id)
    }

    /// Make a stored conversation current. Returns `false`, changing
    /// nothing, when it cannot be loaded.
    pub async fn load_conversation(&self, conversation_id: &str) -> bool {
        let Some(store) = &self.persistence else {
            tracing::error!("Cannot load conversations without persistence");
            return false;
        };

        let conversation = match store.get_conversation(conversation_id).await {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                tracing::warn!(conversation_id, "Conversation not found");
                return false;
            }
            Err(e) => {
                tracing::error!(conversation_id, error = %e, "Failed to load conversation");
                return false;
            }
        };

        let mut session = self.session.lock().await;
        if self.config.auto_persist && session.current_id.is_some() {
            self.save_session(&session).await;
        }

        session.current_id = Some(conversation.id.clone());
        session.history = conversation.messages;
        trim_history(&mut session.history, self.config.max_conversation_history);
        drop(session);

        tracing::info!(conversation_id, "Loaded conversation");
        self.events.emit(AssistantEvent::ConversationLoaded {
            conversation_id: conversation.id,
        });
        true
    }

    /// Derive the current conversation's title if it has none yet
    pub async fn save_current_conversation(&self) -> bool {
        let session = self.session.lock().await;
        self.save_session(&session).await
    }

    async fn save_session(&self, session: &Session) -> bool {
        let (Some(store), Some(id)) = (&self.persistence, session.current_id.as_deref()) else {
            return false;
        };
        if session.history.is_empty() {
            return true;
        }

        match store.get_conversation(id).await {
            Ok(Some(conversation)) if conversation.title.is_empty() => {
                let first = conversation
                    .messages
                    .first()
                    .or_else(|| session.history.first())
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                let title = derive_title(first);
                match store.update_conversation_title(id, &title).await {
                    Ok(()) => {
                        tracing::debug!(conversation_id = id, %title, "Conversation titled");
                        true
                    }
                    Err(e) => {
                        tracing::warn!(conversation_id = id, error = %e, "Failed to set title");
                        false
                    }
                }
            }
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(conversation_id = id, error = %e, "Failed to save conversation");
                false
            }
        }
    }

    /// Save the current conversation before the process exits
    pub async fn shutdown(&self) {
        if self.config.auto_persist {
            self.save_current_conversation().await;
        }
    }

    pub async fn recent_conversations(&self, limit: usize) -> Vec<ConversationSummary> {
        let Some(store) = &self.persistence else {
            return Vec::new();
        };
        store
            .list_recent_conversations(limit)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to list conversations");
                Vec::new()
            })
    }

    /// Read a stored conversation without touching the current one
    pub async fn conversation(&self, conversation_id: &str) -> Option<Conversation> {
        let store = self.persistence.as_ref()?;
        store
            .get_conversation(conversation_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(conversation_id, error = %e, "Failed to read conversation");
                None
            })
    }

    /// Delete a stored conversation; deleting the current one also clears it
    pub async fn delete_conversation(&self, conversation_id: &str) -> bool {
        let Some(store) = &self.persistence else {
            return false;
        };

        let mut session = self.session.lock().await;
        if session.is_current(conversation_id) {
            session.current_id = None;
            session.history.clear();
        }

        match store.delete_conversation(conversation_id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!(conversation_id, error = %e, "Failed to delete conversation");
                false
            }
        }
    }

    /// Empty the in-memory history; storage is untouched
    pub async fn clear_history(&self) {
        self.session.lock().await.history.clear();
        tracing::info!("Conversation history cleared");
    }

    pub async fn history(&self) -> Vec<Message> {
        self.session.lock().await.history.clone()
    }

    pub async fn current_conversation_id(&self) -> Option<String> {
        self.session.lock().await.current_id.clone()
    }

    // ------------------------------------------------------------------
    // Provider and prompt configuration
    // ------------------------------------------------------------------

    /// Replace the LLM client. On failure the current client stays active.
    pub async fn switch_provider(&self, config: ProviderConfig) -> bool {
        let provider = config.provider.clone();
        let model = config.model_name.clone();

        match ClientFactory::create_client_with_transport(config, Arc::clone(&self.transport)) {
            Ok(client) => {
                *self.client.write().await = Some(client);
                tracing::info!(%provider, %model, "LLM provider updated");
                self.events
                    .emit(AssistantEvent::ProviderSwitched { provider, model });
                true
            }
            Err(e) => {
                tracing::error!(%provider, error = %e, "Failed to update LLM provider");
                false
            }
        }
    }

    pub async fn provider_config(&self) -> Option<ProviderConfig> {
        self.client
            .read()
            .await
            .as_ref()
            .map(|client| client.config().clone())
    }

    pub async fn prompt_config(&self) -> PromptConfig {
        self.prompt.read().await.clone()
    }

    pub async fn set_prompt_config(&self, prompt: PromptConfig) {
        *self.prompt.write().await = prompt;
    }

    pub async fn system_prompt(&self) -> String {
        self.prompt.read().await.system_prompt.clone()
    }

    pub async fn set_system_prompt(&self, system_prompt: impl Into<String>) {
        self.prompt.write().await.system_prompt = system_prompt.into();
    }

    /// Switch to a named system prompt preset
    pub async fn load_prompt_preset(&self, name: &str) -> bool {
        match prompt_preset(name) {
            Some(prompt) => {
                self.set_system_prompt(prompt).await;
                tracing::info!(preset = name, "Loaded prompt template");
                true
            }
            None => {
                tracing::warn!(preset = name, "Unknown prompt template");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    pub async fn total_conversations(&self) -> u64 {
        match &self.persistence {
            Some(store) => store.count_conversations().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to count conversations");
                0
            }),
            None => 0,
        }
    }

    pub async fn total_messages(&self) -> u64 {
        match &self.persistence {
            Some(store) => store.count_messages().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to count messages");
                0
            }),
            None => 0,
        }
    }

    /// Multi-line summary for the console `config` command
    pub async fn system_info(&self) -> String {
        let provider = self.provider_config().await;
        let (provider, model) = match &provider {
            Some(config) => (config.provider.as_str(), config.model_name.as_str()),
            None => ("(not configured)", "(not configured)"),
        };
        let database = self
            .persistence
            .as_ref()
            .map(|store| store.describe())
            .unwrap_or_else(|| "(none)".to_string());

        format!(
            "Colloquy Assistant System Information:\n\
             ======================================\n\
             LLM Provider: {}\n\
             Model: {}\n\
             Database: {}\n\
             Total Conversations: {}\n\
             Total Messages: {}\n",
            provider,
            model,
            database,
            self.total_conversations().await,
            self.total_messages().await,
        )
    }

    /// Check storage and the LLM client
    pub async fn test_connections(&self) -> bool {
        tracing::info!("Testing connections...");
        let mut all_ok = true;

        match &self.persistence {
            Some(store) => match store.ping().await {
                Ok(()) => tracing::info!(database = %store.describe(), "Database connection: OK"),
                Err(e) => {
                    tracing::error!(error = %e, "Database connection failed");
                    all_ok = false;
                }
            },
            None => {
                tracing::error!("Database connection failed: no persistence configured");
                all_ok = false;
            }
        }

        if self.is_ready().await {
            tracing::info!("LLM client: OK");
        } else {
            tracing::error!("LLM client not available");
            all_ok = false;
        }

        all_ok
    }
}
