use utoipa::OpenApi;

use crate::routes::{chat, conversations, openai, provider, status};

#[derive(OpenApi)]
#[openapi(
    info(title = "Colloquy API", description = "Chat assistant HTTP surface"),
    paths(
        chat::chat,
        conversations::list_conversations,
        conversations::list_messages,
        conversations::delete_conversation,
        status::status,
        status::health,
        provider::switch_provider,
        openai::chat_completions,
        openai::list_models,
    ),
    components(schemas(
        chat::ChatRequest,
        chat::ChatResponse,
        conversations::ConversationItem,
        conversations::ConversationList,
        conversations::MessageItem,
        conversations::ConversationMessages,
        conversations::DeleteRequest,
        conversations::DeleteResponse,
        status::StatusResponse,
        provider::ProviderRequest,
        provider::ProviderResponse,
        openai::ChatCompletionRequest,
        openai::CompletionMessage,
        openai::Usage,
    )),
    tags(
        (name = "chat", description = "Conversational endpoint"),
        (name = "conversations", description = "Stored conversations"),
        (name = "status", description = "Health and statistics"),
        (name = "provider", description = "LLM provider selection"),
        (name = "openai", description = "OpenAI-compatible endpoints")
    )
)]
pub struct ApiDoc;
