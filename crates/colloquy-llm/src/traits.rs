use async_trait::async_trait;

use crate::config::{ProviderConfig, ProviderKind};
use crate::response::NormalizedResponse;
use crate::types::Message;

/// Callback receiving the completed response text
pub type ResponseCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Trait for chat-based LLM interactions
///
/// Implementations never fail past this boundary: every problem is
/// reported through `NormalizedResponse::success == false`.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Non-streaming chat completion
    async fn complete(&self, messages: &[Message]) -> NormalizedResponse;

    /// Waits for the full completion, then hands it to `callback`.
    ///
    /// Failures are delivered as `"Error: <message>"`.
    async fn complete_with_callback(
        &self,
        messages: &[Message],
        callback: ResponseCallback<'_>,
    ) -> NormalizedResponse {
        let response = self.complete(messages).await;
        if response.success {
            callback(&response.content);
        } else {
            callback(&format!("Error: {}", response.error_message));
        }
        response
    }

    fn config(&self) -> &ProviderConfig;

    fn kind(&self) -> ProviderKind {
        self.config().kind()
    }
}
