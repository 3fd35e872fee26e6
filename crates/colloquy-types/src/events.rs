use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::state::AssistantState;

/// Notifications emitted by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    StateChanged {
        state: AssistantState,
    },

    ConversationStarted {
        conversation_id: String,
    },

    ConversationLoaded {
        conversation_id: String,
    },

    /// Final text returned to the caller (may be an apology)
    ResponseGenerated {
        conversation_id: Option<String>,
        content: String,
    },

    ProviderSwitched {
        provider: String,
        model: String,
    },

    /// Internal failure detail, never shown to end users
    ErrorOccurred {
        message: String,
    },
}

/// Destination for assistant notifications.
///
/// Sinks must not block: they are called while the orchestrator is
/// mid-operation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AssistantEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: AssistantEvent) {}
}

/// Writes events to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AssistantEvent) {
        match &event {
            AssistantEvent::ErrorOccurred { message } => {
                tracing::error!(%message, "Assistant error");
            }
            other => tracing::debug!(event = ?other, "Assistant event"),
        }
    }
}

// Closed receivers are ignored
impl EventSink for mpsc::UnboundedSender<AssistantEvent> {
    fn emit(&self, event: AssistantEvent) {
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AssistantEvent::ResponseGenerated {
            conversation_id: Some("c1".to_string()),
            content: "hi".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "response_generated");
        assert_eq!(json["content"], "hi");
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink: &dyn EventSink = &tx;

        sink.emit(AssistantEvent::StateChanged { state: AssistantState::Processing });
        sink.emit(AssistantEvent::StateChanged { state: AssistantState::Idle });

        assert_eq!(
            rx.recv().await,
            Some(AssistantEvent::StateChanged { state: AssistantState::Processing })
        );
        assert_eq!(
            rx.recv().await,
            Some(AssistantEvent::StateChanged { state: AssistantState::Idle })
        );
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.emit(AssistantEvent::ErrorOccurred { message: "x".to_string() });
    }
}
