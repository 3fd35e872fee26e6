use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the orchestrator. `Error` is left again by the next
/// operation that completes successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantState {
    Idle,
    Processing,
    Error,
}

impl AssistantState {
    pub fn as_u8(self) -> u8 {
        match self {
            AssistantState::Idle => 0,
            AssistantState::Processing => 1,
            AssistantState::Error => 2,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AssistantState::Processing,
            2 => AssistantState::Error,
            _ => AssistantState::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantState::Idle => "idle",
            AssistantState::Processing => "processing",
            AssistantState::Error => "error",
        }
    }
}

impl fmt::Display for AssistantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
