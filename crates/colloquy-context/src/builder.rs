use colloquy_llm::Message;
use colloquy_types::PromptConfig;

use crate::template::expand_template;

/// Assembles the messages sent to the provider for one turn.
///
/// Two independent limits apply: `max_conversation_history` caps the chat
/// messages returned by [`build`](Self::build), while the prompt config's
/// `max_history_messages` caps the text produced by
/// [`render`](Self::render). The two outputs are not required to agree.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    prompt: PromptConfig,
    max_conversation_history: usize,
}

impl ContextBuilder {
    pub fn new(prompt: PromptConfig, max_conversation_history: usize) -> Self {
        Self {
            prompt,
            max_conversation_history,
        }
    }

    pub fn prompt(&self) -> &PromptConfig {
        &self.prompt
    }

    pub fn max_conversation_history(&self) -> usize {
        self.max_conversation_history
    }

    /// Chat-style context: optional system prompt, the most recent history
    /// oldest first, then `input` as the final user message.
    ///
    /// `history` must not already contain `input`.
    pub fn build(&self, history: &[Message], input: &str) -> Vec<Message> {
        let recent = tail(history, self.max_conversation_history);
        let mut messages = Vec::with_capacity(recent.len() + 2);

        if !self.prompt.system_prompt.is_empty() {
            messages.push(Message::system(self.prompt.system_prompt.clone()));
        }
        messages.extend(recent.iter().cloned());
        messages.push(Message::user(input));

        tracing::debug!(
            history = history.len(),
            included = recent.len(),
            total = messages.len(),
            "Built context window"
        );

        messages
    }

    /// Template-style prompt text built from the context and user templates.
    ///
    /// With no history at all, `{context}` expands to an empty string.
    pub fn render(&self, history: &[Message], input: &str) -> String {
        let context = if history.is_empty() {
            String::new()
        } else {
            let history_block: String = tail(history, self.prompt.max_history_messages)
                .iter()
                .map(|m| format!("{}: {}\n", m.role, m.content))
                .collect();
            expand_template(&self.prompt.context_template, &[("history", &history_block)])
        };

        expand_template(
            &self.prompt.user_prompt_template,
            &[("user_input", input), ("context", &context)],
        )
    }
}

fn tail(history: &[Message], limit: usize) -> &[Message] {
    &history[history.len().saturating_sub(limit)..]
}
