use anyhow::Result;
use std::io::{BufRead, Write};

use colloquy_context::available_presets;
use colloquy_core::Assistant;

const RECENT_LIMIT: usize = 10;
const LINE_WIDTH: usize = 100;

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Clear,
    New,
    Save,
    Stats,
    Config,
    List,
    Load(String),
    Delete(String),
    Prompt(Option<String>),
    Usage(&'static str),
    Chat(String),
    Empty,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (word, rest) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        match (word, rest.is_empty()) {
            ("", _) => Command::Empty,
            ("help", true) => Command::Help,
            ("quit" | "exit", true) => Command::Quit,
            ("clear", true) => Command::Clear,
            ("new", true) => Command::New,
            ("save", true) => Command::Save,
            ("stats", true) => Command::Stats,
            ("config", true) => Command::Config,
            ("list", true) => Command::List,
            ("load", true) => Command::Usage("Usage: load <conversation_id_or_number>"),
            ("load", false) => Command::Load(rest.to_string()),
            ("delete", true) => Command::Usage("Usage: delete <conversation_id_or_number>"),
            ("delete", false) => Command::Delete(rest.to_string()),
            ("prompt", true) => Command::Prompt(None),
            ("prompt", false) => Command::Prompt(Some(rest.to_string())),
            _ => Command::Chat(input.to_string()),
        }
    }
}

fn help_text() -> String {
    r#"Available commands:
  help              - Show this help
  quit / exit       - Exit the program
  clear             - Clear conversation history
  new               - Start a new conversation
  save              - Save current conversation
  stats             - Show statistics
  config            - Show current configuration
  list              - List recent conversations
  load <id|n>       - Continue a conversation by ID or list number
  delete <id|n>     - Delete a conversation by ID or list number
  prompt [preset]   - Show or switch the system prompt preset

Anything else is sent to the assistant."#
        .to_string()
}

/// Text-mode front-end over an [`Assistant`]
pub struct Console<'a, R, W> {
    assistant: &'a Assistant,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(assistant: &'a Assistant, input: R, output: W) -> Self {
        Self {
            assistant,
            input,
            output,
        }
    }

    /// Read commands until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "\n=== Text Mode ===")?;
        writeln!(self.output, "Type 'quit' or 'exit' to stop, 'help' for commands\n")?;

        loop {
            write!(self.output, "You: ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };
            if !self.handle(Command::parse(&line)).await? {
                break;
            }
        }

        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Returns `false` when the console should stop
    pub async fn handle(&mut self, command: Command) -> Result<bool> {
        let assistant = self.assistant;
        match command {
            Command::Empty => {}
            Command::Quit => return Ok(false),
            Command::Help => writeln!(self.output, "\n{}\n", help_text())?,
            Command::Usage(usage) => writeln!(self.output, "{}\n", usage)?,
            Command::Clear => {
                assistant.clear_history().await;
                writeln!(self.output, "Conversation history cleared.\n")?;
            }
            Command::New => match assistant.start_conversation(None).await {
                Some(id) => writeln!(self.output, "Started conversation {}\n", id)?,
                None => writeln!(self.output, "Failed to start a new conversation.\n")?,
            },
            Command::Save => {
                if assistant.save_current_conversation().await {
                    writeln!(self.output, "Conversation saved.\n")?;
                } else {
                    writeln!(self.output, "Failed to save conversation.\n")?;
                }
            }
            Command::Stats => {
                writeln!(
                    self.output,
                    "Total conversations: {}",
                    assistant.total_conversations().await
                )?;
                writeln!(self.output, "Total messages: {}\n", assistant.total_messages().await)?;
            }
            Command::Config => writeln!(self.output, "{}", assistant.system_info().await)?,
            Command::List => self.list().await?,
            Command::Load(target) => {
                if let Some(id) = self.resolve(&target).await? {
                    if assistant.load_conversation(&id).await {
                        let count = assistant.history().await.len();
                        writeln!(self.output, "Loaded conversation {} ({} messages).\n", id, count)?;
                    } else {
                        writeln!(self.output, "Conversation not found.\n")?;
                    }
                }
            }
            Command::Delete(target) => self.delete(&target).await?,
            Command::Prompt(None) => {
                writeln!(self.output, "Current system prompt:\n{}\n", assistant.system_prompt().await)?;
                writeln!(self.output, "Available presets: {}\n", available_presets().join(", "))?;
            }
            Command::Prompt(Some(name)) => {
                if assistant.load_prompt_preset(&name).await {
                    writeln!(self.output, "Switched to '{}' prompt.\n", name)?;
                } else {
                    writeln!(
                        self.output,
                        "Unknown preset '{}'. Available: {}\n",
                        name,
                        available_presets().join(", ")
                    )?;
                }
            }
            Command::Chat(text) => {
                let reply = assistant.process(&text).await;
                writeln!(self.output, "Assistant: {}\n", wrap_reply(&reply, LINE_WIDTH))?;
            }
        }
        Ok(true)
    }

    async fn list(&mut self) -> Result<()> {
        let conversations = self.assistant.recent_conversations(RECENT_LIMIT).await;
        writeln!(self.output, "\nRecent conversations:")?;
        if conversations.is_empty() {
            writeln!(self.output, "No conversations found.\n")?;
            return Ok(());
        }

        for (i, conversation) in conversations.iter().enumerate() {
            let title = if conversation.title.is_empty() {
                "Untitled"
            } else {
                conversation.title.as_str()
            };
            let created = conversation
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S");
            writeln!(self.output, "{}. {}", i + 1, title)?;
            writeln!(self.output, "    ID: {}", conversation.id)?;
            writeln!(self.output, "    Messages: {}", conversation.message_count)?;
            writeln!(self.output, "    Created: {}\n", created)?;
        }
        Ok(())
    }

    async fn delete(&mut self, target: &str) -> Result<()> {
        let Some(id) = self.resolve(target).await? else {
            return Ok(());
        };

        write!(self.output, "Are you sure you want to delete this conversation? (y/N): ")?;
        self.output.flush()?;
        let answer = self.read_line()?.unwrap_or_default();

        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            writeln!(self.output, "Deletion cancelled.\n")?;
        } else if self.assistant.delete_conversation(&id).await {
            writeln!(self.output, "Conversation deleted successfully.\n")?;
        } else {
            writeln!(self.output, "Failed to delete conversation. Check the ID and try again.\n")?;
        }
        Ok(())
    }

    /// A 1-based number from `list`, or a literal conversation id
    async fn resolve(&mut self, target: &str) -> Result<Option<String>> {
        let Ok(number) = target.parse::<usize>() else {
            return Ok(Some(target.to_string()));
        };

        let conversations = self.assistant.recent_conversations(RECENT_LIMIT).await;
        match number.checked_sub(1).and_then(|i| conversations.get(i)) {
            Some(conversation) => {
                let title = if conversation.title.is_empty() {
                    "Untitled"
                } else {
                    conversation.title.as_str()
                };
                writeln!(self.output, "Selected conversation: {}", title)?;
                Ok(Some(conversation.id.clone()))
            }
            None => {
                writeln!(
                    self.output,
                    "Invalid conversation number. Use 'list' to see available conversations.\n"
                )?;
                Ok(None)
            }
        }
    }
}

/// Break a reply into lines of at most `width` characters, preferring a
/// sentence end in the last 30 characters, then a space.
pub fn wrap_reply(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();
    let mut start = 0;

    while chars.len() - start > width {
        let end = start + width;
        let window_start = end.saturating_sub(30).max(start + 1);

        let sentence = (window_start..end)
            .rev()
            .find(|&i| matches!(chars[i], '.' | '!' | '?' | '。' | '！' | '？'))
            .map(|i| i + 1);
        let space = (window_start..end).rev().find(|&i| chars[i] == ' ');
        let split = sentence.or(space).unwrap_or(end);

        lines.push(chars[start..split].iter().collect::<String>().trim_end().to_string());
        start = split;
        while start < chars.len() && chars[start] == ' ' {
            start += 1;
        }
    }
    lines.push(chars[start..].iter().collect::<String>());

    lines.join("\n")
}
